//! The two analyses built on the progress scan.
//!
//! Both feed a demand matrix to [`crate::engine::scan::ProgressScanEngine`] and
//! differ only in which matrix they supply and how they read the result:
//! deadlock detection scans outstanding requests and reports whoever is left
//! unfinished; the safety check scans `max - allocation` and requires everyone
//! to finish.

pub mod detector;
pub mod safety;
