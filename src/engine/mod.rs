//! Progress-scan engine and its trace hook.

pub mod scan;
pub mod trace;
