//! Trace renderers: human narration and append-only JSONL.

pub mod jsonl;
pub mod text;
