//! Per-dialect wire conversion. Each module implements the same four
//! operations (declarations, render, extract_calls, extract_text) plus
//! usage normalization for its backend family.

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod recovery;
