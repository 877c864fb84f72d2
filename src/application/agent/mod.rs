//! The sequential thinking controller: a bounded, stateful gather/execute
//! loop that drives one LLM backend through the tool catalog.

mod models;
mod runner;

#[cfg(test)]
mod tests;

pub use models::{RunOptions, RunOutcome, Termination, ToolStep};
pub use runner::Orchestrator;
