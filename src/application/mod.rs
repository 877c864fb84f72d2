pub mod agent;
pub mod catalog;
pub mod executor;
pub mod formatter;
