pub mod structured;
pub mod types;
