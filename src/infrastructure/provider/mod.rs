//! LLM backend integration: wire-dialect adapters, HTTP clients, and the
//! factory that builds a client from configuration.

pub mod adapter;
pub mod adapters;
pub mod clients;
pub mod factory;
pub mod types;

pub use adapter::{Dialect, ProviderAdapter, RenderedMessages};
pub use clients::ProviderClient;
pub use factory::ProviderFactory;
pub use types::{ProviderError, ProviderRequest, ProviderTurn};
