// Application layer - use cases and orchestration over the store and rate provider.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
