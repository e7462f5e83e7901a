//! @ai:module:intent Trace replay execution
//! @ai:module:layer application
//! @ai:module:public_api ReplayExecutor, create_executor

pub mod executor;

pub use executor::{create_executor, ReplayExecutor};
