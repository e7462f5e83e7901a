//! @ai:module:intent Request traces and their text format
//! @ai:module:layer domain
//! @ai:module:public_api Request, TraceError, parse_trace, load_trace

pub mod loader;
pub mod request;

pub use loader::{load_trace, parse_trace};
pub use request::{Request, TraceError, BUCKET_SEPARATOR};
