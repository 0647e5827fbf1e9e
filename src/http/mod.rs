//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! forwarding and static file logic.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use cache::CachePolicy;
pub use range::{parse_range_header, RangeParseResult};
pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_health_response, build_options_response,
};
