//! Routing module
//!
//! Provides the SPA forward table:
//! - Pattern parsing (exact, `/**` subtree, `/*` single segment)
//! - Ordered first-match resolution to the forward target

mod matcher;
mod pattern;

pub use matcher::{ForwardTable, ForwardTableError};
