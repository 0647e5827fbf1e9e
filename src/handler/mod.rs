//! Request handler module
//!
//! Responsible for request dispatch: SPA client-side routes are forwarded
//! internally to the entry document, everything else is served from the
//! static root.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
