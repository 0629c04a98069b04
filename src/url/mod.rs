//! URL handling module
//!
//! Resolution of scheme-less links against the source origin, and the host
//! key used to group connections for the per-host ceiling.

mod domain;
mod resolve;

pub use domain::host_key;
pub use resolve::{item_url, resolve_url};
