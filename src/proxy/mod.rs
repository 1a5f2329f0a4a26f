//! Proxy module for identity, candidate sourcing and rotation
//!
//! # Components
//!
//! - `ProxyIdentity`: an immutable `host:port` address
//! - `ProxySource` / `ProxyListSource`: fetch candidate identities from a public listing
//! - `ProxyRotator`: single owner of the active identity

mod identity;
mod rotator;
mod source;

pub use identity::ProxyIdentity;
pub use rotator::ProxyRotator;
pub use source::{parse_proxy_table, ProxyListSource, ProxySource};
