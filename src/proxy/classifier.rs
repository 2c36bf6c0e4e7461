//! Port-based proxy classification

use crate::proxy::models::{ProxyAddress, ProxyClass};

/// Derive the protocol class of a proxy from its port.
///
/// Malformed addresses classify as `Unknown` instead of failing.
pub fn classify(address: &ProxyAddress) -> ProxyClass {
    match address.port() {
        Some(80) | Some(8080) => ProxyClass::Http,
        Some(443) => ProxyClass::Https,
        Some(1080) => ProxyClass::Socks,
        _ => ProxyClass::Unknown,
    }
}
