//! IP geolocation seam.
//!
//! Resolution degrades to `None` on any transport or validation failure;
//! callers that require coordinates decide whether that fails the request.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Approximate coordinates for a client IP, as cached and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpCoordinates {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl IpCoordinates {
    /// Schema check applied to provider responses and cached payloads alike.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.city.is_empty()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Raw provider result before validation.
#[derive(Debug, Clone)]
pub struct IpLocation {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// External geolocation provider (Geoapify in production).
#[async_trait::async_trait]
pub trait IpLocationProvider: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<IpLocation>;
}

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolves a client IP to approximate coordinates, or `None` when the
    /// IP is non-public or resolution fails for any reason. Never errors.
    async fn resolve(&self, ip: &str) -> Option<IpCoordinates>;
}

/// True only for well-formed public IPv4 addresses. RFC1918 private ranges
/// and loopback are rejected up front: geolocating internal traffic wastes a
/// provider call and returns meaningless results.
#[must_use]
pub fn is_public_ipv4(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>()
        .map(|addr| !addr.is_private() && !addr.is_loopback())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_and_loopback_addresses_are_rejected() {
        assert!(!is_public_ipv4("10.0.0.1"));
        assert!(!is_public_ipv4("192.168.1.1"));
        assert!(!is_public_ipv4("127.0.0.1"));
        assert!(!is_public_ipv4("172.16.0.5"));
        assert!(!is_public_ipv4("172.31.255.255"));
    }

    #[test]
    fn public_addresses_are_accepted() {
        assert!(is_public_ipv4("8.8.8.8"));
        assert!(is_public_ipv4("172.32.0.1"));
        assert!(is_public_ipv4("1.1.1.1"));
    }

    #[test]
    fn non_ipv4_strings_are_rejected() {
        assert!(!is_public_ipv4(""));
        assert!(!is_public_ipv4("not-an-ip"));
        assert!(!is_public_ipv4("::1"));
        assert!(!is_public_ipv4("2001:4860:4860::8888"));
        assert!(!is_public_ipv4("8.8.8"));
        assert!(!is_public_ipv4("8.8.8.8.8"));
        assert!(!is_public_ipv4("256.1.1.1"));
    }

    #[test]
    fn coordinate_validation_bounds() {
        let mut coords = IpCoordinates {
            city: "Bristol".to_string(),
            latitude: 51.45,
            longitude: -2.59,
        };
        assert!(coords.is_valid());

        coords.latitude = 91.0;
        assert!(!coords.is_valid());

        coords.latitude = 51.45;
        coords.city = String::new();
        assert!(!coords.is_valid());
    }
}
