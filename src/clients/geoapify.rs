//! Geoapify IP geolocation client.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::services::geocoder::{IpLocation, IpLocationProvider};

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    city: CityField,
    location: LocationField,
}

#[derive(Debug, Deserialize)]
struct CityField {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LocationField {
    latitude: f64,
    longitude: f64,
}

#[derive(Clone)]
pub struct GeoapifyClient {
    client: Client,
    base_url: String,
    ipinfo_path: String,
    api_key: String,
}

impl GeoapifyClient {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        ipinfo_path: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ipinfo_path: ipinfo_path.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl IpLocationProvider for GeoapifyClient {
    async fn locate(&self, ip: &str) -> Result<IpLocation> {
        let url = format!("{}{}", self.base_url, self.ipinfo_path);
        let response = self
            .client
            .get(url)
            .query(&[("ip", ip), ("apiKey", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("ip geolocation request for {ip} failed"))?
            .error_for_status()
            .context("ip geolocation request rejected")?;

        let body: IpInfoResponse = response
            .json()
            .await
            .context("malformed ip geolocation response")?;

        Ok(IpLocation {
            city: body.city.name,
            latitude: body.location.latitude,
            longitude: body.location.longitude,
        })
    }
}
