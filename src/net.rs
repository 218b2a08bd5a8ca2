//! HTTP side of a trace: public IP detection and geolocation lookup.
//!
//! Both calls are single attempts bounded by the client timeout. Failures are
//! classified into [`TraceError`] here; printing them is the loop's job.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Number;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{TraceError, LOOKUP_CONTEXT, PUBLIC_IP_CONTEXT};
use crate::ip::Ipv4Target;

/// Field allow-list sent to the geolocation service.
pub const GEO_FIELDS: &str =
    "status,message,country,countryCode,region,regionName,city,zip,lat,lon,timezone,isp,org,as,query";

/// Geolocation data for one address. Every field is optional because the
/// service omits what it does not know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoRecord {
    pub query: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub region_name: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<Number>,
    pub lon: Option<Number>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub asn: Option<String>,
}

/// Source of public-IP and geolocation answers.
///
/// [`GeoClient`] is the only production implementation; the seam exists so
/// the interactive loop can run against canned answers.
pub trait GeoService {
    /// Discover the caller's public IPv4 address.
    async fn resolve_own_ip(&self) -> Result<Ipv4Target, TraceError>;

    /// Fetch geolocation data for `ip`.
    async fn lookup(&self, ip: &Ipv4Target) -> Result<GeoRecord, TraceError>;
}

#[derive(Debug, Deserialize)]
struct PublicIpResponse {
    ip: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    region: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    zip: Option<String>,
    lat: Option<Number>,
    lon: Option<Number>,
    timezone: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(rename = "as")]
    asn: Option<String>,
    query: Option<String>,
}

impl From<IpApiResponse> for GeoRecord {
    fn from(body: IpApiResponse) -> Self {
        Self {
            query: body.query,
            country: body.country,
            country_code: body.country_code,
            region_code: body.region,
            region_name: body.region_name,
            city: body.city,
            zip: body.zip,
            lat: body.lat,
            lon: body.lon,
            timezone: body.timezone,
            isp: body.isp,
            org: body.org,
            asn: body.asn,
        }
    }
}

/// HTTP client for the public-IP and geolocation services.
pub struct GeoClient {
    http: Client,
    geo_url: String,
    public_ip_url: String,
}

impl GeoClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_endpoints(
            &config.geo_url,
            &config.public_ip_url,
            Duration::from_secs(config.timeout),
        )
    }

    /// Build a client against explicit endpoints.
    ///
    /// `geo_url` is the base the target IP is appended to
    /// (e.g. `http://ip-api.com/json`).
    pub fn with_endpoints(
        geo_url: &str,
        public_ip_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ip-tracer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            geo_url: geo_url.trim_end_matches('/').to_string(),
            public_ip_url: public_ip_url.to_string(),
        })
    }

    fn lookup_url(&self, ip: &Ipv4Target) -> String {
        format!("{}/{}?fields={}", self.geo_url, ip.as_str(), GEO_FIELDS)
    }
}

impl GeoService for GeoClient {
    async fn resolve_own_ip(&self) -> Result<Ipv4Target, TraceError> {
        let classify = |e| TraceError::from_reqwest(PUBLIC_IP_CONTEXT, e);

        debug!(url = %self.public_ip_url, "resolving public IP");

        let resp = self
            .http
            .get(&self.public_ip_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;

        let body: PublicIpResponse = resp.json().await.map_err(classify)?;
        let ip = body
            .ip
            .ok_or_else(|| TraceError::transport(PUBLIC_IP_CONTEXT, "response has no `ip` field"))?;

        match ip.parse::<Ipv4Target>() {
            Ok(target) => {
                info!(ip = %target, "detected public IP");
                Ok(target)
            }
            Err(_) => {
                warn!(ip = %ip, "public IP service returned a non-IPv4 address");
                Err(TraceError::transport(
                    PUBLIC_IP_CONTEXT,
                    format!("`{ip}` is not an IPv4 address"),
                ))
            }
        }
    }

    async fn lookup(&self, ip: &Ipv4Target) -> Result<GeoRecord, TraceError> {
        let classify = |e| TraceError::from_reqwest(LOOKUP_CONTEXT, e);
        let url = self.lookup_url(ip);

        debug!(url = %url, "looking up geolocation");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;

        let body: IpApiResponse = resp.json().await.map_err(classify)?;

        if body.status.as_deref() == Some("fail") {
            let message = body.message.unwrap_or_else(|| "Unknown error".to_string());
            info!(ip = %ip, message = %message, "geolocation query rejected");
            return Err(TraceError::ApiRejected(message));
        }

        info!(ip = %ip, country = ?body.country, "geolocation lookup ok");
        Ok(body.into())
    }
}
