//! Fetching and enriching device descriptions over HTTP.

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, SchemaError};
use crate::model::DeviceSchema;
use crate::parser::{parse_device_description, parse_service_description};
use crate::urls::resolve_url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch one description document as text.
///
/// # Errors
///
/// Returns `SchemaError::Fetch` when the request fails or the device
/// answers with a non-success status.
pub fn fetch_description(url: &str) -> Result<String> {
    let client = make_client(url)?;
    fetch_with(&client, url)
}

/// Fetch, parse and enrich the full schema of a device.
///
/// This is the all-in-one entry point: it downloads the description at
/// `location`, parses it, resolves every service URL against `location`
/// and merges each service's SCPD into the schema. SCPD problems are
/// logged and leave the affected service as a stub; only the device
/// description itself is load-bearing.
pub fn describe_device(location: &str) -> Result<DeviceSchema> {
    let base = Url::parse(location).map_err(|e| SchemaError::Url(format!("{}: {}", location, e)))?;
    let client = make_client(location)?;
    let xml = fetch_with(&client, location)?;
    let mut schema = parse_device_description(&xml)?;
    debug!(location, device = %schema.friendly_name, "parsed device description");

    schema.visit_services_mut(&mut |service| {
        for raw in [
            &mut service.scpd_url,
            &mut service.control_url,
            &mut service.event_sub_url,
        ] {
            match resolve_url(&base, raw) {
                Ok(resolved) => *raw = resolved,
                Err(e) => warn!(service = %service.service_id, error = %e, "keeping unresolved URL"),
            }
        }

        match fetch_with(&client, &service.scpd_url) {
            Ok(scpd_xml) => match parse_service_description(&scpd_xml) {
                Ok(scpd) => {
                    if scpd.is_empty() {
                        info!(service = %service.service_id, "service schema is an empty stub");
                    }
                    service.merge_scpd(scpd);
                }
                Err(e) => {
                    warn!(service = %service.service_id, error = %e, "unusable service schema");
                }
            },
            Err(e) => {
                warn!(service = %service.service_id, error = %e, "failed to fetch service schema");
            }
        }
    });

    Ok(schema)
}

fn make_client(url: &str) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| SchemaError::Fetch {
            url: url.to_string(),
            reason: format!("failed to create HTTP client: {}", e),
        })
}

fn fetch_with(client: &reqwest::blocking::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().map_err(|e| SchemaError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(SchemaError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP status {}", status),
        });
    }
    response.text().map_err(|e| SchemaError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
