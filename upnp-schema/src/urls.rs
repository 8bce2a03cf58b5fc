//! Resolution of the URLs found in description documents.

use url::Url;

use crate::error::{Result, SchemaError};

/// Resolve a URL from a description document against the document's own
/// URL.
///
/// Absolute URLs pass through untouched. Anything else is treated as a
/// path on the device that served the description, with a leading slash
/// supplied when missing; devices in the wild write both "/ctl/Foo" and
/// "ctl/Foo" and mean the same location.
pub fn resolve_url(base: &Url, proposed: &str) -> Result<String> {
    let proposed = proposed.trim();
    if Url::parse(proposed).is_ok() {
        return Ok(proposed.to_string());
    }
    let path = if proposed.starts_with('/') {
        proposed.to_string()
    } else {
        format!("/{}", proposed)
    };
    let resolved = base
        .join(&path)
        .map_err(|e| SchemaError::Url(format!("{} against {}: {}", proposed, base, e)))?;
    Ok(resolved.to_string())
}
