//! Case-normalized header map for SSDP datagrams.
//!
//! SSDP reuses the HTTP header syntax but matches names case-insensitively.
//! Keys are therefore normalized to uppercase on insert, and lookups accept
//! any casing.

use crate::error::{DiscoveryError, Result};

/// Ordered key/value store for the header lines of one SSDP datagram.
///
/// Insertion order is preserved so that outbound requests render their
/// headers deterministically. Re-inserting an existing key replaces the
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, normalizing the key to uppercase.
    ///
    /// The key must start with an ASCII letter or digit and continue with
    /// letters, digits, `_`, `.` or `-`, and be at least two characters
    /// long. Keys seen on the wire that violate this grammar make the whole
    /// datagram unusable, so the error propagates to the datagram parser.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        let key = normalize_key(key)?;
        let value = value.trim().to_string();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
        Ok(())
    }

    /// Look up a header value by name, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_ascii_uppercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of headers in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map contains no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render all headers as a raw `KEY: value\r\n` block, in insertion
    /// order, ready to be embedded in an outbound datagram.
    pub fn header_block(&self) -> String {
        let mut block = String::new();
        for (key, value) in &self.entries {
            block.push_str(key);
            block.push_str(": ");
            block.push_str(value);
            block.push_str("\r\n");
        }
        block
    }
}

fn normalize_key(key: &str) -> Result<String> {
    let key = key.trim().to_ascii_uppercase();
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphanumeric()
                && chars.clone().next().is_some()
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        None => false,
    };
    if !valid {
        return Err(DiscoveryError::InvalidHeader(key));
    }
    Ok(key)
}
