//! Serde model for DIDL-Lite browse payloads
//!
//! Every metadata element carries its namespace-qualified name plus a
//! bare-name alias, because lax device firmware omits the `dc:`/`upnp:`
//! prefixes.

use serde::Deserialize;

use crate::error::{ContentDirectoryError, Result};

/// Root of a DIDL-Lite document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "DIDL-Lite")]
pub(crate) struct DidlDocument {
    #[serde(rename = "container", default)]
    pub containers: Vec<DidlContainer>,

    #[serde(rename = "item", default)]
    pub items: Vec<DidlItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DidlContainer {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@parentID")]
    pub parent_id: String,

    #[serde(rename = "@restricted", default)]
    pub restricted: Option<String>,

    #[serde(rename = "@childCount", default)]
    pub child_count: Option<String>,

    #[serde(rename = "dc:title", alias = "title")]
    pub title: String,

    #[serde(rename = "upnp:class", alias = "class")]
    pub class: String,

    #[serde(rename = "upnp:writeStatus", alias = "writeStatus", default)]
    pub write_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DidlItem {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@parentID")]
    pub parent_id: String,

    #[serde(rename = "@restricted", default)]
    pub restricted: Option<String>,

    #[serde(rename = "dc:title", alias = "title")]
    pub title: String,

    #[serde(rename = "upnp:class", alias = "class")]
    pub class: String,

    #[serde(rename = "dc:date", alias = "date", default)]
    pub date: Option<String>,

    #[serde(rename = "res", default)]
    pub resources: Vec<DidlResource>,
}

/// A media resource; all attributes are optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DidlResource {
    #[serde(rename = "@protocolInfo", default)]
    pub protocol_info: Option<String>,

    #[serde(rename = "@resolution", default)]
    pub resolution: Option<String>,

    #[serde(rename = "@size", default)]
    pub size: Option<String>,

    #[serde(rename = "@bitrate", default)]
    pub bitrate: Option<String>,

    #[serde(rename = "@duration", default)]
    pub duration: Option<String>,

    #[serde(rename = "@nrAudioChannels", default)]
    pub nr_audio_channels: Option<String>,

    #[serde(rename = "@sampleFrequency", default)]
    pub sample_frequency: Option<String>,

    #[serde(rename = "$text", default)]
    pub uri: String,
}

pub(crate) fn parse_didl(text: &str) -> Result<DidlDocument> {
    quick_xml::de::from_str(text).map_err(|e| ContentDirectoryError::Didl(e.to_string()))
}
