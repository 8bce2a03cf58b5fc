//! Typed results for directory browse operations

use upnp_schema::parse_upnp_bool;

use crate::didl::{DidlContainer, DidlItem};
use crate::error::{ContentDirectoryError, Result};

/// Result-envelope counters returned by every Browse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrowseCounters {
    /// Number of objects this operation returned
    pub number_returned: u32,
    /// Total matching objects reported by the server
    pub total_matches: u32,
    /// Server-side update id at the time of the call
    pub update_id: u32,
}

/// Metadata for a single container object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMetadata {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub class: String,
    pub restricted: bool,
    /// `WRITABLE`, `NOT_WRITABLE` or empty when the server omits it
    pub write_status: String,
    /// Zero when the server does not advertise a count
    pub child_count: u32,
}

/// Metadata for a single leaf item, including its primary resource.
///
/// The resource fields are zero / empty when the item carries no `res`
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub class: String,
    pub restricted: bool,
    pub date: String,
    pub protocol_info: String,
    pub resolution: String,
    pub size: u64,
    pub bitrate: u32,
    pub duration: String,
    pub nr_audio_channels: u32,
    pub sample_frequency: u32,
    /// Locator text of the first resource element
    pub resource: String,
}

/// The two shapes a metadata browse can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseObject {
    Container(ContainerMetadata),
    Item(ItemMetadata),
}

/// Outcome of a metadata browse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseMetadataResult {
    pub counters: BrowseCounters,
    /// `None` when the payload contained neither a container nor an item
    pub object: Option<BrowseObject>,
}

/// One entry in a children listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub class: String,
}

impl ChildEntry {
    /// Containers are recognized by class prefix; firmware casing varies.
    pub fn is_container(&self) -> bool {
        self.class
            .to_ascii_lowercase()
            .starts_with("object.container")
    }

    pub(crate) fn from_container(container: DidlContainer) -> Self {
        ChildEntry {
            id: container.id,
            parent_id: container.parent_id,
            title: container.title,
            class: container.class,
        }
    }

    pub(crate) fn from_item(item: DidlItem) -> Self {
        ChildEntry {
            id: item.id,
            parent_id: item.parent_id,
            title: item.title,
            class: item.class,
        }
    }
}

/// Outcome of a children browse, possibly merged from several pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseChildrenResult {
    /// `number_returned` reflects the full merged listing
    pub counters: BrowseCounters,
    pub children: Vec<ChildEntry>,
}

/// One entry from the server's feature list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub version: String,
    /// Root object ids the feature applies to
    pub object_ids: Vec<String>,
}

impl ContainerMetadata {
    pub(crate) fn from_didl(container: DidlContainer) -> Result<Self> {
        Ok(ContainerMetadata {
            restricted: parse_upnp_bool(container.restricted.as_deref().unwrap_or_default())?,
            child_count: parse_attribute("childCount", container.child_count)?,
            write_status: container.write_status.unwrap_or_default(),
            id: container.id,
            parent_id: container.parent_id,
            title: container.title,
            class: container.class,
        })
    }
}

impl ItemMetadata {
    pub(crate) fn from_didl(item: DidlItem) -> Result<Self> {
        let restricted = parse_upnp_bool(item.restricted.as_deref().unwrap_or_default())?;

        let mut metadata = ItemMetadata {
            id: item.id,
            parent_id: item.parent_id,
            title: item.title,
            class: item.class,
            restricted,
            date: item.date.unwrap_or_default(),
            protocol_info: String::new(),
            resolution: String::new(),
            size: 0,
            bitrate: 0,
            duration: String::new(),
            nr_audio_channels: 0,
            sample_frequency: 0,
            resource: String::new(),
        };

        // Only the first res element feeds the resource fields.
        if let Some(res) = item.resources.into_iter().next() {
            metadata.protocol_info = res.protocol_info.unwrap_or_default();
            metadata.resolution = res.resolution.unwrap_or_default();
            metadata.size = parse_attribute("size", res.size)?;
            metadata.bitrate = parse_attribute("bitrate", res.bitrate)?;
            metadata.duration = res.duration.unwrap_or_default();
            metadata.nr_audio_channels = parse_attribute("nrAudioChannels", res.nr_audio_channels)?;
            metadata.sample_frequency = parse_attribute("sampleFrequency", res.sample_frequency)?;
            metadata.resource = res.uri;
        }

        Ok(metadata)
    }
}

/// Parse an optional numeric attribute. Absent or blank means zero; present
/// but non-numeric is a typed failure.
fn parse_attribute<T>(field: &str, value: Option<String>) -> Result<T>
where
    T: std::str::FromStr + Default,
{
    match value {
        Some(text) if !text.trim().is_empty() => {
            text.trim()
                .parse()
                .map_err(|_| ContentDirectoryError::InvalidNumber {
                    field: field.to_string(),
                    value: text,
                })
        }
        _ => Ok(T::default()),
    }
}
