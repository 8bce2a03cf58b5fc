//! Browsing of UPnP ContentDirectory services.
//!
//! [`ContentDirectory`] wraps one service entry from a device schema and
//! exposes its browse and capability actions as typed calls. Children
//! listings are paginated transparently: the client keeps requesting
//! pages until the server-reported total is reached, and a page that
//! fails mid-listing yields the partial result instead of an error.
//!
//! # Quick start
//!
//! ```no_run
//! use content_directory::ContentDirectory;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = upnp_schema::describe_device("http://192.168.0.16:50001/desc/device.xml")?;
//!     let directory =
//!         ContentDirectory::from_schema(&schema).ok_or("device has no ContentDirectory")?;
//!
//!     let listing = directory.browse_children("0", "*", 0, 50, "")?;
//!     for child in &listing.children {
//!         let marker = if child.is_container() { "dir " } else { "item" };
//!         println!("{} {}  {}", marker, child.id, child.title);
//!     }
//!     Ok(())
//! }
//! ```

mod didl;
mod error;
mod types;

pub use error::{ContentDirectoryError, Result};
pub use types::{
    BrowseChildrenResult, BrowseCounters, BrowseMetadataResult, BrowseObject, ChildEntry,
    ContainerMetadata, Feature, ItemMetadata,
};

use soap_client::{InvokeResult, SoapClient};
use tracing::{debug, warn};
use upnp_schema::{Action, DeviceSchema, Service};
use xmltree::Element;

use crate::didl::{parse_didl, DidlDocument};

/// Service type prefix shared by all ContentDirectory versions.
pub const SERVICE_TYPE_PREFIX: &str = "urn:schemas-upnp-org:service:ContentDirectory";

const BROWSE_ACTION: &str = "Browse";
const FLAG_METADATA: &str = "BrowseMetadata";
const FLAG_DIRECT_CHILDREN: &str = "BrowseDirectChildren";

/// Client for one ContentDirectory service instance.
pub struct ContentDirectory {
    client: SoapClient,
    service: Service,
}

impl ContentDirectory {
    /// Wrap a service entry. The service should carry its merged SCPD,
    /// otherwise every action lookup fails with `ActionNotSupported`.
    pub fn new(service: Service) -> Self {
        ContentDirectory {
            client: SoapClient::new(),
            service,
        }
    }

    /// Find the first ContentDirectory service anywhere in the device
    /// tree, any version.
    pub fn from_schema(schema: &DeviceSchema) -> Option<Self> {
        schema
            .all_services()
            .into_iter()
            .find(|service| service.service_type.starts_with(SERVICE_TYPE_PREFIX))
            .map(|service| ContentDirectory::new(service.clone()))
    }

    /// The wrapped service entry.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Fetch metadata for a single object.
    ///
    /// The browse always starts at index zero. Most servers only return
    /// the full property set when `filter` is `"*"`. A response that
    /// contains neither a container nor an item leaves `object` empty
    /// while still reporting the result counters.
    pub fn browse_metadata(
        &self,
        object_id: &str,
        filter: &str,
        requested_count: u32,
        sort_criteria: &str,
    ) -> Result<BrowseMetadataResult> {
        let action = self.action(BROWSE_ACTION)?;
        let values = browse_values(
            object_id,
            FLAG_METADATA,
            filter,
            0,
            requested_count,
            sort_criteria,
        );

        let outputs = self.browse_page(action, &values)?;
        let counters = parse_counters(&outputs)?;
        let object = select_object(parse_didl(&outputs[0])?)?;
        Ok(BrowseMetadataResult { counters, object })
    }

    /// List the direct children of a container, merging pages until the
    /// server-reported total is reached.
    ///
    /// The first page is fetched at `starting_index`; every following
    /// page starts where the accumulated listing ends. A later page that
    /// fails or comes back without the four browse outputs ends the
    /// listing early with whatever was collected. A page that reports
    /// zero returned entries while more are outstanding fails with
    /// [`ContentDirectoryError::PaginationStalled`], since retrying the
    /// same index would never terminate.
    ///
    /// In the returned counters `number_returned` covers the merged
    /// listing; `total_matches` and `update_id` are the first page's.
    pub fn browse_children(
        &self,
        object_id: &str,
        filter: &str,
        starting_index: u32,
        requested_count: u32,
        sort_criteria: &str,
    ) -> Result<BrowseChildrenResult> {
        let action = self.action(BROWSE_ACTION)?;
        debug!(object_id, "browsing children");

        let values = browse_values(
            object_id,
            FLAG_DIRECT_CHILDREN,
            filter,
            starting_index,
            requested_count,
            sort_criteria,
        );
        let outputs = self.browse_page(action, &values)?;
        let mut counters = parse_counters(&outputs)?;

        let mut fetched = counters.number_returned;
        let total = counters.total_matches;
        if fetched == 0 && total > 0 {
            return Err(ContentDirectoryError::PaginationStalled { fetched: 0, total });
        }
        let mut children = collect_children(parse_didl(&outputs[0])?);

        while fetched < total {
            let values = browse_values(
                object_id,
                FLAG_DIRECT_CHILDREN,
                filter,
                fetched,
                requested_count,
                sort_criteria,
            );
            let page = match self.browse_page(action, &values) {
                Ok(page) => page,
                Err(e) => {
                    warn!(fetched, total, error = %e, "browse page failed, returning partial listing");
                    break;
                }
            };

            let page_returned = parse_output("NumberReturned", &page[1])?;
            if page_returned == 0 {
                return Err(ContentDirectoryError::PaginationStalled { fetched, total });
            }
            children.extend(collect_children(parse_didl(&page[0])?));
            // Saturate so a server reporting inflated counts cannot wrap
            // the accumulator back under the total.
            fetched = fetched.saturating_add(page_returned);
        }

        counters.number_returned = fetched;
        Ok(BrowseChildrenResult { counters, children })
    }

    /// Comma-separated list of properties the server can search on.
    pub fn get_search_capabilities(&self) -> Result<String> {
        self.single_output("GetSearchCapabilities")
    }

    /// Comma-separated list of properties the server can sort on.
    pub fn get_sort_capabilities(&self) -> Result<String> {
        self.single_output("GetSortCapabilities")
    }

    /// Current value of the server's SystemUpdateID state variable.
    pub fn get_system_update_id(&self) -> Result<u32> {
        let id = self.single_output("GetSystemUpdateID")?;
        parse_output("Id", &id)
    }

    /// Token identifying the current generation of server-side state.
    pub fn get_service_reset_token(&self) -> Result<String> {
        self.single_output("GetServiceResetToken")
    }

    /// Optional feature declarations such as vendor view hierarchies.
    pub fn get_feature_list(&self) -> Result<Vec<Feature>> {
        let xml = self.single_output("GetFeatureList")?;
        parse_feature_list(&xml)
    }

    fn action(&self, name: &str) -> Result<&Action> {
        self.service
            .action(name)
            .ok_or_else(|| ContentDirectoryError::ActionNotSupported(name.to_string()))
    }

    fn invoke(&self, action: &Action, values: &[Option<String>]) -> Result<InvokeResult> {
        Ok(self.client.invoke(
            &self.service.control_url,
            &self.service.service_type,
            action,
            values,
        )?)
    }

    /// Invoke a browse and demand the four standard outputs.
    fn browse_page(&self, action: &Action, values: &[Option<String>]) -> Result<Vec<String>> {
        let result = self.invoke(action, values)?;
        if !result.success {
            return Err(ContentDirectoryError::Fault {
                action: action.name.clone(),
                code: result.error_code,
                message: result.error_message,
            });
        }
        if result.outputs.len() < 4 {
            return Err(ContentDirectoryError::ShortResponse(result.outputs.len()));
        }
        Ok(result.outputs)
    }

    /// Invoke a no-input action and return its first output value.
    fn single_output(&self, name: &str) -> Result<String> {
        let action = self.action(name)?;
        let result = self.invoke(action, &[])?;
        if !result.success {
            return Err(ContentDirectoryError::Fault {
                action: name.to_string(),
                code: result.error_code,
                message: result.error_message,
            });
        }
        result
            .outputs
            .into_iter()
            .next()
            .ok_or(ContentDirectoryError::ShortResponse(0))
    }
}

/// Input values for the Browse action in its declared argument order.
fn browse_values(
    object_id: &str,
    flag: &str,
    filter: &str,
    starting_index: u32,
    requested_count: u32,
    sort_criteria: &str,
) -> [Option<String>; 6] {
    [
        Some(object_id.to_string()),
        Some(flag.to_string()),
        Some(filter.to_string()),
        Some(starting_index.to_string()),
        Some(requested_count.to_string()),
        Some(sort_criteria.to_string()),
    ]
}

/// Read the three numeric browse outputs. The caller has already checked
/// that at least four outputs are present.
fn parse_counters(outputs: &[String]) -> Result<BrowseCounters> {
    Ok(BrowseCounters {
        number_returned: parse_output("NumberReturned", &outputs[1])?,
        total_matches: parse_output("TotalMatches", &outputs[2])?,
        update_id: parse_output("UpdateID", &outputs[3])?,
    })
}

fn parse_output(field: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| ContentDirectoryError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Pick the single object out of a metadata payload, containers taking
/// precedence over items.
fn select_object(document: DidlDocument) -> Result<Option<BrowseObject>> {
    if let Some(container) = document.containers.into_iter().next() {
        let metadata = ContainerMetadata::from_didl(container)?;
        return Ok(Some(BrowseObject::Container(metadata)));
    }
    if let Some(item) = document.items.into_iter().next() {
        let metadata = ItemMetadata::from_didl(item)?;
        return Ok(Some(BrowseObject::Item(metadata)));
    }
    Ok(None)
}

fn collect_children(document: DidlDocument) -> Vec<ChildEntry> {
    // Containers come first, then items, each in document order.
    let mut children: Vec<ChildEntry> = document
        .containers
        .into_iter()
        .map(ChildEntry::from_container)
        .collect();
    children.extend(document.items.into_iter().map(ChildEntry::from_item));
    children
}

fn parse_feature_list(xml: &str) -> Result<Vec<Feature>> {
    let root =
        Element::parse(xml.as_bytes()).map_err(|e| ContentDirectoryError::Xml(e.to_string()))?;
    if root.name != "Features" {
        return Err(ContentDirectoryError::Xml(
            "missing Features element".to_string(),
        ));
    }

    let mut features = Vec::new();
    for element in root.children.iter().filter_map(|child| child.as_element()) {
        if element.name != "Feature" {
            continue;
        }
        let object_ids = element
            .children
            .iter()
            .filter_map(|child| child.as_element())
            .filter(|child| child.name == "ObjectIDs")
            .filter_map(|child| child.get_text())
            .map(|text| text.trim().to_string())
            .collect();
        features.push(Feature {
            name: attribute(element, "name"),
            version: attribute(element, "version"),
            object_ids,
        });
    }
    Ok(features)
}

fn attribute(element: &Element, name: &str) -> String {
    element.attributes.get(name).cloned().unwrap_or_default()
}
