//! # upnp-schema
//!
//! Parsing of UPnP description documents: the device description served
//! at a device's LOCATION URL and the SCPD (Service Control Protocol
//! Description) documents its services point at. The crate also fetches
//! those documents over HTTP and assembles them into one enriched
//! [`DeviceSchema`] ready for SOAP invocation.
//!
//! ## Usage
//!
//! ### One call from LOCATION to enriched schema
//! ```no_run
//! use upnp_schema::describe_device;
//!
//! let schema = describe_device("http://192.168.1.20:8200/rootDesc.xml").unwrap();
//! for service in schema.all_services() {
//!     println!("{} with {} actions", service.service_type, service.actions.len());
//! }
//! ```
//!
//! ### Parsing documents you already have
//! ```
//! use upnp_schema::{parse_device_description, parse_service_description};
//!
//! # let description_xml = "<root><specVersion><major>1</major><minor>0</minor></specVersion><device><deviceType>t</deviceType><friendlyName>f</friendlyName><manufacturer>m</manufacturer><modelName>n</modelName><UDN>uuid:x</UDN><serviceList/></device></root>";
//! let schema = parse_device_description(description_xml).unwrap();
//! let stub = parse_service_description("").unwrap();
//! assert!(stub.is_empty());
//! ```

pub mod error;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod urls;

// Re-export error types for convenient top-level access
pub use error::{Result, SchemaError};

// Re-export the data model for convenient top-level access
pub use model::{
    parse_upnp_bool, Action, Argument, DeviceIcon, DeviceSchema, Direction, ScpdDocument, Service,
    StateVariable,
};

// Re-export the document operations for convenient top-level access
pub use fetch::{describe_device, fetch_description};
pub use parser::{parse_device_description, parse_service_description, write_device_description};
pub use urls::resolve_url;
