//! Data model for UPnP device and service descriptions.

use crate::error::{Result, SchemaError};

/// A device as declared in its description document.
///
/// Mirrors the `<device>` element of the UPnP device architecture:
/// identity fields, optional vendor extras, icons, the services the
/// device offers and any embedded sub-devices.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSchema {
    /// Device type URN, e.g. "urn:schemas-upnp-org:device:MediaServer:1"
    pub device_type: String,
    /// Short human-readable name
    pub friendly_name: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Manufacturer web site
    pub manufacturer_url: Option<String>,
    /// Long description for the end user
    pub model_description: Option<String>,
    /// Model name
    pub model_name: String,
    /// Model number
    pub model_number: Option<String>,
    /// Web site for the model
    pub model_url: Option<String>,
    /// Serial number
    pub serial_number: Option<String>,
    /// Unique Device Name, e.g. "uuid:4d696e69-444c-164e-9d41-..."
    pub udn: String,
    /// Universal Product Code
    pub upc: Option<String>,
    /// URL of a device-hosted presentation page
    pub presentation_url: Option<String>,
    /// Icons the device publishes
    pub icons: Vec<DeviceIcon>,
    /// Services hosted directly by this device
    pub services: Vec<Service>,
    /// Embedded sub-devices
    pub devices: Vec<DeviceSchema>,
}

impl DeviceSchema {
    /// Find a service by exact service type, searching this device and
    /// all embedded sub-devices depth-first.
    pub fn find_service(&self, service_type: &str) -> Option<&Service> {
        if let Some(service) = self.services.iter().find(|s| s.service_type == service_type) {
            return Some(service);
        }
        self.devices
            .iter()
            .find_map(|device| device.find_service(service_type))
    }

    /// All services of this device and its sub-devices, depth-first.
    pub fn all_services(&self) -> Vec<&Service> {
        let mut services: Vec<&Service> = self.services.iter().collect();
        for device in &self.devices {
            services.extend(device.all_services());
        }
        services
    }

    /// Apply `f` to every service of this device and its sub-devices.
    pub fn visit_services_mut<F: FnMut(&mut Service)>(&mut self, f: &mut F) {
        for service in &mut self.services {
            f(service);
        }
        for device in &mut self.devices {
            device.visit_services_mut(f);
        }
    }
}

/// One entry of a device's icon list.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceIcon {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// Color depth in bits
    pub depth: u32,
    pub url: String,
}

/// A service as declared in the device description, optionally enriched
/// with its SCPD contents.
///
/// Right after parsing a device description only the five URL and
/// identity fields are filled in; `actions` and `state_variables` arrive
/// when the SCPD document behind `scpd_url` is fetched and merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Service type URN, e.g. "urn:schemas-upnp-org:service:ContentDirectory:1"
    pub service_type: String,
    /// Service identifier, e.g. "urn:upnp-org:serviceId:ContentDirectory"
    pub service_id: String,
    /// Where the SCPD document lives
    pub scpd_url: String,
    /// Where SOAP requests are posted
    pub control_url: String,
    /// Where event subscriptions are managed
    pub event_sub_url: String,
    /// Actions declared by the SCPD
    pub actions: Vec<Action>,
    /// State variables declared by the SCPD
    pub state_variables: Vec<StateVariable>,
}

impl Service {
    /// Look up an action by exact name.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Look up the state variable an argument refers to.
    ///
    /// Device firmware is sloppy about casing here, so the lookup ignores
    /// ASCII case.
    pub fn variable_for(&self, argument: &Argument) -> Option<&StateVariable> {
        self.state_variables
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(&argument.related_state_variable))
    }

    /// Merge a parsed SCPD document into this service, appending its
    /// actions and state variables.
    pub fn merge_scpd(&mut self, scpd: ScpdDocument) {
        self.actions.extend(scpd.actions);
        self.state_variables.extend(scpd.state_variables);
    }

    /// Whether the service declared no actions and no state variables.
    ///
    /// Some devices serve an empty document at the SCPD URL; such a
    /// service exists but cannot be invoked in a typed way.
    pub fn is_stub(&self) -> bool {
        self.actions.is_empty() && self.state_variables.is_empty()
    }
}

/// An action a service can perform.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    /// All arguments in SCPD declaration order
    pub arguments: Vec<Argument>,
}

impl Action {
    /// Input arguments in declaration order.
    pub fn arguments_in(&self) -> Vec<&Argument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == Direction::In)
            .collect()
    }

    /// Output arguments in declaration order.
    pub fn arguments_out(&self) -> Vec<&Argument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == Direction::Out)
            .collect()
    }
}

/// Whether an argument travels with the request or the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Parse an SCPD direction value, ignoring ASCII case.
    pub fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("in") {
            Ok(Direction::In)
        } else if value.eq_ignore_ascii_case("out") {
            Ok(Direction::Out)
        } else {
            Err(SchemaError::InvalidDirection(value.to_string()))
        }
    }
}

/// One argument of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub direction: Direction,
    /// Name of the state variable that types this argument
    pub related_state_variable: String,
    /// Whether the SCPD marks this argument as the return value
    pub return_value: bool,
}

/// A state variable of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVariable {
    pub name: String,
    /// UPnP data type, e.g. "string", "ui4", "boolean"
    pub data_type: String,
    pub default_value: Option<String>,
    /// Allowed values when the SCPD constrains the variable to a list
    pub allowed_values: Vec<String>,
    /// Whether changes are evented, from the `sendEvents` attribute
    pub send_events: bool,
}

/// The parsed contents of one SCPD document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScpdDocument {
    pub actions: Vec<Action>,
    pub state_variables: Vec<StateVariable>,
}

impl ScpdDocument {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.state_variables.is_empty()
    }
}

/// Interpret a UPnP boolean value.
///
/// UPnP devices write "1"/"0", "true"/"false" or "yes"/"no" in any case.
/// An empty value counts as false; anything else is an error.
pub fn parse_upnp_bool(value: &str) -> Result<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(false);
    }
    if value == "1"
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
    {
        return Ok(true);
    }
    if value == "0"
        || value.eq_ignore_ascii_case("false")
        || value.eq_ignore_ascii_case("no")
    {
        return Ok(false);
    }
    Err(SchemaError::InvalidBoolean(value.to_string()))
}
