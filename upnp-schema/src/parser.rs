//! Parsing of device description and SCPD documents.
//!
//! Both document kinds are handled structurally with xmltree, matching
//! elements by local name so namespace prefixes and default namespaces
//! never get in the way. The parser is strict about what the UPnP 1.0
//! architecture marks as required and lenient about everything else.

use xmltree::{Element, XMLNode};

use crate::error::{Result, SchemaError};
use crate::model::{
    parse_upnp_bool, Action, Argument, DeviceIcon, DeviceSchema, Direction, ScpdDocument, Service,
    StateVariable,
};

/// Parse a device description document.
///
/// URLs inside the document are kept exactly as written; resolving them
/// against the description's own URL happens later, when the caller
/// knows where the document came from.
pub fn parse_device_description(xml: &str) -> Result<DeviceSchema> {
    let root = Element::parse(xml.as_bytes()).map_err(|e| SchemaError::Xml(e.to_string()))?;
    if root.name != "root" {
        return Err(SchemaError::MissingElement("root".to_string()));
    }
    check_spec_version(&root)?;
    let device = required_child(&root, "device")?;
    parse_device(device)
}

/// Parse an SCPD (service schema) document.
///
/// Some devices answer the SCPD URL with an empty body; that is a valid
/// stub schema, not an error.
pub fn parse_service_description(xml: &str) -> Result<ScpdDocument> {
    if xml.trim().is_empty() {
        return Ok(ScpdDocument::default());
    }
    let root = Element::parse(xml.as_bytes()).map_err(|e| SchemaError::Xml(e.to_string()))?;
    if root.name != "scpd" {
        return Err(SchemaError::MissingElement("scpd".to_string()));
    }
    check_spec_version(&root)?;

    let actions = match root.get_child("actionList") {
        Some(list) => child_elements(list, "action")
            .map(parse_action)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let state_variables = match root.get_child("serviceStateTable") {
        Some(table) => child_elements(table, "stateVariable")
            .map(parse_state_variable)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(ScpdDocument {
        actions,
        state_variables,
    })
}

/// Render a device schema back into description XML.
///
/// The output carries a 1.0 spec version and the same element layout the
/// parser reads, so parsing the rendered document yields an equal schema.
pub fn write_device_description(schema: &DeviceSchema) -> Result<String> {
    let mut root = Element::new("root");

    let mut spec_version = Element::new("specVersion");
    spec_version.children.push(text_element("major", "1"));
    spec_version.children.push(text_element("minor", "0"));
    root.children.push(XMLNode::Element(spec_version));
    root.children.push(XMLNode::Element(build_device(schema)));

    let mut buffer = Vec::new();
    root.write(&mut buffer)
        .map_err(|e| SchemaError::Xml(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| SchemaError::Xml(e.to_string()))
}

fn check_spec_version(parent: &Element) -> Result<()> {
    let spec_version = required_child(parent, "specVersion")?;
    let major = required_number(spec_version, "major")?;
    let minor = required_number(spec_version, "minor")?;
    if major > 1 || (major == 1 && minor > 0) {
        return Err(SchemaError::UnsupportedSpecVersion { major, minor });
    }
    Ok(())
}

fn parse_device(el: &Element) -> Result<DeviceSchema> {
    let device_type = required_text(el, "deviceType")?;
    let friendly_name = required_text(el, "friendlyName")?;
    let manufacturer = required_text(el, "manufacturer")?;
    let model_name = required_text(el, "modelName")?;
    let udn = required_text(el, "UDN")?;

    let icons = match el.get_child("iconList") {
        Some(list) => child_elements(list, "icon")
            .map(parse_icon)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    // A device without a service list is not usable at all.
    let service_list = required_child(el, "serviceList")?;
    let services = child_elements(service_list, "service")
        .map(parse_service_entry)
        .collect::<Result<Vec<_>>>()?;

    let devices = match el.get_child("deviceList") {
        Some(list) => child_elements(list, "device")
            .map(parse_device)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(DeviceSchema {
        device_type,
        friendly_name,
        manufacturer,
        manufacturer_url: optional_text(el, "manufacturerURL"),
        model_description: optional_text(el, "modelDescription"),
        model_name,
        model_number: optional_text(el, "modelNumber"),
        model_url: optional_text(el, "modelURL"),
        serial_number: optional_text(el, "serialNumber"),
        udn,
        upc: optional_text(el, "UPC"),
        presentation_url: optional_text(el, "presentationURL"),
        icons,
        services,
        devices,
    })
}

fn parse_icon(el: &Element) -> Result<DeviceIcon> {
    Ok(DeviceIcon {
        mime_type: required_text(el, "mimetype")?,
        width: required_number(el, "width")?,
        height: required_number(el, "height")?,
        depth: required_number(el, "depth")?,
        url: required_text(el, "url")?,
    })
}

fn parse_service_entry(el: &Element) -> Result<Service> {
    Ok(Service {
        service_type: required_text(el, "serviceType")?,
        service_id: required_text(el, "serviceId")?,
        scpd_url: required_text(el, "SCPDURL")?,
        control_url: required_text(el, "controlURL")?,
        event_sub_url: required_text(el, "eventSubURL")?,
        actions: Vec::new(),
        state_variables: Vec::new(),
    })
}

fn parse_action(el: &Element) -> Result<Action> {
    let arguments = match el.get_child("argumentList") {
        Some(list) => child_elements(list, "argument")
            .map(parse_argument)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Action {
        name: required_text(el, "name")?,
        arguments,
    })
}

fn parse_argument(el: &Element) -> Result<Argument> {
    Ok(Argument {
        name: required_text(el, "name")?,
        direction: Direction::parse(&required_text(el, "direction")?)?,
        related_state_variable: required_text(el, "relatedStateVariable")?,
        return_value: el.get_child("retval").is_some(),
    })
}

fn parse_state_variable(el: &Element) -> Result<StateVariable> {
    // The attribute defaults to "yes" when a device omits it.
    let send_events = match el.attributes.get("sendEvents") {
        Some(value) => parse_upnp_bool(value)?,
        None => true,
    };
    let allowed_values = match el.get_child("allowedValueList") {
        Some(list) => child_elements(list, "allowedValue")
            .map(element_text)
            .collect(),
        None => Vec::new(),
    };
    Ok(StateVariable {
        name: required_text(el, "name")?,
        data_type: required_text(el, "dataType")?,
        default_value: optional_text(el, "defaultValue"),
        allowed_values,
        send_events,
    })
}

fn build_device(schema: &DeviceSchema) -> Element {
    let mut device = Element::new("device");
    device
        .children
        .push(text_element("deviceType", &schema.device_type));
    device
        .children
        .push(text_element("friendlyName", &schema.friendly_name));
    device
        .children
        .push(text_element("manufacturer", &schema.manufacturer));
    push_optional(&mut device, "manufacturerURL", &schema.manufacturer_url);
    push_optional(&mut device, "modelDescription", &schema.model_description);
    device
        .children
        .push(text_element("modelName", &schema.model_name));
    push_optional(&mut device, "modelNumber", &schema.model_number);
    push_optional(&mut device, "modelURL", &schema.model_url);
    push_optional(&mut device, "serialNumber", &schema.serial_number);
    device.children.push(text_element("UDN", &schema.udn));
    push_optional(&mut device, "UPC", &schema.upc);
    push_optional(&mut device, "presentationURL", &schema.presentation_url);

    if !schema.icons.is_empty() {
        let mut icon_list = Element::new("iconList");
        for icon in &schema.icons {
            let mut el = Element::new("icon");
            el.children.push(text_element("mimetype", &icon.mime_type));
            el.children
                .push(text_element("width", &icon.width.to_string()));
            el.children
                .push(text_element("height", &icon.height.to_string()));
            el.children
                .push(text_element("depth", &icon.depth.to_string()));
            el.children.push(text_element("url", &icon.url));
            icon_list.children.push(XMLNode::Element(el));
        }
        device.children.push(XMLNode::Element(icon_list));
    }

    // The parser requires a service list even when it is empty.
    let mut service_list = Element::new("serviceList");
    for service in &schema.services {
        let mut el = Element::new("service");
        el.children
            .push(text_element("serviceType", &service.service_type));
        el.children
            .push(text_element("serviceId", &service.service_id));
        el.children.push(text_element("SCPDURL", &service.scpd_url));
        el.children
            .push(text_element("controlURL", &service.control_url));
        el.children
            .push(text_element("eventSubURL", &service.event_sub_url));
        service_list.children.push(XMLNode::Element(el));
    }
    device.children.push(XMLNode::Element(service_list));

    if !schema.devices.is_empty() {
        let mut device_list = Element::new("deviceList");
        for sub in &schema.devices {
            device_list.children.push(XMLNode::Element(build_device(sub)));
        }
        device.children.push(XMLNode::Element(device_list));
    }

    device
}

fn text_element(name: &str, value: &str) -> XMLNode {
    let mut el = Element::new(name);
    if !value.is_empty() {
        el.children.push(XMLNode::Text(value.to_string()));
    }
    XMLNode::Element(el)
}

fn push_optional(parent: &mut Element, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        parent.children.push(text_element(name, value));
    }
}

fn required_child<'a>(parent: &'a Element, name: &str) -> Result<&'a Element> {
    parent
        .get_child(name)
        .ok_or_else(|| SchemaError::MissingElement(name.to_string()))
}

fn required_text(parent: &Element, name: &str) -> Result<String> {
    Ok(element_text(required_child(parent, name)?))
}

fn optional_text(parent: &Element, name: &str) -> Option<String> {
    parent.get_child(name).map(element_text)
}

fn required_number(parent: &Element, name: &str) -> Result<u32> {
    let value = required_text(parent, name)?;
    value.parse().map_err(|_| SchemaError::InvalidNumber {
        element: name.to_string(),
        value,
    })
}

fn element_text(el: &Element) -> String {
    el.get_text().map(|t| t.trim().to_string()).unwrap_or_default()
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |el| el.name == name)
}
