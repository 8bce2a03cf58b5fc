//! SOAP response evaluation
//!
//! A well-formed response body takes one of two shapes: an
//! `<ActionName>Response` element carrying positional output values, or a
//! `Fault` element carrying a protocol-level error report. Anything else is
//! a hard parse failure.

use xmltree::Element;

use crate::error::SoapError;

/// Structured error block nested inside a fault's `detail` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpnpError {
    /// Numeric error code reported by the device
    pub code: u16,
    /// Human-readable error description
    pub description: String,
}

/// A SOAP fault as reported by the remote device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// The `faultcode` value, typically `s:Client`
    pub fault_code: String,
    /// The `faultstring` value, typically `UPnPError`
    pub fault_string: String,
    /// The structured error from the fault detail, when the device sent one
    pub error: Option<UpnpError>,
}

#[derive(Debug)]
pub(crate) enum EnvelopeOutcome {
    /// Text values of the response element's children, in document order
    Outputs(Vec<String>),
    Fault(SoapFault),
}

/// Evaluate a SOAP response body for the named action.
///
/// A body without an `Envelope` root or without the expected response
/// element is a parse failure, distinct from a fault the device reported
/// deliberately.
pub(crate) fn evaluate_envelope(
    text: &str,
    action_name: &str,
) -> Result<EnvelopeOutcome, SoapError> {
    let root = Element::parse(text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;
    if root.name != "Envelope" {
        return Err(SoapError::Parse("no valid SOAP envelope".to_string()));
    }

    let body = root
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        return Ok(EnvelopeOutcome::Fault(parse_fault(fault)));
    }

    let response_name = format!("{}Response", action_name);
    let response = body
        .get_child(response_name.as_str())
        .ok_or_else(|| SoapError::Parse(format!("missing {} element", response_name)))?;

    let outputs = response
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .map(|child| child.get_text().map(|t| t.into_owned()).unwrap_or_default())
        .collect();
    Ok(EnvelopeOutcome::Outputs(outputs))
}

/// Extract the fault fields, tolerating whatever the device left out.
///
/// Every part is optional: a fault with no detail block still fails the
/// invocation downstream, with the code and description left at defaults.
fn parse_fault(fault: &Element) -> SoapFault {
    let error = fault
        .get_child("detail")
        .and_then(find_upnp_error)
        .map(|element| UpnpError {
            code: child_text(element, "errorCode").trim().parse().unwrap_or(0),
            description: child_text(element, "errorDescription"),
        });

    SoapFault {
        fault_code: child_text(fault, "faultcode"),
        fault_string: child_text(fault, "faultstring"),
        error,
    }
}

/// Device firmware is sloppy about the casing of `UPnPError`.
fn find_upnp_error(detail: &Element) -> Option<&Element> {
    detail
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .find(|element| element.name.eq_ignore_ascii_case("UPnPError"))
}

fn child_text(parent: &Element, name: &str) -> String {
    parent
        .get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}
