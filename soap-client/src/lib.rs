//! SOAP client for invoking UPnP device actions
//!
//! This crate provides a minimal SOAP client for invoking remote actions on
//! UPnP devices. Faults reported by a device are not surfaced as errors:
//! they land in the [`InvokeResult`] with `success == false` and the error
//! code and description the device chose to report. Transport failures and
//! unusable response bodies are [`SoapError`]s.
//!
//! Exactly one HTTP request is sent per invocation; retry policy is left to
//! the caller.

mod error;
mod response;

pub use error::{Result, SoapError};
pub use response::{SoapFault, UpnpError};

use std::time::Duration;

use tracing::{debug, warn};
use upnp_schema::Action;

use crate::response::{evaluate_envelope, EnvelopeOutcome};

/// Result of one action invocation.
///
/// On success, `outputs` holds the text values of the response element's
/// children in document order; the caller correlates positions with the
/// action's declared out-arguments. On failure the error code and
/// description come from the structured error block when the device sent
/// one, and the raw fault is kept alongside for callers that want the
/// fault code and string as well.
#[derive(Debug, Clone)]
pub struct InvokeResult {
    /// Whether the action completed without a fault
    pub success: bool,
    /// Positional output values (empty on failure)
    pub outputs: Vec<String>,
    /// Numeric UPnP error code, zero when the device reported none
    pub error_code: u16,
    /// Error description, empty when the device reported none
    pub error_message: String,
    /// The raw fault, when the response carried one
    pub fault: Option<SoapFault>,
}

impl InvokeResult {
    fn succeeded(outputs: Vec<String>) -> Self {
        InvokeResult {
            success: true,
            outputs,
            error_code: 0,
            error_message: String::new(),
            fault: None,
        }
    }

    fn failed() -> Self {
        InvokeResult {
            success: false,
            outputs: Vec::new(),
            error_code: 0,
            error_message: String::new(),
            fault: None,
        }
    }

    fn failed_with(fault: SoapFault) -> Self {
        let (error_code, error_message) = match &fault.error {
            Some(error) => (error.code, error.description.clone()),
            None => (0, String::new()),
        };
        InvokeResult {
            success: false,
            outputs: Vec::new(),
            error_code,
            error_message,
            fault: Some(fault),
        }
    }
}

/// A minimal SOAP client for UPnP action invocation
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
        }
    }

    /// Invoke `action` at `control_url` with positional input values.
    ///
    /// `values` must supply at least as many entries as the action declares
    /// in-arguments, in declared order; fewer is an argument-count error
    /// reported before any request is sent. A `None` entry omits that
    /// argument element from the request. Extra entries are ignored.
    pub fn invoke(
        &self,
        control_url: &str,
        service_type: &str,
        action: &Action,
        values: &[Option<String>],
    ) -> Result<InvokeResult> {
        let declared = action.arguments_in().len();
        if values.len() < declared {
            return Err(SoapError::NotEnoughArguments {
                expected: declared,
                got: values.len(),
            });
        }

        let body = build_envelope(service_type, action, values);
        let soap_action = format!("\"{}#{}\"", service_type, action.name);
        debug!(action = %action.name, url = %control_url, "invoking action");

        match self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => {
                let text = response
                    .into_string()
                    .map_err(|e| SoapError::Network(e.to_string()))?;
                match evaluate_envelope(&text, &action.name)? {
                    EnvelopeOutcome::Outputs(outputs) => Ok(InvokeResult::succeeded(outputs)),
                    EnvelopeOutcome::Fault(fault) => {
                        let result = InvokeResult::failed_with(fault);
                        warn!(
                            action = %action.name,
                            code = result.error_code,
                            message = %result.error_message,
                            "action reported a fault"
                        );
                        Ok(result)
                    }
                }
            }
            Err(ureq::Error::Status(status, response)) => {
                warn!(action = %action.name, status, "action returned an error status");
                // The error status alone decides failure; recovering the
                // fault details from the body is best-effort on top of it.
                let mut result = InvokeResult::failed();
                if let Ok(text) = response.into_string() {
                    if let Ok(EnvelopeOutcome::Fault(fault)) =
                        evaluate_envelope(&text, &action.name)
                    {
                        result = InvokeResult::failed_with(fault);
                    }
                }
                Ok(result)
            }
            Err(e) => Err(SoapError::Network(e.to_string())),
        }
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the request document: envelope, body, action element in the
/// service type namespace, one child per in-argument with a non-null value.
fn build_envelope(service_type: &str, action: &Action, values: &[Option<String>]) -> String {
    let mut arguments = String::new();
    for (argument, value) in action.arguments_in().iter().zip(values) {
        if let Some(value) = value {
            arguments.push_str(&format!(
                "<{name}>{value}</{name}>",
                name = argument.name,
                value = xml_escape(value)
            ));
        }
    }

    format!(
        "<?xml version=\"1.0\"?>\r\n\
         <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">\
         <s:Body>\
         <u:{action} xmlns:u=\"{service}\">{arguments}</u:{action}>\
         </s:Body>\
         </s:Envelope>",
        action = action.name,
        service = service_type,
        arguments = arguments
    )
}

/// Minimal XML text escaping for argument values
fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
