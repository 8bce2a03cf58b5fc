//! SSDP (Simple Service Discovery Protocol) message handling.
//!
//! This module builds M-SEARCH requests, parses the HTTP-like datagrams
//! SSDP devices send back, and applies the admission rules that decide
//! which announcements enter the device registry. It is not part of the
//! public API.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::{DiscoveryError, Result};
use crate::headers::HeaderMap;
use crate::registry::DeviceRegistry;
use crate::Device;

/// Well-known SSDP multicast address.
pub const SSDP_ADDRESS: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
/// Well-known SSDP port.
pub const SSDP_PORT: u16 = 1900;
/// Search target matching every UPnP root device.
pub const SEARCH_TARGET_ROOT_DEVICE: &str = "upnp:rootdevice";
/// NTS value announcing a device joining the network.
pub const NTS_ALIVE: &str = "ssdp:alive";
/// NTS value announcing a device leaving the network.
pub const NTS_BYEBYE: &str = "ssdp:byebye";
/// NTS value announcing a configuration change.
pub const NTS_UPDATE: &str = "ssdp:update";

/// How long a search sweep listens for unicast replies.
pub(crate) const SEARCH_WINDOW: Duration = Duration::from_secs(10);
/// TTL for outbound multicast packets, enough for routed home networks.
pub(crate) const MULTICAST_TTL: u32 = 10;

/// A parsed inbound SSDP datagram.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SsdpMessage {
    /// Multicast `NOTIFY * HTTP/1.1` announcement.
    Notify(HeaderMap),
    /// Unicast `HTTP/1.1 200 OK` reply to one of our searches.
    SearchReply(HeaderMap),
    /// Anything else on the multicast group, e.g. a neighbour's M-SEARCH.
    Other,
}

/// Build the raw M-SEARCH request for the given MX and search target.
pub(crate) fn build_search_request(mx: u8, search_target: &str) -> String {
    let mut headers = HeaderMap::new();
    // These names are always valid, so the inserts cannot fail.
    let _ = headers.insert("HOST", &format!("{}:{}", SSDP_ADDRESS, SSDP_PORT));
    let _ = headers.insert("MAN", "\"ssdp:discover\"");
    let _ = headers.insert("MX", &mx.to_string());
    let _ = headers.insert("ST", search_target);
    format!("M-SEARCH * HTTP/1.1\r\n{}\r\n", headers.header_block())
}

/// Parse one inbound datagram into an [`SsdpMessage`].
///
/// The first line decides the message kind; header lines follow until a
/// blank line. Lines without a colon are skipped, but a header with an
/// invalid name makes the whole datagram unusable.
pub(crate) fn parse_datagram(text: &str) -> Result<SsdpMessage> {
    let mut lines = text.lines();
    let start_line = lines
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| DiscoveryError::Parse("empty datagram".to_string()))?;

    let method = start_line
        .split_whitespace()
        .next()
        .unwrap_or(start_line);

    let kind = if method.eq_ignore_ascii_case("NOTIFY") {
        Some(true)
    } else if method.to_ascii_uppercase().starts_with("HTTP/") {
        Some(false)
    } else {
        None
    };
    let Some(is_notify) = kind else {
        return Ok(SsdpMessage::Other);
    };

    let mut headers = HeaderMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        headers.insert(key, value)?;
    }

    if is_notify {
        Ok(SsdpMessage::Notify(headers))
    } else {
        Ok(SsdpMessage::SearchReply(headers))
    }
}

/// Apply one inbound datagram to the registry.
///
/// Announcements without a USN are ignored, `ssdp:byebye` removes the
/// device, sub-types other than alive/update are dropped, and messages
/// for embedded devices or services (an NT other than `upnp:rootdevice`)
/// are dropped so each physical device is tracked exactly once.
pub(crate) fn handle_datagram(registry: &DeviceRegistry, text: &str, source: SocketAddr) {
    let headers = match parse_datagram(text) {
        Ok(SsdpMessage::Notify(headers)) | Ok(SsdpMessage::SearchReply(headers)) => headers,
        Ok(SsdpMessage::Other) => {
            trace!(%source, "ignoring unrelated SSDP traffic");
            return;
        }
        Err(e) => {
            warn!(%source, error = %e, "discarding malformed datagram");
            return;
        }
    };

    // Search replies carry no NTS; absence means the device is alive.
    let nts = headers.get("NTS").unwrap_or(NTS_ALIVE);
    if nts.eq_ignore_ascii_case(NTS_BYEBYE) {
        if let Some(usn) = headers.get("USN") {
            registry.remove(usn);
        }
        return;
    }
    if !nts.eq_ignore_ascii_case(NTS_ALIVE) && !nts.eq_ignore_ascii_case(NTS_UPDATE) {
        trace!(%source, nts, "ignoring notification with unknown sub-type");
        return;
    }
    if let Some(nt) = headers.get("NT") {
        if nt != SEARCH_TARGET_ROOT_DEVICE {
            trace!(%source, nt, "ignoring non-root announcement");
            return;
        }
    }

    let Some(usn) = headers.get("USN") else {
        debug!(%source, "announcement without USN ignored");
        return;
    };

    let device_type = headers
        .get("ST")
        .or_else(|| headers.get("NT"))
        .unwrap_or("(unknown)");

    registry.add(Device {
        device_type: device_type.to_string(),
        server: headers.get("SERVER").unwrap_or_default().to_string(),
        location: headers.get("LOCATION").unwrap_or_default().to_string(),
        usn: usn.to_string(),
        address: source,
    });
}

/// Receive datagrams on `socket` and feed them to the registry until the
/// stop flag is raised.
///
/// The socket must have a read timeout configured; each timeout is used
/// to re-check the stop flag.
pub(crate) fn receive_loop(registry: &DeviceRegistry, socket: &UdpSocket, stop: &AtomicBool) {
    let mut buffer = [0u8; 2048];
    while !stop.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buffer) {
            Ok((size, source)) => {
                let text = String::from_utf8_lossy(&buffer[..size]);
                handle_datagram(registry, &text, source);
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            // On some platforms a UDP socket reports a reset after an ICMP
            // unreachable or during teardown; neither ends the loop.
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {}
            Err(e) => {
                warn!(error = %e, "socket receive failed");
            }
        }
    }
}
