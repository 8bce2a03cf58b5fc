//! Outbound UDP datagrams.

use std::net::{SocketAddr, UdpSocket};

use tracing::{trace, warn};

/// A UDP message queued for transmission, with bookkeeping for repeats.
///
/// SSDP search requests are conventionally re-sent a few times because UDP
/// gives no delivery guarantee. A sticky datagram stays eligible for
/// re-transmission; `send_count` records how many attempts were made.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Where the message is sent.
    pub destination: SocketAddr,
    /// The raw message body.
    pub message: String,
    /// Whether the datagram should be re-sent on subsequent sweeps.
    pub sticky: bool,
    /// Number of times `send` has been called on this datagram.
    pub send_count: u32,
}

impl Datagram {
    pub fn new(destination: SocketAddr, message: String, sticky: bool) -> Self {
        Self {
            destination,
            message,
            sticky,
            send_count: 0,
        }
    }

    /// Send the message on the given socket.
    ///
    /// Transmission is fire-and-forget: UDP errors are logged and swallowed
    /// so that one unreachable destination cannot abort a search sweep. The
    /// send counter is incremented for the attempt either way.
    pub fn send(&mut self, socket: &UdpSocket) {
        self.send_count += 1;
        match socket.send_to(self.message.as_bytes(), self.destination) {
            Ok(bytes) => {
                trace!(
                    destination = %self.destination,
                    bytes,
                    attempt = self.send_count,
                    "sent datagram"
                );
            }
            Err(e) => {
                warn!(
                    destination = %self.destination,
                    error = %e,
                    "failed to send datagram"
                );
            }
        }
    }
}
