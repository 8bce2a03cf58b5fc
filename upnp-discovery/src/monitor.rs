//! Passive background monitoring of SSDP announcements.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use crate::error::{DiscoveryError, Result};
use crate::registry::DeviceRegistry;
use crate::ssdp::{self, SSDP_ADDRESS, SSDP_PORT};

const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to a running monitor thread.
///
/// Dropping the handle stops the thread. The read timeout on the
/// underlying socket bounds how long a stop can take.
pub(crate) struct MonitorHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Signal the monitor thread to stop and wait for it to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start listening for multicast NOTIFY announcements on port 1900.
///
/// The socket binds with `SO_REUSEADDR` so the monitor can coexist with
/// other UPnP software on the same host, and joins the SSDP multicast
/// group on every non-loopback IPv4 interface.
pub(crate) fn start(registry: Arc<DeviceRegistry>) -> Result<MonitorHandle> {
    let socket = open_notify_socket().map_err(|e| {
        DiscoveryError::Network(format!("failed to open SSDP monitor socket: {}", e))
    })?;

    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let thread = thread::spawn(move || {
        ssdp::receive_loop(&registry, &socket, &thread_stop);
    });

    debug!("SSDP monitor started");
    Ok(MonitorHandle {
        stop,
        thread: Some(thread),
    })
}

fn open_notify_socket() -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SSDP_PORT);
    socket.bind(&bind_addr.into())?;

    let socket: UdpSocket = socket.into();
    socket.set_read_timeout(Some(READ_TIMEOUT))?;

    let mut joined = 0;
    if let Ok(interfaces) = get_if_addrs::get_if_addrs() {
        for iface in interfaces {
            if let IpAddr::V4(ip) = iface.ip() {
                if ip.is_loopback() {
                    continue;
                }
                match socket.join_multicast_v4(&SSDP_ADDRESS, &ip) {
                    Ok(()) => {
                        debug!(interface = %ip, "joined SSDP multicast group");
                        joined += 1;
                    }
                    Err(e) => {
                        warn!(interface = %ip, error = %e, "failed to join multicast group");
                    }
                }
            }
        }
    }
    if joined == 0 {
        // No per-interface join succeeded; let the kernel pick a route.
        socket.join_multicast_v4(&SSDP_ADDRESS, &Ipv4Addr::UNSPECIFIED)?;
    }

    Ok(socket)
}
