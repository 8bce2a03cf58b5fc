//! Active M-SEARCH sweeps across local network interfaces.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use crate::datagram::Datagram;
use crate::error::{DiscoveryError, Result};
use crate::registry::DeviceRegistry;
use crate::ssdp::{self, MULTICAST_TTL, SEARCH_WINDOW, SSDP_ADDRESS, SSDP_PORT};
use crate::SearchOptions;

const READ_TIMEOUT: Duration = Duration::from_secs(1);
const REPEAT_DELAY: Duration = Duration::from_secs(1);

/// Run one blocking search sweep on every usable interface.
///
/// Interfaces are swept one after the other; each sweep multicasts the
/// M-SEARCH request and collects unicast replies into the registry for
/// the duration of the search window. A failure on one interface is
/// logged and does not abort the remaining sweeps; only failing on every
/// interface is an error.
pub(crate) fn run_search(registry: &Arc<DeviceRegistry>, options: &SearchOptions) -> Result<()> {
    let interfaces = usable_interfaces();
    if interfaces.is_empty() {
        warn!("no usable network interfaces, skipping search");
        return Ok(());
    }

    let mut swept = 0;
    let total = interfaces.len();
    for interface in interfaces {
        debug!(%interface, target = %options.search_target, "searching on interface");
        match search_interface(registry, interface, options) {
            Ok(()) => swept += 1,
            Err(e) => warn!(%interface, error = %e, "search failed on interface"),
        }
    }
    if swept == 0 {
        return Err(DiscoveryError::Network(format!(
            "search failed on all {} interfaces",
            total
        )));
    }
    Ok(())
}

/// All non-loopback IPv4 addresses of this host.
fn usable_interfaces() -> Vec<Ipv4Addr> {
    match get_if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .filter_map(|iface| match iface.ip() {
                IpAddr::V4(ip) if !ip.is_loopback() => Some(ip),
                _ => None,
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "failed to enumerate network interfaces");
            Vec::new()
        }
    }
}

/// Sweep a single interface, feeding replies into the registry.
fn search_interface(
    registry: &Arc<DeviceRegistry>,
    interface: Ipv4Addr,
    options: &SearchOptions,
) -> std::io::Result<()> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
    let bind_addr = SocketAddr::new(IpAddr::V4(interface), 0);
    socket.bind(&bind_addr.into())?;

    let socket: UdpSocket = socket.into();
    socket.set_read_timeout(Some(READ_TIMEOUT))?;
    socket.set_multicast_loop_v4(true)?;

    let stop = Arc::new(AtomicBool::new(false));
    let receiver = socket.try_clone()?;
    let thread_registry = Arc::clone(registry);
    let thread_stop = Arc::clone(&stop);
    let listener = thread::spawn(move || {
        ssdp::receive_loop(&thread_registry, &receiver, &thread_stop);
    });

    let mut datagram = Datagram::new(
        multicast_destination(),
        ssdp::build_search_request(options.mx, &options.search_target),
        true,
    );

    // UDP gives no delivery guarantee, so sticky requests go out twice.
    datagram.send(&socket);
    if datagram.sticky {
        thread::sleep(REPEAT_DELAY);
        datagram.send(&socket);
    }
    thread::sleep(SEARCH_WINDOW.saturating_sub(REPEAT_DELAY));

    stop.store(true, Ordering::Relaxed);
    let _ = listener.join();
    Ok(())
}

fn multicast_destination() -> SocketAddr {
    SocketAddrV4::new(SSDP_ADDRESS, SSDP_PORT).into()
}
