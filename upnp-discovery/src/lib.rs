//! UPnP device discovery library
//!
//! This crate finds UPnP devices on the local network using SSDP (Simple
//! Service Discovery Protocol). It supports one-shot active searches and
//! passive background monitoring of the multicast announcements devices
//! send on their own, and keeps a registry of everything currently alive.
//!
//! # Quick Start
//!
//! ```no_run
//! use upnp_discovery::Discovery;
//!
//! let discovery = Discovery::new();
//! for device in discovery.search().unwrap() {
//!     println!("Found {} at {}", device.usn, device.location);
//! }
//! ```
//!
//! # Background Monitoring
//!
//! To track devices joining and leaving over time, start the monitor and
//! consume the event channel:
//!
//! ```no_run
//! use upnp_discovery::{Discovery, DeviceEvent};
//!
//! let mut discovery = Discovery::new();
//! discovery.start_monitor().unwrap();
//! for event in discovery.events() {
//!     match event {
//!         DeviceEvent::Found(device) => println!("+ {}", device.usn),
//!         DeviceEvent::Removed(device) => println!("- {}", device.usn),
//!     }
//! }
//! ```

mod datagram;
mod error;
mod headers;
mod monitor;
mod registry;
mod search;
mod ssdp;

use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};

use crate::monitor::MonitorHandle;
use crate::registry::DeviceRegistry;

pub use error::{DiscoveryError, Result};
pub use headers::HeaderMap;
pub use ssdp::{
    NTS_ALIVE, NTS_BYEBYE, NTS_UPDATE, SEARCH_TARGET_ROOT_DEVICE, SSDP_ADDRESS, SSDP_PORT,
};

/// Default MX value for search requests, in seconds.
///
/// Devices spread their replies over this many seconds to avoid a
/// response burst.
pub const DEFAULT_SEARCH_MX: u8 = 2;

/// Capacity of the device event channel.
///
/// When the channel is full, further events are dropped rather than
/// blocking the receive loops; the registry itself stays accurate.
const EVENT_CAPACITY: usize = 64;

/// A UPnP device announced on the local network.
///
/// Carries what SSDP alone can tell us. Fetching and parsing the device
/// description behind `location` is the job of the schema crate.
#[derive(Debug, Clone)]
pub struct Device {
    /// Search target or notification type the device announced, e.g.
    /// "upnp:rootdevice"
    pub device_type: String,
    /// Self-description of the device's software stack, from the SERVER
    /// header; empty when not announced
    pub server: String,
    /// URL of the device description document, from the LOCATION header;
    /// empty when not announced
    pub location: String,
    /// Unique Service Name, the identity of the device
    pub usn: String,
    /// Source address of the announcement
    pub address: SocketAddr,
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.usn == other.usn
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.usn.hash(state);
    }
}

/// Events emitted as the set of known devices changes.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A device was seen for the first time
    Found(Device),
    /// A device said goodbye with `ssdp:byebye`
    Removed(Device),
}

/// Parameters for an active search sweep.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// MX header value, the number of seconds devices may delay replies
    pub mx: u8,
    /// Search target, e.g. [`SEARCH_TARGET_ROOT_DEVICE`] or a specific
    /// device or service URN
    pub search_target: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mx: DEFAULT_SEARCH_MX,
            search_target: SEARCH_TARGET_ROOT_DEVICE.to_string(),
        }
    }
}

/// Entry point for discovering UPnP devices.
///
/// One `Discovery` owns a registry of live devices and an event channel
/// describing how that registry changes. Searches and the background
/// monitor both feed the same registry, so a device found either way is
/// reported exactly once.
pub struct Discovery {
    registry: Arc<DeviceRegistry>,
    events: Receiver<DeviceEvent>,
    monitor: Option<MonitorHandle>,
}

impl Discovery {
    pub fn new() -> Self {
        let (tx, rx) = bounded(EVENT_CAPACITY);
        Self {
            registry: Arc::new(DeviceRegistry::new(tx)),
            events: rx,
            monitor: None,
        }
    }

    /// The channel of [`DeviceEvent`]s.
    ///
    /// The receiver can be cloned and moved to another thread. Events are
    /// dropped when no receiver keeps up, so treat the channel as a change
    /// notification and [`devices`](Self::devices) as the source of truth.
    pub fn events(&self) -> Receiver<DeviceEvent> {
        self.events.clone()
    }

    /// Snapshot of all devices currently known to be alive.
    pub fn devices(&self) -> Vec<Device> {
        self.registry.snapshot()
    }

    /// Search for root devices with default options.
    ///
    /// Blocks for the duration of the sweep on every usable interface and
    /// returns the registry snapshot afterwards.
    pub fn search(&self) -> Result<Vec<Device>> {
        self.search_with_options(SearchOptions::default())
    }

    /// Search with a custom MX or search target.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use upnp_discovery::{Discovery, SearchOptions};
    ///
    /// let discovery = Discovery::new();
    /// let devices = discovery.search_with_options(SearchOptions {
    ///     mx: 5,
    ///     search_target: "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
    /// }).unwrap();
    /// ```
    pub fn search_with_options(&self, options: SearchOptions) -> Result<Vec<Device>> {
        search::run_search(&self.registry, &options)?;
        Ok(self.devices())
    }

    /// Start the passive monitor thread if it is not already running.
    ///
    /// The monitor listens for multicast NOTIFY announcements on port 1900
    /// and keeps the registry current without any active searching.
    pub fn start_monitor(&mut self) -> Result<()> {
        if self.monitor.is_none() {
            self.monitor = Some(monitor::start(Arc::clone(&self.registry))?);
        }
        Ok(())
    }

    /// Stop the monitor thread. Does nothing if it is not running.
    pub fn stop_monitor(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
        }
    }

    /// Whether the background monitor is currently running.
    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_some()
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}
