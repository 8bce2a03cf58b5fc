//! Shared device registry with change events.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::{Device, DeviceEvent};

/// Devices currently known to be alive, keyed by USN.
///
/// The registry is shared between the search sweeps, the background
/// monitor thread and the caller. All mutation goes through `add` and
/// `remove`, which emit the corresponding [`DeviceEvent`] exactly when the
/// set actually changes. Events are emitted after the internal lock is
/// released so a slow consumer can never stall a receive loop.
pub struct DeviceRegistry {
    devices: Mutex<HashMap<String, Device>>,
    events: Sender<DeviceEvent>,
}

impl DeviceRegistry {
    pub fn new(events: Sender<DeviceEvent>) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Record a device as alive.
    ///
    /// Returns `true` and emits [`DeviceEvent::Found`] if the USN was not
    /// already present. A re-announcement of a known USN refreshes the
    /// stored device silently, so repeated `ssdp:alive` notifications are
    /// idempotent from the consumer's point of view.
    pub fn add(&self, device: Device) -> bool {
        let event = {
            let mut devices = self.lock();
            let is_new = !devices.contains_key(&device.usn);
            if is_new {
                info!(usn = %device.usn, location = %device.location, "device found");
            }
            let event = is_new.then(|| DeviceEvent::Found(device.clone()));
            devices.insert(device.usn.clone(), device);
            event
        };
        match event {
            Some(event) => {
                self.emit(event);
                true
            }
            None => false,
        }
    }

    /// Remove a device by USN, emitting [`DeviceEvent::Removed`] if it was
    /// present. Unknown USNs are ignored, so repeated `ssdp:byebye`
    /// notifications emit at most one event.
    pub fn remove(&self, usn: &str) -> Option<Device> {
        let removed = {
            let mut devices = self.lock();
            devices.remove(usn)
        };
        if let Some(device) = &removed {
            info!(usn = %device.usn, "device left");
            self.emit(DeviceEvent::Removed(device.clone()));
        }
        removed
    }

    /// Snapshot of all currently known devices.
    pub fn snapshot(&self) -> Vec<Device> {
        self.lock().values().cloned().collect()
    }

    /// Number of currently known devices.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The map holds only plain data, so a poisoned lock is still usable;
    /// the receive loops must keep running after a panicked holder.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Device>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: DeviceEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("event channel disconnected");
            }
        }
    }
}
