//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing device events through the `log`
//! facade.  A UI or metrics adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::DeviceEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DeviceEvent`], tagged with the robot it came from.
pub struct LogEventSink {
    device: String,
}

impl LogEventSink {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DeviceEvent) {
        match event {
            DeviceEvent::Connected { name } => {
                info!("SESSION | {} | connected as {:?}", self.device, name);
            }
            DeviceEvent::ConnectFailed(e) => {
                warn!("SESSION | {} | connect failed: {}", self.device, e);
            }
            DeviceEvent::Disconnected => {
                info!("SESSION | {} | disconnected", self.device);
            }
            DeviceEvent::Telemetry(t) => {
                debug!(
                    "TELEM | {} | keys={} signal={} dock={} bin={}",
                    self.device, t.count, t.signal, t.dock, t.bin
                );
            }
            DeviceEvent::CommandSent(name) => {
                info!("CMD | {} | -> {}", self.device, name);
            }
        }
    }
}
