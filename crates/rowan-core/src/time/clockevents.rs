//! Clock event device management and the periodic tick.

use crate::sync::IrqSpinLock;

use super::jiffies::{JIFFIES, Jiffies};

/// A hardware timer that can be programmed to fire one event.
pub trait ClockEventDevice: Sync {
    /// Human-readable device name for diagnostics.
    fn name(&self) -> &'static str;

    /// Programs the next event `delta` device ticks from now.
    ///
    /// "Now" is the device's free-running counter at call time, not the
    /// previously programmed deadline. If an event interrupt is served
    /// late the following period is still a full `delta` long; the tick
    /// drifts rather than bursting to catch up.
    fn set_next_event(&self, delta: u32);
}

/// Tick bookkeeping for the active clock event device.
pub struct ClockEvents {
    device: Option<&'static dyn ClockEventDevice>,
    period: u32,
}

impl ClockEvents {
    /// Creates the bookkeeping with no device registered.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            device: None,
            period: 0,
        }
    }

    /// Registers `device` as the tick source and programs the first
    /// event one full period out.
    pub fn config_and_register(&mut self, device: &'static dyn ClockEventDevice, period: u32) {
        self.device = Some(device);
        self.period = period;
        device.set_next_event(period);
    }

    /// Handles one expired event: advances `jiffies` and programs the
    /// next event. No-op if no device is registered.
    pub fn tick(&self, jiffies: &Jiffies) {
        let Some(device) = self.device else {
            return;
        };
        jiffies.advance(1);
        device.set_next_event(self.period);
    }

    /// Name of the registered device, if any.
    #[must_use]
    pub fn device_name(&self) -> Option<&'static str> {
        self.device.map(ClockEventDevice::name)
    }

    /// The configured tick period in device ticks.
    #[must_use]
    pub fn period(&self) -> u32 {
        self.period
    }
}

impl Default for ClockEvents {
    fn default() -> Self {
        Self::new()
    }
}

static CLOCKEVENTS: IrqSpinLock<ClockEvents> = IrqSpinLock::new(ClockEvents::new());

/// Registers `device` as the global tick source with the given period.
pub fn config_and_register(device: &'static dyn ClockEventDevice, period: u32) {
    CLOCKEVENTS.lock().config_and_register(device, period);
}

/// Drives the global tick from the timer interrupt handler.
pub fn handle_event() {
    CLOCKEVENTS.lock().tick(&JIFFIES);
}

/// Name of the globally registered tick device, if any.
pub fn active_device_name() -> Option<&'static str> {
    CLOCKEVENTS.lock().device_name()
}
