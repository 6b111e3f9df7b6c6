//! Clock generator (C2): portable frequency/prescaler arithmetic.
//!
//! The prescaler-selection algorithm and the frequency contract live here,
//! as pure functions over plain integers, so they're unit-testable on the
//! host without a [`Platform`](crate::platform::Platform). Only the act of
//! writing the chosen `(prescaler, top)` pair into timer registers is
//! platform-specific, and lives in the platform crate.

use crate::error::ConfigError;
use crate::platform::{ClockTimer, ControlLines};
use crate::tuning::{FREQ_MAX, FREQ_MIN};

/// The ordered set of prescalers a fast-PWM 16-bit timer supports.
pub const PRESCALERS: [u16; 5] = [1, 8, 64, 256, 1024];

/// Choose the smallest prescaler for which `top` fits a 16-bit register.
///
/// `host_hz = prescaler * (top + 1) * target_hz`, solved for the smallest
/// `top` (and hence the least PWM jitter) at each prescaler in turn. Returns
/// `None` if no prescaler in [`PRESCALERS`] keeps `top` within `u16`.
#[must_use]
pub fn choose_prescaler(host_hz: u32, target_hz: u32) -> Option<(u16, u16)> {
    for &prescaler in &PRESCALERS {
        let divisor = u64::from(prescaler) * u64::from(target_hz);
        if divisor == 0 {
            continue;
        }
        let top_plus_one = u64::from(host_hz) / divisor;
        if top_plus_one == 0 {
            continue;
        }
        let top = top_plus_one - 1;
        if top <= u64::from(u16::MAX) {
            return Some((prescaler, top as u16));
        }
    }
    None
}

/// Clock generator state (C2), portable across platforms.
#[derive(Debug, Clone, Copy)]
pub struct ClockState {
    target_hz: u32,
    prescaler: u16,
    top: u16,
    running: bool,
}

impl ClockState {
    /// An unconfigured clock: zero frequency, stopped, no prescaler chosen.
    /// Holds this place until [`init`](Self::init) is called.
    #[must_use]
    pub const fn uninitialized() -> Self {
        Self { target_hz: 0, prescaler: 0, top: 0, running: false }
    }

    /// Compute the `(prescaler, top)` pair for `hz`, without touching any
    /// platform. Fails if `hz` is out of range or unrealisable.
    fn resolve(host_hz: u32, hz: u32) -> Result<(u16, u16), ConfigError> {
        if !(FREQ_MIN..=FREQ_MAX).contains(&hz) {
            return Err(ConfigError::FrequencyOutOfRange { requested_hz: hz });
        }
        choose_prescaler(host_hz, hz)
            .ok_or(ConfigError::FrequencyUnrealisable { requested_hz: hz })
    }

    /// `init(hz)`: choose prescaler/top, configure fast-PWM 50% duty, start
    /// the timer, and connect the output pin.
    pub fn init<P: ClockTimer>(platform: &mut P, hz: u32) -> Result<Self, ConfigError> {
        let (prescaler, top) = Self::resolve(platform.host_hz(), hz)?;
        platform.apply(prescaler, top);
        platform.connect_output();
        Ok(Self { target_hz: hz, prescaler, top, running: true })
    }

    /// Reconnect the timer output to the pin.
    pub fn start<P: ClockTimer>(&mut self, platform: &mut P) {
        platform.connect_output();
        self.running = true;
    }

    /// Disconnect the timer output from the pin, driving it low. The timer
    /// keeps running internally.
    pub fn stop<P: ClockTimer>(&mut self, platform: &mut P) {
        platform.disconnect_output();
        self.running = false;
    }

    /// Recompute prescaler/top for `hz` and reapply, preserving the prior
    /// running/stopped state. A no-op if `hz` already equals `target_hz`.
    pub fn set_frequency<P: ClockTimer>(
        &mut self,
        platform: &mut P,
        hz: u32,
    ) -> Result<(), ConfigError> {
        if hz == self.target_hz {
            return Ok(());
        }
        let (prescaler, top) = Self::resolve(platform.host_hz(), hz)?;
        platform.apply(prescaler, top);
        self.target_hz = hz;
        self.prescaler = prescaler;
        self.top = top;
        if self.running {
            platform.connect_output();
        } else {
            platform.disconnect_output();
        }
        Ok(())
    }

    /// Manually emit one low→high→low transition. Only valid while stopped.
    pub fn single_step<P: ClockTimer>(&self, platform: &mut P) -> Result<(), ConfigError> {
        if self.running {
            return Err(ConfigError::ClockRunning);
        }
        platform.manual_pulse();
        Ok(())
    }

    /// The currently configured frequency in Hz.
    #[must_use]
    pub const fn frequency(&self) -> u32 {
        self.target_hz
    }

    /// Whether the timer output is connected to the pin.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The derived prescaler, for diagnostics.
    #[must_use]
    pub const fn prescaler(&self) -> u16 {
        self.prescaler
    }

    /// The derived timer top value, for diagnostics.
    #[must_use]
    pub const fn top(&self) -> u16 {
        self.top
    }
}

/// Compute a pulse width, in microseconds, for [`ControlLines::pulse_nmi`] /
/// [`ControlLines::pulse_int`], floored at `MIN_PULSE_US`.
///
/// One Z80 clock period is `1_000_000 / frequency_hz` microseconds; a pulse
/// shorter than one period would not be reliably observed, so this floors at
/// the tuning constant regardless of how fast the clock is running.
#[must_use]
pub fn pulse_width_us(frequency_hz: u32) -> u32 {
    if frequency_hz == 0 {
        return crate::tuning::MIN_PULSE_US;
    }
    let period_us = 1_000_000 / frequency_hz;
    period_us.max(crate::tuning::MIN_PULSE_US)
}

impl Default for ClockState {
    fn default() -> Self {
        Self::uninitialized()
    }
}
