//! One-shot GPIO initialisation.
//!
//! Configures pin directions and pulls using raw ESP-IDF sys calls.  Called
//! from `main()` before the role is read and again once the role is known.
//! On the host these become in-memory simulations so drivers built on top
//! of them stay testable.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use esp_idf_svc::sys::*;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use log::info;

use crate::control::RelayState;
use crate::pins;
use crate::role::Role;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("GPIO configuration failed")
    }
}

// ── Pin modes ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    InputPullUp,
    Output,
}

/// Configure the role strap as an input with pull-up.
pub fn init_role_pin() -> Result<(), HwInitError> {
    configure(pins::ROLE_GPIO, PinMode::InputPullUp)
}

/// Configure the functional pin for `role`.  On the Responder the level is
/// written before the pin becomes an output, so the relay never glitches
/// away from `safe_state` during boot.
pub fn init_functional_pin(role: Role, safe_state: RelayState) -> Result<(), HwInitError> {
    match role {
        Role::Initiator => configure(pins::FUNCTIONAL_GPIO, PinMode::InputPullUp),
        Role::Responder => {
            gpio_write(pins::FUNCTIONAL_GPIO, safe_state.is_on());
            configure(pins::FUNCTIONAL_GPIO, PinMode::Output)
        }
    }
}

/// Configure the radio's chip-enable as an output, held LOW (standby).
pub fn init_radio_ce_pin() -> Result<(), HwInitError> {
    gpio_write(pins::RADIO_CE_GPIO, false);
    configure(pins::RADIO_CE_GPIO, PinMode::Output)
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
fn configure(gpio: i32, mode: PinMode) -> Result<(), HwInitError> {
    let (dir, pull_up) = match mode {
        PinMode::InputPullUp => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_ENABLE),
        PinMode::Output => (gpio_mode_t_GPIO_MODE_OUTPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
    };
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << gpio,
        mode: dir,
        pull_up_en: pull_up,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        ..Default::default()
    };
    // SAFETY: Called from the single main task during setup.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: GPIO{} configured as {:?}", gpio, mode);
    Ok(())
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
fn configure(gpio: i32, mode: PinMode) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): GPIO{} as {:?}", gpio, mode);
    if mode == PinMode::InputPullUp {
        sim::set_level(gpio, true);
    }
    Ok(())
}

// ── GPIO access ───────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn gpio_read(gpio: i32) -> bool {
    // SAFETY: Level register read; pin configured in init.
    unsafe { gpio_get_level(gpio) != 0 }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn gpio_write(gpio: i32, high: bool) {
    // SAFETY: Level register write; only the main task drives outputs.
    unsafe {
        gpio_set_level(gpio, u32::from(high));
    }
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn gpio_read(gpio: i32) -> bool {
    sim::level(gpio)
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn gpio_write(gpio: i32, high: bool) {
    sim::set_level(gpio, high);
}

/// Host-side pin levels, one bit per GPIO.
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub mod sim {
    use core::sync::atomic::{AtomicU64, Ordering};

    static LEVELS: AtomicU64 = AtomicU64::new(0);

    pub fn level(gpio: i32) -> bool {
        LEVELS.load(Ordering::Acquire) & (1u64 << gpio) != 0
    }

    /// Force a level, e.g. to emulate a strap or a switch in simulation.
    pub fn set_level(gpio: i32, high: bool) {
        if high {
            LEVELS.fetch_or(1u64 << gpio, Ordering::AcqRel);
        } else {
            LEVELS.fetch_and(!(1u64 << gpio), Ordering::AcqRel);
        }
    }
}
