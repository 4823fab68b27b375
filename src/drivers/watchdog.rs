//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the main loop stalls.
//! A tick can legitimately block for two full delivery deadlines, so the
//! timeout is sized from [`LinkConfig::worst_case_tick_ms`] rather than
//! fixed.
//!
//! The main loop must call `feed()` on every tick.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use esp_idf_svc::sys::*;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use log::info;

use crate::config::LinkConfig;

/// Slack added on top of the worst-case tick.
const MARGIN_MS: u32 = 5_000;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    subscribed: bool,
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(config: &LinkConfig) -> Self {
        let timeout_ms = Self::timeout_for(config);

        #[cfg(all(target_os = "espidf", feature = "espidf"))]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK as i32 {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK as i32;
                if subscribed {
                    info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self {
                    timeout_ms,
                    subscribed,
                }
            }
        }

        #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
        {
            log::info!("Watchdog(sim): no-op ({} ms)", timeout_ms);
            Self { timeout_ms }
        }
    }

    pub fn timeout_for(config: &LinkConfig) -> u32 {
        config
            .worst_case_tick_ms()
            .saturating_add(config.tick_interval_ms)
            .saturating_add(MARGIN_MS)
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Feed the watchdog. Must be called at least once per timeout.
    pub fn feed(&self) {
        #[cfg(all(target_os = "espidf", feature = "espidf"))]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
