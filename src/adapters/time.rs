//! ESP32 time adapter.
//!
//! Provides monotonic time and the blocking sleep the link protocol uses for
//! backoff and ack polling.
//!
//! - **`target_os = "espidf"` with the `espidf` feature** — wraps
//!   `esp_timer_get_time()` (microsecond precision, monotonic) and sleeps
//!   through FreeRTOS `vTaskDelay` so other tasks, including the idle task
//!   the watchdog watches, keep running.
//! - **otherwise** — uses `std::time::Instant` and `std::thread::sleep`
//!   for host-side simulation.

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for Esp32TimeAdapter {
    /// Microseconds since boot (monotonic).
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since adapter creation (monotonic).
    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl DelayNs for Esp32TimeAdapter {
    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1000));
    }

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }

    #[cfg(all(target_os = "espidf", feature = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(all(target_os = "espidf", feature = "espidf")))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}
