//! Raw-GPIO pin handles exposed through the embedded-hal digital traits.
//!
//! The link protocol takes `InputPin` / `OutputPin`; these handles back
//! them with the [`hw_init`](super::hw_init) register helpers so the same
//! pin numbers from [`crate::pins`] are used everywhere.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use super::hw_init;

/// A GPIO configured by [`hw_init`]. Reads and writes cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioPin {
    gpio: i32,
}

impl GpioPin {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub const fn gpio(&self) -> i32 {
        self.gpio
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(hw_init::gpio_read(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!hw_init::gpio_read(self.gpio))
    }
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}
