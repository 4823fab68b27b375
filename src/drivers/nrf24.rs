//! nRF24L01+ transceiver driver.
//!
//! Register-level driver over an embedded-hal [`SpiDevice`] plus the CE
//! line.  It implements [`RadioLink`] with the chip's Enhanced ShockBurst
//! features doing the heavy lifting: hardware auto-ack with automatic
//! retransmit, dynamic payload width, and ack payloads.
//!
//! ## Fixed radio setup
//!
//! | Setting          | Value                          |
//! |------------------|--------------------------------|
//! | Data rate        | 2 Mbps                         |
//! | PA level         | max (0 dBm)                    |
//! | CRC              | 8-bit                          |
//! | Auto-retransmit  | 15 × 1500 µs                   |
//! | Payloads         | dynamic width, ack payloads on |
//!
//! Writing uses pipe 0 (RX_ADDR_P0 mirrors TX_ADDR so the auto-ack comes
//! back); the peer is heard on pipe 1.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::{info, warn};

use crate::app::ports::RadioLink;
use crate::config::ADDRESS_WIDTH;

/// Largest payload the FIFO holds.
pub const MAX_PAYLOAD: usize = 32;

/// Give up on TX_DS / MAX_RT after this long (µs).
const TX_TIMEOUT_US: u32 = 95_000;
const TX_POLL_US: u32 = 100;

mod cmd {
    pub const R_REGISTER: u8 = 0x00;
    pub const W_REGISTER: u8 = 0x20;
    pub const R_RX_PL_WID: u8 = 0x60;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    pub const W_ACK_PAYLOAD: u8 = 0xA8;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const ACTIVATE: u8 = 0x50;
    pub const NOP: u8 = 0xFF;
}

mod reg {
    pub const CONFIG: u8 = 0x00;
    pub const EN_AA: u8 = 0x01;
    pub const EN_RXADDR: u8 = 0x02;
    pub const SETUP_AW: u8 = 0x03;
    pub const SETUP_RETR: u8 = 0x04;
    pub const RF_CH: u8 = 0x05;
    pub const RF_SETUP: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const RX_ADDR_P0: u8 = 0x0A;
    pub const TX_ADDR: u8 = 0x10;
    pub const FIFO_STATUS: u8 = 0x17;
    pub const DYNPD: u8 = 0x1C;
    pub const FEATURE: u8 = 0x1D;
}

// CONFIG
const EN_CRC: u8 = 1 << 3;
const PWR_UP: u8 = 1 << 1;
const PRIM_RX: u8 = 1 << 0;
// STATUS
const RX_DR: u8 = 1 << 6;
const TX_DS: u8 = 1 << 5;
const MAX_RT: u8 = 1 << 4;
// FIFO_STATUS
const RX_EMPTY: u8 = 1 << 0;
// RF_SETUP: RF_DR_HIGH | RF_PWR = 0b11
const RF_SETUP_2MBPS_MAX_PA: u8 = (1 << 3) | 0b110;
// FEATURE
const EN_DPL: u8 = 1 << 2;
const EN_ACK_PAY: u8 = 1 << 1;
// SETUP_RETR: ARD = 5 (1500 µs), ARC = 15
const RETRIES_1500US_X15: u8 = (5 << 4) | 15;
// SETUP_AW: 5-byte addresses
const AW_5_BYTES: u8 = 0b11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nrf24Error<S, P> {
    Spi(S),
    Pin(P),
    /// Payload longer than [`MAX_PAYLOAD`].
    PayloadTooLarge,
    /// Pipe number outside 0..=5.
    BadPipe,
    /// Address is not [`ADDRESS_WIDTH`] bytes.
    BadAddress,
    /// The chip did not read back a written register, or never finished a TX.
    NotResponding,
}

pub struct Nrf24<SPI, CE, D> {
    spi: SPI,
    ce: CE,
    delay: D,
    config: u8,
    pipe0_rx: Option<[u8; ADDRESS_WIDTH]>,
}

type Res<T, SPI, CE> =
    Result<T, Nrf24Error<<SPI as embedded_hal::spi::ErrorType>::Error, <CE as embedded_hal::digital::ErrorType>::Error>>;

impl<SPI, CE, D> Nrf24<SPI, CE, D>
where
    SPI: SpiDevice,
    CE: OutputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, ce: CE, delay: D) -> Self {
        Self {
            spi,
            ce,
            delay,
            config: EN_CRC,
            pipe0_rx: None,
        }
    }

    /// Bring the chip to powered-up standby with the fixed radio setup.
    pub fn init(&mut self, channel: u8) -> Res<(), SPI, CE> {
        self.ce.set_low().map_err(Nrf24Error::Pin)?;
        self.delay.delay_ms(5);

        self.write_reg(reg::SETUP_RETR, RETRIES_1500US_X15)?;
        if self.read_reg(reg::SETUP_RETR)? != RETRIES_1500US_X15 {
            return Err(Nrf24Error::NotResponding);
        }
        self.write_reg(reg::SETUP_AW, AW_5_BYTES)?;
        self.write_reg(reg::RF_SETUP, RF_SETUP_2MBPS_MAX_PA)?;
        self.write_reg(reg::RF_CH, channel)?;

        self.write_reg(reg::FEATURE, EN_DPL | EN_ACK_PAY)?;
        if self.read_reg(reg::FEATURE)? == 0 {
            // Non-plus silicon keeps FEATURE locked until ACTIVATE.
            self.command(&mut [cmd::ACTIVATE, 0x73])?;
            self.write_reg(reg::FEATURE, EN_DPL | EN_ACK_PAY)?;
        }
        self.write_reg(reg::DYNPD, 0x3F)?;
        self.write_reg(reg::EN_AA, 0x3F)?;
        self.write_reg(reg::EN_RXADDR, 0)?;

        self.write_reg(reg::STATUS, RX_DR | TX_DS | MAX_RT)?;
        self.command(&mut [cmd::FLUSH_RX])?;
        self.command(&mut [cmd::FLUSH_TX])?;

        self.config = EN_CRC | PWR_UP;
        self.write_reg(reg::CONFIG, self.config)?;
        self.delay.delay_ms(5);
        info!("nRF24: ready on channel {} (2 Mbps, CRC8, ack payloads)", channel);
        Ok(())
    }

    // ── SPI primitives ────────────────────────────────────────

    /// Clock `buf` through the chip; returns the STATUS byte shifted out first.
    fn command(&mut self, buf: &mut [u8]) -> Res<u8, SPI, CE> {
        self.spi.transfer_in_place(buf).map_err(Nrf24Error::Spi)?;
        Ok(buf[0])
    }

    fn status(&mut self) -> Res<u8, SPI, CE> {
        self.command(&mut [cmd::NOP])
    }

    fn read_reg(&mut self, r: u8) -> Res<u8, SPI, CE> {
        let mut buf = [cmd::R_REGISTER | r, cmd::NOP];
        self.command(&mut buf)?;
        Ok(buf[1])
    }

    fn write_reg(&mut self, r: u8, value: u8) -> Res<(), SPI, CE> {
        self.command(&mut [cmd::W_REGISTER | r, value])?;
        Ok(())
    }

    fn write_address(&mut self, r: u8, address: &[u8]) -> Res<(), SPI, CE> {
        let mut buf = [0u8; 1 + ADDRESS_WIDTH];
        buf[0] = cmd::W_REGISTER | r;
        buf[1..1 + address.len()].copy_from_slice(address);
        self.command(&mut buf[..1 + address.len()])?;
        Ok(())
    }

    fn write_with_prefix(&mut self, prefix: u8, data: &[u8]) -> Res<(), SPI, CE> {
        if data.len() > MAX_PAYLOAD {
            return Err(Nrf24Error::PayloadTooLarge);
        }
        let mut buf = [0u8; 1 + MAX_PAYLOAD];
        buf[0] = prefix;
        buf[1..=data.len()].copy_from_slice(data);
        self.command(&mut buf[..=data.len()])?;
        Ok(())
    }

    fn rx_fifo_empty(&mut self) -> Res<bool, SPI, CE> {
        Ok(self.read_reg(reg::FIFO_STATUS)? & RX_EMPTY != 0)
    }

    fn set_rx_pipe_enabled(&mut self, pipe: u8, enabled: bool) -> Res<(), SPI, CE> {
        let mask = self.read_reg(reg::EN_RXADDR)?;
        let mask = if enabled {
            mask | (1 << pipe)
        } else {
            mask & !(1 << pipe)
        };
        self.write_reg(reg::EN_RXADDR, mask)
    }
}

impl<SPI, CE, D> RadioLink for Nrf24<SPI, CE, D>
where
    SPI: SpiDevice,
    CE: OutputPin,
    D: DelayNs,
{
    type Error = Nrf24Error<SPI::Error, CE::Error>;

    fn send(&mut self, payload: &[u8]) -> Result<bool, Self::Error> {
        self.write_with_prefix(cmd::W_TX_PAYLOAD, payload)?;
        self.ce.set_high().map_err(Nrf24Error::Pin)?;

        let mut waited_us = 0;
        let status = loop {
            let status = self.status()?;
            if status & (TX_DS | MAX_RT) != 0 {
                break status;
            }
            if waited_us >= TX_TIMEOUT_US {
                self.ce.set_low().map_err(Nrf24Error::Pin)?;
                self.command(&mut [cmd::FLUSH_TX])?;
                warn!("nRF24: TX never completed, chip not responding");
                return Err(Nrf24Error::NotResponding);
            }
            self.delay.delay_us(TX_POLL_US);
            waited_us += TX_POLL_US;
        };

        self.ce.set_low().map_err(Nrf24Error::Pin)?;
        self.write_reg(reg::STATUS, TX_DS | MAX_RT)?;
        if status & MAX_RT != 0 {
            self.command(&mut [cmd::FLUSH_TX])?;
            return Ok(false);
        }
        Ok(true)
    }

    fn available(&mut self) -> Result<Option<u8>, Self::Error> {
        if self.rx_fifo_empty()? {
            return Ok(None);
        }
        let pipe = (self.status()? >> 1) & 0x07;
        Ok((pipe <= 5).then_some(pipe))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut wid = [cmd::R_RX_PL_WID, cmd::NOP];
        self.command(&mut wid)?;
        let width = wid[1] as usize;
        if width > MAX_PAYLOAD {
            // Corrupt width; the datasheet requires discarding the FIFO.
            self.command(&mut [cmd::FLUSH_RX])?;
            self.write_reg(reg::STATUS, RX_DR)?;
            return Ok(0);
        }

        let mut frame = [cmd::NOP; 1 + MAX_PAYLOAD];
        frame[0] = cmd::R_RX_PAYLOAD;
        self.command(&mut frame[..=width])?;
        self.write_reg(reg::STATUS, RX_DR)?;

        let n = width.min(buf.len());
        buf[..n].copy_from_slice(&frame[1..=n]);
        Ok(n)
    }

    fn write_ack_payload(&mut self, pipe: u8, payload: &[u8]) -> Result<(), Self::Error> {
        if pipe > 5 {
            return Err(Nrf24Error::BadPipe);
        }
        self.write_with_prefix(cmd::W_ACK_PAYLOAD | pipe, payload)
    }

    fn is_ack_payload_available(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx_fifo_empty()?)
    }

    fn start_listening(&mut self) -> Result<(), Self::Error> {
        self.config |= PRIM_RX;
        self.write_reg(reg::CONFIG, self.config)?;
        self.write_reg(reg::STATUS, RX_DR | TX_DS | MAX_RT)?;
        self.ce.set_high().map_err(Nrf24Error::Pin)?;
        match self.pipe0_rx {
            Some(address) => self.write_address(reg::RX_ADDR_P0, &address)?,
            None => self.set_rx_pipe_enabled(0, false)?,
        }
        self.command(&mut [cmd::FLUSH_TX])?;
        Ok(())
    }

    fn stop_listening(&mut self) -> Result<(), Self::Error> {
        self.ce.set_low().map_err(Nrf24Error::Pin)?;
        self.delay.delay_us(100);
        self.command(&mut [cmd::FLUSH_TX])?;
        self.config &= !PRIM_RX;
        self.write_reg(reg::CONFIG, self.config)?;
        // Pipe 0 receives the auto-acks for our transmissions.
        self.set_rx_pipe_enabled(0, true)
    }

    fn open_writing_pipe(&mut self, address: &[u8]) -> Result<(), Self::Error> {
        if address.len() != ADDRESS_WIDTH {
            return Err(Nrf24Error::BadAddress);
        }
        self.write_address(reg::RX_ADDR_P0, address)?;
        self.write_address(reg::TX_ADDR, address)
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &[u8]) -> Result<(), Self::Error> {
        if pipe > 5 {
            return Err(Nrf24Error::BadPipe);
        }
        if address.len() != ADDRESS_WIDTH {
            return Err(Nrf24Error::BadAddress);
        }
        match pipe {
            0 => {
                let mut a = [0u8; ADDRESS_WIDTH];
                a.copy_from_slice(address);
                self.pipe0_rx = Some(a);
                self.write_address(reg::RX_ADDR_P0, address)?;
            }
            1 => self.write_address(reg::RX_ADDR_P0 + 1, address)?,
            // Pipes 2-5 share pipe 1's upper bytes; only the LSB is stored.
            _ => self.write_reg(reg::RX_ADDR_P0 + pipe, address[0])?,
        }
        self.set_rx_pipe_enabled(pipe, true)
    }
}
