//! # SCD30 Driver
//!
//! Minimal async driver for the Sensirion SCD30 CO2/temperature/humidity
//! sensor, covering the command set the station needs: continuous
//! measurement control, the data-ready status word and the measurement
//! frame. Every word on the wire carries a CRC-8 which is verified on read.
//!
//! Command values and framing follow the Sensirion interface description;
//! readings arrive as big-endian `f32`s.

use embassy_time::{Duration, Timer};
use embedded_hal_async::i2c::I2c;

use crate::sample::Sample;
use crate::sensor::SensorDriver;

/// Factory-default I2C address of the SCD30.
pub const DEFAULT_ADDRESS: u8 = 0x61;

/// Pause between a command write and the corresponding read. The sensor
/// needs time to populate its output buffer.
const READ_DELAY: Duration = Duration::from_millis(3);

const CMD_TRIGGER_CONTINUOUS: u16 = 0x0010;
const CMD_STOP_CONTINUOUS: u16 = 0x0104;
const CMD_SET_INTERVAL: u16 = 0x4600;
const CMD_DATA_READY: u16 = 0x0202;
const CMD_READ_MEASUREMENT: u16 = 0x0300;
const CMD_SOFT_RESET: u16 = 0xD304;

/// Errors produced by the SCD30 driver.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scd30Error<E> {
    /// The underlying bus transaction failed.
    I2c(E),
    /// A received word failed its CRC check.
    Crc,
}

/// SCD30 driver over any async I2C bus.
pub struct Scd30<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Scd30<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Creates a driver at the factory-default address.
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Creates a driver at a discovered address.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Sets the measurement interval and starts continuous measurement.
    ///
    /// The sensor accepts intervals of 2..=1800 seconds; `pressure_mbar` of
    /// zero disables ambient pressure compensation.
    pub async fn start_continuous(
        &mut self,
        interval_secs: u16,
        pressure_mbar: u16,
    ) -> Result<(), Scd30Error<E>> {
        self.command_with_arg(CMD_SET_INTERVAL, interval_secs).await?;
        self.command_with_arg(CMD_TRIGGER_CONTINUOUS, pressure_mbar)
            .await
    }

    /// Stops continuous measurement.
    pub async fn stop_continuous(&mut self) -> Result<(), Scd30Error<E>> {
        self.command(CMD_STOP_CONTINUOUS).await
    }

    /// Issues a soft reset.
    pub async fn soft_reset(&mut self) -> Result<(), Scd30Error<E>> {
        self.command(CMD_SOFT_RESET).await
    }

    async fn command(&mut self, cmd: u16) -> Result<(), Scd30Error<E>> {
        let bytes = cmd.to_be_bytes();
        self.i2c
            .write(self.address, &bytes)
            .await
            .map_err(Scd30Error::I2c)
    }

    async fn command_with_arg(&mut self, cmd: u16, arg: u16) -> Result<(), Scd30Error<E>> {
        let cmd = cmd.to_be_bytes();
        let arg_bytes = arg.to_be_bytes();
        let frame = [cmd[0], cmd[1], arg_bytes[0], arg_bytes[1], crc8(&arg_bytes)];
        self.i2c
            .write(self.address, &frame)
            .await
            .map_err(Scd30Error::I2c)
    }

    async fn read_response(&mut self, cmd: u16, buf: &mut [u8]) -> Result<(), Scd30Error<E>> {
        self.command(cmd).await?;
        Timer::after(READ_DELAY).await;
        self.i2c
            .read(self.address, buf)
            .await
            .map_err(Scd30Error::I2c)
    }
}

impl<I2C, E> SensorDriver for Scd30<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = Scd30Error<E>;

    async fn data_ready(&mut self) -> Result<bool, Self::Error> {
        let mut buf = [0u8; 3];
        self.read_response(CMD_DATA_READY, &mut buf).await?;
        Ok(checked_word(&buf)? == 1)
    }

    async fn read(&mut self) -> Result<Sample, Self::Error> {
        let mut buf = [0u8; 18];
        self.read_response(CMD_READ_MEASUREMENT, &mut buf).await?;
        let co2_ppm = checked_f32(&buf[0..6])?;
        let temperature_c = checked_f32(&buf[6..12])?;
        let relative_humidity_pct = checked_f32(&buf[12..18])?;
        // The sensor reports CO2 as a float; the data model carries whole
        // ppm. The saturating cast also floors warm-up negatives at zero.
        Ok(Sample::new(
            co2_ppm as u16,
            temperature_c,
            relative_humidity_pct,
        ))
    }
}

/// CRC-8 as used by Sensirion sensors: polynomial 0x31, init 0xFF.
fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0xFFu8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Validates one `[msb, lsb, crc]` word.
fn checked_word<E>(word: &[u8]) -> Result<u16, Scd30Error<E>> {
    if crc8(&word[0..2]) != word[2] {
        return Err(Scd30Error::Crc);
    }
    Ok(u16::from_be_bytes([word[0], word[1]]))
}

/// Assembles an `f32` from two CRC-protected words.
fn checked_f32<E>(words: &[u8]) -> Result<f32, Scd30Error<E>> {
    let high = checked_word(&words[0..3])?;
    let low = checked_word(&words[3..6])?;
    let bits = ((high as u32) << 16) | low as u32;
    Ok(f32::from_bits(bits))
}
