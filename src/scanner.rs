//! # Bus Discovery
//!
//! Probes the I2C address space until at least one device answers or the
//! configured deadline passes. The station cannot run without a sensor
//! address, so a timeout here is fatal to startup; there is no degraded
//! mode.

use core::fmt::Write as _;

use embassy_time::{Duration, Instant, Timer};
use embedded_hal_async::i2c::I2c;
use heapless::{String, Vec};
use log::{error, info};

use crate::error::ScanError;

/// First address probed. 0x00–0x02 are reserved by the I2C spec.
pub const FIRST_ADDRESS: u8 = 0x03;
/// Last address probed (exclusive of the reserved 0x78–0x7F block).
pub const LAST_ADDRESS: u8 = 0x77;

/// Upper bound on reported devices per sweep.
pub const MAX_DEVICES: usize = 16;

/// Pause between two sweeps of an empty bus.
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Sweeps the bus until at least one device is found, retrying every second
/// up to `timeout`.
///
/// On success the discovered addresses are logged in hexadecimal and
/// returned; the set is deduplicated by construction since each address is
/// probed once per sweep. On timeout the error is logged and returned for
/// the caller to treat as fatal.
pub async fn discover<I2C: I2c>(
    i2c: &mut I2C,
    timeout: Duration,
) -> Result<Vec<u8, MAX_DEVICES>, ScanError> {
    let deadline = Instant::now() + timeout;
    loop {
        let found = sweep(i2c).await;
        if !found.is_empty() {
            log_addresses(&found);
            return Ok(found);
        }
        if Instant::now() >= deadline {
            error!("timeout: no devices found on the bus");
            return Err(ScanError::DiscoveryTimeout);
        }
        Timer::after(RETRY_INTERVAL).await;
    }
}

/// One pass over the probe range. A device is present wherever a one-byte
/// read transaction is acknowledged.
async fn sweep<I2C: I2c>(i2c: &mut I2C) -> Vec<u8, MAX_DEVICES> {
    let mut found = Vec::new();
    for address in FIRST_ADDRESS..=LAST_ADDRESS {
        let mut probe = [0u8; 1];
        if i2c.write_read(address, &[], &mut probe).await.is_ok()
            && found.push(address).is_err()
        {
            break;
        }
    }
    found
}

fn log_addresses(found: &Vec<u8, MAX_DEVICES>) {
    let mut line: String<128> = String::new();
    for address in found {
        let _ = write!(line, "0x{:02x}; ", address);
    }
    info!(
        "I2C device addresses found: {}",
        line.trim_end_matches("; ")
    );
}

#[cfg(test)]
mod tests {
    use std::vec::Vec as StdVec;

    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use futures::executor::block_on;

    use super::*;

    #[derive(Debug)]
    struct ProbeError;

    impl embedded_hal::i2c::Error for ProbeError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Bus double that acknowledges a fixed set of addresses.
    struct FixedBus {
        present: StdVec<u8>,
        probes: usize,
    }

    impl FixedBus {
        fn new(present: &[u8]) -> Self {
            Self {
                present: present.to_vec(),
                probes: 0,
            }
        }
    }

    impl ErrorType for FixedBus {
        type Error = ProbeError;
    }

    impl I2c for FixedBus {
        async fn transaction(
            &mut self,
            address: u8,
            _operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.probes += 1;
            if self.present.contains(&address) {
                Ok(())
            } else {
                Err(ProbeError)
            }
        }
    }

    #[test]
    fn discover_returns_all_answering_addresses() {
        let mut bus = FixedBus::new(&[0x3C, 0x61]);
        let found = block_on(discover(&mut bus, Duration::from_secs(5))).unwrap();
        assert_eq!(found.as_slice(), &[0x3C, 0x61]);
    }

    #[test]
    fn empty_bus_times_out_fatally() {
        let mut bus = FixedBus::new(&[]);
        // A deadline that is already past once the first sweep completes:
        // discovery must fail without waiting out a retry interval.
        let started = Instant::now();
        let result = block_on(discover(&mut bus, Duration::from_ticks(0)));
        assert_eq!(result, Err(ScanError::DiscoveryTimeout));
        assert!(started.elapsed() < RETRY_INTERVAL);
        // The whole probe range was swept at least once before giving up.
        assert!(bus.probes >= (LAST_ADDRESS - FIRST_ADDRESS + 1) as usize);
    }
}
