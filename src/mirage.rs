//! Fan mirage effect.
//!
//! Mirage blinks the fan LEDs at a separate frequency per color channel, layered on top of
//! the fan's regular mode. The firmware has no getter for it.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{PrismError, Result};
use crate::protocol::{CMD_WRITE, TARGET_MIRAGE};

/// Device clock divided by the blink frequency.
const CLOCK: f64 = 187_498.;

/// Frequency bytes disabling mirage for a channel.
const OFF_BYTES: [u8; 3] = [0x00, 0xff, 0x4a];

/// Mirage state of the fan.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum MirageState {
    #[default]
    Off,
    /// Blink frequencies in Hz.
    On { red: u16, green: u16, blue: u16 },
}

impl MirageState {
    /// State applied when resetting the device.
    pub const DEFAULT: MirageState = MirageState::On { red: 330, green: 330, blue: 330 };

    /// Command pushing this state to the device.
    pub fn frame(&self) -> Result<Bytes> {
        let channels = match *self {
            Self::Off => [OFF_BYTES; 3],
            Self::On { red, green, blue } => {
                [frequency_bytes(red)?, frequency_bytes(green)?, frequency_bytes(blue)?]
            },
        };

        let mut buf = BytesMut::with_capacity(20);
        buf.put_slice(&[CMD_WRITE, TARGET_MIRAGE, 0x00, 0x00]);

        // Channel 1 is always disabled.
        buf.put_slice(&[0x01, 0x00, 0xff, 0x4a]);

        for (channel, bytes) in (2..).zip(channels.iter()) {
            buf.put_u8(channel);
            buf.put_slice(bytes);
        }

        Ok(buf.freeze())
    }
}

/// Convert a blink frequency to the device's `[multiplicand, fraction, divisor]` bytes.
pub fn frequency_bytes(freq_hz: u16) -> Result<[u8; 3]> {
    if freq_hz == 0 {
        return Err(PrismError::InvalidFrequency(freq_hz));
    }

    let initial = CLOCK / f64::from(freq_hz);
    let multiplicand = (initial / 256.).floor();
    if multiplicand > f64::from(u8::MAX) {
        return Err(PrismError::InvalidFrequency(freq_hz));
    }

    let remainder = initial / (multiplicand + 1.);

    Ok([multiplicand as u8, (remainder.fract() * 256.).floor() as u8, remainder.floor() as u8])
}
