//! Channel status reply.

use crate::component::Rgb;
use crate::error::{PrismError, Result};

/// Offset of the last field read from a channel reply.
const LAST_FIELD: usize = 12;

/// Read-only view over the device's reply to a channel read request.
#[derive(Debug, Copy, Clone)]
pub struct ChannelReply<'a> {
    bytes: &'a [u8],
}

impl<'a> ChannelReply<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() <= LAST_FIELD {
            return Err(PrismError::ShortReply { expected: LAST_FIELD + 1, actual: bytes.len() });
        }

        Ok(Self { bytes })
    }

    pub fn channel(&self) -> u8 {
        self.bytes[4]
    }

    pub fn speed(&self) -> u8 {
        self.bytes[5]
    }

    pub fn color_source(&self) -> u8 {
        self.bytes[6]
    }

    pub fn mode(&self) -> u8 {
        self.bytes[7]
    }

    pub fn brightness(&self) -> u8 {
        self.bytes[9]
    }

    pub fn color(&self) -> Rgb {
        Rgb { r: self.bytes[10], g: self.bytes[11], b: self.bytes[12] }
    }
}
