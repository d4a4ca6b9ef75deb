//! Error type shared by all Wraith Prism operations.

use std::fmt::{self, Display, Formatter};

/// Wraith Prism errors.
///
/// Transport variants are fatal for the call that produced them and are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrismError {
    /// No HID device matched the configured IDs and interface.
    NotFound,
    /// The HID device was found but could not be opened.
    OpenFailed(String),
    /// Writing a report or reading the reply failed.
    TransactFailed(String),
    /// Reply was shorter than the fields that had to be read from it.
    ShortReply { expected: usize, actual: usize },
    /// Request payload does not fit into a single report.
    FrameTooLong { len: usize, max: usize },
    /// Reply mode byte matched no catalog entry.
    UnknownMode { channel: u8, code: u8 },
    /// Text contains a character without a morse representation.
    UnsupportedCharacter(char),
    /// Device payload contains a dot/dash group without a character.
    UnknownMorseSequence(String),
    /// Encoded morse payload exceeds the device's storage.
    MorseTooLong { len: usize, max: usize },
    /// Mirage frequency outside of the range the device can encode.
    InvalidFrequency(u16),
}

impl Display for PrismError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Wraith Prism device not found"),
            Self::OpenFailed(err) => write!(f, "unable to open device: {err}"),
            Self::TransactFailed(err) => write!(f, "transaction failed: {err}"),
            Self::ShortReply { expected, actual } => {
                write!(f, "reply too short: expected {expected} bytes, got {actual}")
            },
            Self::FrameTooLong { len, max } => {
                write!(f, "frame of {len} bytes exceeds report size of {max} bytes")
            },
            Self::UnknownMode { channel, code } => {
                write!(f, "unknown mode 0x{code:02x} on channel 0x{channel:02x}")
            },
            Self::UnsupportedCharacter(c) => write!(f, "unsupported morse character: {c:?}"),
            Self::UnknownMorseSequence(seq) => write!(f, "unknown morse sequence: {seq:?}"),
            Self::MorseTooLong { len, max } => {
                write!(f, "morse payload of {len} bytes exceeds maximum of {max} bytes")
            },
            Self::InvalidFrequency(freq) => write!(f, "unsupported mirage frequency: {freq} Hz"),
        }
    }
}

impl std::error::Error for PrismError {}

impl From<hidapi::HidError> for PrismError {
    fn from(err: hidapi::HidError) -> Self {
        Self::TransactFailed(err.to_string())
    }
}

/// Crate-level Result alias using [`PrismError`].
pub type Result<T> = std::result::Result<T, PrismError>;
