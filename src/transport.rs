//! HID transport abstraction.

use bytes::{BufMut, Bytes, BytesMut};
use hidapi::{HidApi, HidDevice};
use log::{debug, trace};

use crate::error::{PrismError, Result};
use crate::protocol::{INTERFACE_NUMBER, PRODUCT_ID, REPORT_SIZE, VENDOR_ID};

/// Report ID prefixed to every report.
const REPORT_ID: u8 = 0x00;

/// Synchronous request/response channel to the device.
pub trait Transport {
    /// Size of every report, excluding the report ID.
    fn report_size(&self) -> usize {
        REPORT_SIZE
    }

    /// Write a complete report and read the device's reply.
    fn transceive(&mut self, report: &[u8]) -> Result<Vec<u8>>;

    /// Send a request payload padded with `filler` and return the reply.
    fn send(&mut self, payload: &[u8], filler: u8) -> Result<Vec<u8>> {
        let report = report(payload, filler, self.report_size())?;

        debug!("Sending {:02x?}", payload);
        let reply = self.transceive(&report)?;
        trace!("Received {:02x?}", reply);

        Ok(reply)
    }
}

/// Build a report from a request payload.
///
/// The payload is prefixed with the report ID and padded with `filler` to the report size.
pub fn report(payload: &[u8], filler: u8, report_size: usize) -> Result<Bytes> {
    if payload.len() > report_size {
        return Err(PrismError::FrameTooLong { len: payload.len(), max: report_size });
    }

    let mut buf = BytesMut::with_capacity(report_size + 1);

    // Report ID.
    buf.put_u8(REPORT_ID);

    buf.put_slice(payload);

    // Padding.
    buf.put_bytes(filler, report_size - payload.len());

    Ok(buf.freeze())
}

/// HID device selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HidConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface_number: i32,
    pub report_size: usize,
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
            interface_number: INTERFACE_NUMBER,
            report_size: REPORT_SIZE,
        }
    }
}

/// Transport backed by `hidapi`.
///
/// The device is closed when the transport is dropped.
pub struct HidTransport {
    device: HidDevice,
    report_size: usize,
}

impl HidTransport {
    /// Open the first device matching the configuration.
    pub fn open(config: &HidConfig) -> Result<Self> {
        let api = HidApi::new().map_err(|err| PrismError::OpenFailed(err.to_string()))?;

        let info = api
            .device_list()
            .find(|info| {
                info.vendor_id() == config.vendor_id
                    && info.product_id() == config.product_id
                    && info.interface_number() == config.interface_number
            })
            .ok_or(PrismError::NotFound)?;

        let device = info.open_device(&api).map_err(|err| {
            PrismError::OpenFailed(format!("{err} (root permissions or udev rule required)"))
        })?;

        debug!("Opened HID device {:?}", info.path());

        Ok(Self { device, report_size: config.report_size })
    }
}

impl Transport for HidTransport {
    fn report_size(&self) -> usize {
        self.report_size
    }

    fn transceive(&mut self, report: &[u8]) -> Result<Vec<u8>> {
        self.device.write(report)?;

        let mut reply = vec![0; self.report_size];
        let len = self.device.read(&mut reply)?;
        reply.truncate(len);

        Ok(reply)
    }
}

/// Simulated device for unit and integration tests.
#[doc(hidden)]
pub mod mock {
    use std::collections::HashMap;

    use super::*;
    use crate::component::{Frame, FRAME_LEN, MORSE_CHUNK_LEN};
    use crate::protocol::*;

    /// In-memory Wraith Prism.
    ///
    /// Stores written channel settings, channel assignment, morse slots and the enso flag, and
    /// answers read requests from them. Every report is recorded.
    #[derive(Debug)]
    pub struct MockPrism {
        /// Channel settings, keyed by channel.
        pub channels: HashMap<u8, Frame>,
        /// Logo, fan and ring channel.
        pub assignment: [u8; 3],
        /// Morse payload slots.
        pub morse_slots: [Vec<u8>; 4],
        pub enso: bool,
        pub firmware: String,
        /// Number of flash saves.
        pub saves: usize,
        /// Every report received, including the report ID.
        pub reports: Vec<Vec<u8>>,
        /// If set, every transaction fails.
        pub fail: bool,
        /// Command and target of requests which fail.
        pub fail_on: Option<(u8, u8)>,
    }

    impl Default for MockPrism {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockPrism {
        /// Device with breathing logo, static fan and rainbow ring.
        pub fn new() -> Self {
            let mut channels = HashMap::new();
            channels.insert(0x05, [0x05, 0x31, 0x20, 0x03, 0xff, 0x99, 0x00, 0x00, 0xff]);
            channels.insert(0x06, [0x06, 0x2c, 0x20, 0x01, 0xff, 0xff, 0x00, 0xff, 0x00]);
            channels.insert(0x07, [0x07, 0x64, 0x00, 0x05, 0xff, 0x99, 0x00, 0x00, 0x00]);

            Self {
                channels,
                assignment: [0x05, 0x06, 0x07],
                morse_slots: Default::default(),
                enso: false,
                firmware: "V1.0.6 Wraith".into(),
                saves: 0,
                reports: Vec::new(),
                fail: false,
                fail_on: None,
            }
        }

        /// Request payloads received, without report ID and padding.
        pub fn payloads(&self) -> Vec<&[u8]> {
            self.reports.iter().map(|report| &report[1..]).collect()
        }

        /// Request payloads starting with a command and target byte.
        pub fn requests(&self, command: u8, target: u8) -> Vec<&[u8]> {
            self.payloads()
                .into_iter()
                .filter(|payload| payload[0] == command && payload[1] == target)
                .collect()
        }

        fn reply(&self, header: &[u8], body: &[u8]) -> Vec<u8> {
            let mut reply = Vec::with_capacity(REPORT_SIZE);
            reply.extend_from_slice(header);
            reply.extend_from_slice(body);
            reply.resize(REPORT_SIZE, 0x00);
            reply
        }
    }

    impl Transport for MockPrism {
        fn transceive(&mut self, report: &[u8]) -> Result<Vec<u8>> {
            self.reports.push(report.to_vec());

            if self.fail {
                return Err(PrismError::TransactFailed("mock: failure injected".into()));
            }
            if report.len() != REPORT_SIZE + 1 || report[0] != 0x00 {
                return Err(PrismError::TransactFailed(format!(
                    "mock: invalid report of {} bytes",
                    report.len()
                )));
            }

            let payload = &report[1..];
            let header = &payload[..4];

            if self.fail_on == Some((payload[0], payload[1])) {
                return Err(PrismError::TransactFailed(format!(
                    "mock: request 0x{:02x} 0x{:02x} failed",
                    payload[0], payload[1]
                )));
            }

            let reply = match (payload[0], payload[1]) {
                (CMD_READ, TARGET_CHANNEL) => {
                    let channel = payload[4];
                    let mut frame = [0; FRAME_LEN];
                    frame[0] = channel;
                    let frame = self.channels.get(&channel).unwrap_or(&frame);
                    self.reply(header, frame)
                },
                (CMD_WRITE, TARGET_CHANNEL) => {
                    let mut frame = [0; FRAME_LEN];
                    frame.copy_from_slice(&payload[4..4 + FRAME_LEN]);
                    self.channels.insert(frame[0], frame);
                    self.reply(header, &[])
                },
                (CMD_READ, TARGET_ASSIGNMENT) => {
                    let [logo, fan, ring] = self.assignment;
                    let mut body = vec![0x00, 0x03, 0x00, 0x00, logo, fan];
                    body.extend_from_slice(&[ring; RING_SLOTS]);
                    self.reply(header, &body)
                },
                (CMD_WRITE, TARGET_ASSIGNMENT) => {
                    self.assignment = [
                        payload[LOGO_CHANNEL_OFFSET],
                        payload[FAN_CHANNEL_OFFSET],
                        payload[RING_CHANNEL_OFFSET],
                    ];
                    self.reply(header, &[])
                },
                (CMD_WRITE, TARGET_MORSE) => {
                    let slot = usize::from(payload[2] & 0b11);
                    self.morse_slots[slot] = payload[4..4 + MORSE_CHUNK_LEN].to_vec();
                    self.reply(header, &[])
                },
                (CMD_READ, TARGET_MORSE) => {
                    let slot = usize::from(payload[2] & 0b11);
                    self.reply(header, &self.morse_slots[slot])
                },
                (CMD_READ, TARGET_ENSO) => {
                    let status = if self.enso { ENSO_ENABLED } else { 0x00 };
                    self.reply(header, &[status])
                },
                (CMD_WRITE, TARGET_ENSO) => {
                    self.enso = payload[4] == ENSO_ENABLED;
                    self.reply(header, &[])
                },
                (CMD_RESTORE, TARGET_SAVE) => {
                    self.saves += 1;
                    self.reply(header, &[])
                },
                (CMD_INFO, TARGET_FIRMWARE) => {
                    self.reply(&payload[..8], self.firmware.as_bytes())
                },
                _ => self.reply(header, &[]),
            };

            Ok(reply)
        }
    }
}
