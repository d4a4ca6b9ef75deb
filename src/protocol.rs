//! Wraith Prism protocol constants.
//!
//! Every request starts with a command byte followed by a target byte. Replies echo the
//! request header before their payload.

// ── USB identifiers ──

/// Cooler Master vendor ID.
pub const VENDOR_ID: u16 = 0x2516;

/// Wraith Prism product ID.
pub const PRODUCT_ID: u16 = 0x0051;

/// HID interface accepting LED commands.
pub const INTERFACE_NUMBER: i32 = 1;

/// Size of every HID report, excluding the report ID.
pub const REPORT_SIZE: usize = 64;

/// udev rule granting the logged in user access to the device.
pub const UDEV_RULE: &str = "SUBSYSTEM==\"usb\", ATTR{idVendor}==\"2516\", \
                             ATTR{idProduct}==\"0051\", TAG+=\"uaccess\", TAG+=\"udev-acl\"";

/// Location for [`UDEV_RULE`].
pub const UDEV_RULE_PATH: &str = "/etc/udev/rules.d/60-wraith-prism.rules";

// ── Command bytes ──

/// Firmware information.
pub const CMD_INFO: u8 = 0x12;

/// Power control.
pub const CMD_POWER: u8 = 0x41;

/// Restore settings from flash, or save them with [`TARGET_SAVE`].
pub const CMD_RESTORE: u8 = 0x50;

/// Write a value.
pub const CMD_WRITE: u8 = 0x51;

/// Read a value.
pub const CMD_READ: u8 = 0x52;

// ── Target bytes ──

/// Firmware version, used with [`CMD_INFO`].
pub const TARGET_FIRMWARE: u8 = 0x20;

/// Power on, used with [`CMD_POWER`].
pub const TARGET_POWER_ON: u8 = 0x80;

/// Power off, used with [`CMD_POWER`].
pub const TARGET_POWER_OFF: u8 = 0x03;

/// Persist current settings to flash, used with [`CMD_RESTORE`].
pub const TARGET_SAVE: u8 = 0x55;

/// Apply pending changes.
pub const TARGET_APPLY: u8 = 0x28;

/// Channel settings of a single LED zone.
pub const TARGET_CHANNEL: u8 = 0x2c;

/// Fan mirage frequencies.
pub const TARGET_MIRAGE: u8 = 0x71;

/// Ring morse payload.
pub const TARGET_MORSE: u8 = 0x73;

/// Enso mode.
pub const TARGET_ENSO: u8 = 0x96;

/// Channel assignment of all LED zones.
pub const TARGET_ASSIGNMENT: u8 = 0xa0;

// ── Payload values ──

/// Status byte reported while enso mode is active.
pub const ENSO_ENABLED: u8 = 0x10;

/// Padding used for channel settings frames.
pub const SUBMIT_FILLER: u8 = 0xff;

/// Padding used for all other frames.
pub const DEFAULT_FILLER: u8 = 0x00;

/// Number of ring channel slots in the assignment frame.
pub const RING_SLOTS: usize = 15;

/// Offsets of the zone channels in the channel assignment reply.
pub const LOGO_CHANNEL_OFFSET: usize = 8;
pub const FAN_CHANNEL_OFFSET: usize = 9;
pub const RING_CHANNEL_OFFSET: usize = 10;

/// Range of the ASCII firmware version in its reply.
pub const FIRMWARE_RANGE: std::ops::Range<usize> = 8..34;

/// Offset of the morse payload in morse replies.
pub const MORSE_PAYLOAD_OFFSET: usize = 4;

/// Offset of the enso status byte.
pub const ENSO_OFFSET: usize = 4;
