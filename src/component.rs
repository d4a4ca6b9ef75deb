//! LED zone state.
//!
//! Components hold the logical state of one LED zone together with a snapshot of the frame
//! last persisted to the device, which is used to detect unsaved changes.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use log::warn;

use crate::error::{PrismError, Result};
use crate::mode::{
    BasicMode, Brightness, ColorSupport, LightingMode, RingMode, RotationDirection, Speed,
};
use crate::morse;
use crate::protocol::{CMD_WRITE, TARGET_MORSE};
use crate::reply::ChannelReply;

/// Length of a channel settings frame.
pub const FRAME_LEN: usize = 9;

/// Bytes of the morse payload sent per frame.
pub const MORSE_CHUNK_LEN: usize = 60;

/// Maximum size of the morse payload stored on the device.
pub const MORSE_MAX_LEN: usize = 2 * MORSE_CHUNK_LEN;

/// Color source bit enabling random colors.
const RANDOM_COLOR: u8 = 0x80;

/// Color source of basic components using a fixed color.
const FIXED_COLOR: u8 = 0x20;

/// Speed byte used when the mode has no speed setting.
const FALLBACK_SPEED: u8 = 0x2c;

/// Speed byte required by the morse effect.
const MORSE_SPEED: u8 = 0x6b;

/// Brightness byte used when a basic mode has no brightness setting.
const BASIC_FALLBACK_BRIGHTNESS: u8 = 0x00;

/// Brightness byte used when a ring mode has no brightness setting.
const RING_FALLBACK_BRIGHTNESS: u8 = 0x99;

/// Encoded channel settings.
pub type Frame = [u8; FRAME_LEN];

/// RGB color.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0x00, g: 0x00, b: 0x00 };
}

impl FromStr for Rgb {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Rgb, ()> {
        let chars = match s.strip_prefix("0x") {
            Some(chars) if chars.len() == 6 => chars,
            _ => return Err(()),
        };

        match u32::from_str_radix(chars, 16) {
            Ok(mut color) => {
                let b = (color & 0xff) as u8;
                color >>= 8;
                let g = (color & 0xff) as u8;
                color >>= 8;
                let r = color as u8;
                Ok(Rgb { r, g, b })
            },
            Err(_) => Err(()),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Settings shared by all LED zones.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct LedState<M> {
    pub mode: M,
    pub color: Rgb,
    pub speed: Speed,
    pub brightness: Brightness,
    pub random_color: bool,
}

impl<M: LightingMode> LedState<M> {
    fn new(mode: M) -> Self {
        Self {
            mode,
            color: Rgb::BLACK,
            speed: Speed::default(),
            brightness: Brightness::default(),
            random_color: false,
        }
    }

    /// Read color, speed and brightness for the current mode.
    fn apply_reply(&mut self, reply: &ChannelReply<'_>) {
        let color_support = self.mode.color_support();

        self.color = match color_support {
            ColorSupport::None => Rgb::BLACK,
            _ => reply.color(),
        };
        self.random_color =
            color_support == ColorSupport::All && reply.color_source() & RANDOM_COLOR != 0;

        self.speed = self.mode.find_speed(reply.speed(), Speed::Medium);
        self.brightness = self.mode.find_brightness(reply.brightness(), Brightness::Medium);
    }
}

/// Behavior shared by all LED zones.
pub trait PrismComponent {
    /// Channel the zone's settings are written to.
    fn channel(&self) -> u8;

    /// Encode the current settings.
    fn encode_frame(&self) -> Frame;

    /// Replace the current settings with the device's channel reply.
    fn apply_reply(&mut self, reply: &ChannelReply<'_>) -> Result<()>;

    /// Check if the settings differ from the last saved state.
    fn is_dirty(&self) -> bool;

    /// Mark the current settings as saved.
    fn save(&mut self);
}

/// Logo or fan LEDs.
#[derive(Debug, Clone)]
pub struct BasicComponent {
    pub state: LedState<BasicMode>,
    channel: u8,
    saved: Frame,
}

impl BasicComponent {
    pub fn new(channel: u8) -> Self {
        let mut component =
            Self { state: LedState::new(BasicMode::Off), channel, saved: [0; FRAME_LEN] };
        component.save();
        component
    }
}

impl PrismComponent for BasicComponent {
    fn channel(&self) -> u8 {
        self.channel
    }

    fn encode_frame(&self) -> Frame {
        let LedState { mode, color, speed, brightness, random_color } = self.state;

        let speed = mode.speed_byte(speed).unwrap_or(FALLBACK_SPEED);
        let brightness = mode.brightness_byte(brightness).unwrap_or(BASIC_FALLBACK_BRIGHTNESS);
        let color_source = if random_color { RANDOM_COLOR } else { FIXED_COLOR };

        [
            self.channel,
            speed,
            color_source,
            mode.code(),
            0xff,
            brightness,
            color.r,
            color.g,
            color.b,
        ]
    }

    fn apply_reply(&mut self, reply: &ChannelReply<'_>) -> Result<()> {
        let code = reply.mode();
        self.state.mode = BasicMode::from_code(code)
            .ok_or(PrismError::UnknownMode { channel: self.channel, code })?;
        self.state.apply_reply(reply);
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.encode_frame() != self.saved
    }

    fn save(&mut self) {
        self.saved = self.encode_frame();
    }
}

/// Text displayed by the ring's morse effect, with its device encoding computed on demand.
#[derive(Default, Debug, Clone)]
pub struct MorseText {
    text: String,
    encoded: Option<Vec<u8>>,
}

impl MorseText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), encoded: None }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, invalidating its encoding.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.encoded = None;
    }

    /// Device encoding of the text.
    pub fn bytes(&mut self) -> Result<&[u8]> {
        let encoded = match self.encoded.take() {
            Some(encoded) => encoded,
            None => morse::encode(&self.text)?,
        };

        Ok(self.encoded.insert(encoded).as_slice())
    }
}

/// Ring LEDs.
#[derive(Debug, Clone)]
pub struct RingComponent {
    pub state: LedState<RingMode>,
    pub direction: RotationDirection,
    morse: MorseText,
    saved: Frame,
    saved_text: String,
}

impl RingComponent {
    /// Create a ring using the mode assigned to `channel`.
    pub fn new(channel: u8) -> Self {
        let mut component = Self {
            state: LedState::new(Self::mode_for_channel(channel)),
            direction: RotationDirection::default(),
            morse: MorseText::default(),
            saved: [0; FRAME_LEN],
            saved_text: String::new(),
        };
        component.save();
        component
    }

    /// Find the ring mode for a channel, falling back to the rainbow effect.
    fn mode_for_channel(channel: u8) -> RingMode {
        RingMode::from_channel(channel).unwrap_or_else(|| {
            warn!("Received invalid ring channel 0x{:02x}, falling back to rainbow", channel);
            RingMode::Rainbow
        })
    }

    pub fn morse_text(&self) -> &str {
        self.morse.text()
    }

    pub fn set_morse_text(&mut self, text: impl Into<String>) {
        self.morse.set(text);
    }

    /// Device encoding of the morse text.
    pub fn morse_bytes(&mut self) -> Result<&[u8]> {
        self.morse.bytes()
    }

    /// Load the morse payload read back from the device.
    pub fn apply_morse_payload(&mut self, payload: &[u8]) {
        let text = match morse::decode(payload, false) {
            Ok(text) => text,
            Err(err) => {
                warn!("Unable to decode morse payload ({}), keeping raw morse", err);
                let morse = morse::decode(payload, true).unwrap_or_default();
                morse.trim().to_string()
            },
        };

        self.morse = MorseText { text, encoded: Some(payload.to_vec()) };
    }

    /// Frames storing the morse payload, both halves are written to two slots.
    pub fn morse_frames(&mut self) -> Result<[Bytes; 4]> {
        let payload = self.morse.bytes()?;
        if payload.len() > MORSE_MAX_LEN {
            return Err(PrismError::MorseTooLong { len: payload.len(), max: MORSE_MAX_LEN });
        }

        let (first, second) = payload.split_at(payload.len().min(MORSE_CHUNK_LEN));

        let frame = |slot: u8, chunk: &[u8]| {
            let mut buf = BytesMut::with_capacity(4 + chunk.len());
            buf.put_slice(&[CMD_WRITE, TARGET_MORSE, slot, 0x00]);
            buf.put_slice(chunk);
            buf.freeze()
        };

        Ok([frame(0, first), frame(1, second), frame(2, first), frame(3, second)])
    }

    fn color_source(&self) -> u8 {
        let mode = self.state.mode;

        if mode.color_support() == ColorSupport::All && self.state.random_color {
            if mode.supports_direction() {
                RANDOM_COLOR | self.direction.bit()
            } else {
                RANDOM_COLOR
            }
        } else if mode.supports_direction() {
            self.direction.bit()
        } else {
            mode.table().color_source
        }
    }
}

impl PrismComponent for RingComponent {
    fn channel(&self) -> u8 {
        self.state.mode.channel()
    }

    fn encode_frame(&self) -> Frame {
        let LedState { mode, color, speed, brightness, .. } = self.state;

        let speed = match mode {
            RingMode::Morse => MORSE_SPEED,
            _ => mode.speed_byte(speed).unwrap_or(FALLBACK_SPEED),
        };
        let brightness = mode.brightness_byte(brightness).unwrap_or(RING_FALLBACK_BRIGHTNESS);

        [
            mode.channel(),
            speed,
            self.color_source(),
            mode.code(),
            0xff,
            brightness,
            color.r,
            color.g,
            color.b,
        ]
    }

    fn apply_reply(&mut self, reply: &ChannelReply<'_>) -> Result<()> {
        let mode = Self::mode_for_channel(reply.channel());

        self.state.mode = mode;
        self.direction = if mode.supports_direction() {
            RotationDirection::from_color_source(reply.color_source())
        } else {
            RotationDirection::Clockwise
        };
        self.state.apply_reply(reply);

        Ok(())
    }

    fn is_dirty(&self) -> bool {
        if self.encode_frame() != self.saved {
            return true;
        }

        self.state.mode == RingMode::Morse
            && normalize_text(self.morse.text()) != normalize_text(&self.saved_text)
    }

    fn save(&mut self) {
        self.saved = self.encode_frame();
        self.saved_text = self.morse.text().to_string();
    }
}

fn normalize_text(text: &str) -> String {
    text.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(channel: u8, speed: u8, color_source: u8, mode: u8, brightness: u8) -> Vec<u8> {
        let mut bytes = vec![
            0x52,
            0x2c,
            0x01,
            0x00,
            channel,
            speed,
            color_source,
            mode,
            0xff,
            brightness,
            0x12,
            0x34,
            0x56,
        ];
        bytes.resize(64, 0x00);
        bytes
    }

    fn loaded_basic(bytes: &[u8]) -> BasicComponent {
        let mut component = BasicComponent::new(0x05);
        component.apply_reply(&ChannelReply::new(bytes).unwrap()).unwrap();
        component.save();
        component
    }

    fn loaded_ring(bytes: &[u8]) -> RingComponent {
        let mut component = RingComponent::new(bytes[4]);
        component.apply_reply(&ChannelReply::new(bytes).unwrap()).unwrap();
        component.save();
        component
    }

    #[test]
    fn parse_rgb() {
        assert_eq!("0x123456".parse(), Ok(Rgb { r: 0x12, g: 0x34, b: 0x56 }));
        assert_eq!("123456".parse::<Rgb>(), Err(()));
        assert_eq!("0x12345".parse::<Rgb>(), Err(()));
        assert_eq!(Rgb { r: 0xff, g: 0x00, b: 0x0a }.to_string(), "0xff000a");
    }

    #[test]
    fn basic_frame() {
        let mut logo = BasicComponent::new(0x05);
        logo.state = LedState {
            mode: BasicMode::Breathe,
            color: Rgb { r: 1, g: 2, b: 3 },
            speed: Speed::Fast,
            brightness: Brightness::High,
            random_color: true,
        };

        assert_eq!(logo.encode_frame(), [0x05, 0x2c, 0x80, 0x03, 0xff, 0xff, 1, 2, 3]);
    }

    #[test]
    fn basic_fallbacks() {
        let mut fan = BasicComponent::new(0x06);
        fan.state.mode = BasicMode::Off;
        fan.state.brightness = Brightness::Medium;

        let frame = fan.encode_frame();
        assert_eq!(frame[1], 0x2c);
        assert_eq!(frame[2], 0x20);
        assert_eq!(frame[5], 0x00);
    }

    #[test]
    fn basic_reply() {
        let logo = loaded_basic(&reply(0x05, 0x37, 0x80, 0x03, 0x4c));
        assert_eq!(logo.state.mode, BasicMode::Breathe);
        assert_eq!(logo.state.speed, Speed::Slow);
        assert_eq!(logo.state.brightness, Brightness::Low);
        assert_eq!(logo.state.color, Rgb { r: 0x12, g: 0x34, b: 0x56 });
        assert!(logo.state.random_color);
        assert!(!logo.is_dirty());
    }

    #[test]
    fn basic_reply_without_color_support() {
        let fan = loaded_basic(&reply(0x06, 0x00, 0x80, 0x02, 0x00));
        assert_eq!(fan.state.mode, BasicMode::Cycle);
        assert_eq!(fan.state.color, Rgb::BLACK);
        assert!(!fan.state.random_color);
        assert_eq!(fan.state.speed, Speed::Medium);
        assert_eq!(fan.state.brightness, Brightness::Medium);
    }

    #[test]
    fn basic_unknown_mode() {
        let mut logo = BasicComponent::new(0x05);
        let bytes = reply(0x05, 0x37, 0x20, 0x42, 0x4c);
        let err = logo.apply_reply(&ChannelReply::new(&bytes).unwrap()).unwrap_err();
        assert_eq!(err, PrismError::UnknownMode { channel: 0x05, code: 0x42 });
    }

    #[test]
    fn basic_dirty_tracking() {
        let saved = loaded_basic(&reply(0x05, 0x31, 0x20, 0x03, 0x99));
        assert!(!saved.is_dirty());

        let mutations: [fn(&mut BasicComponent); 5] = [
            |c| c.state.mode = BasicMode::Static,
            |c| c.state.color = Rgb { r: 0xff, g: 0x00, b: 0x00 },
            |c| c.state.speed = Speed::Fastest,
            |c| c.state.brightness = Brightness::High,
            |c| c.state.random_color = true,
        ];

        for mutate in mutations {
            let mut component = saved.clone();
            mutate(&mut component);
            assert!(component.is_dirty());

            component.save();
            assert!(!component.is_dirty());
        }
    }

    #[test]
    fn ring_dirty_tracking() {
        let saved = loaded_ring(&reply(0x0a, 0x6e, 0x00, 0x4a, 0x99));
        assert_eq!(saved.state.mode, RingMode::Swirl);
        assert!(!saved.is_dirty());

        let mutations: [fn(&mut RingComponent); 6] = [
            |c| c.state.mode = RingMode::Chase,
            |c| c.state.color = Rgb { r: 0x00, g: 0x00, b: 0xff },
            |c| c.state.speed = Speed::Fastest,
            |c| c.state.brightness = Brightness::High,
            |c| c.state.random_color = true,
            |c| c.direction = RotationDirection::CounterClockwise,
        ];

        for mutate in mutations {
            let mut component = saved.clone();
            mutate(&mut component);
            assert!(component.is_dirty());

            component.save();
            assert!(!component.is_dirty());
        }
    }

    #[test]
    fn ring_channel_follows_mode() {
        let mut ring = RingComponent::new(0x07);
        assert_eq!(ring.state.mode, RingMode::Rainbow);
        assert_eq!(ring.channel(), 0x07);

        ring.state.mode = RingMode::Swirl;
        assert_eq!(ring.channel(), 0x0a);
        assert_eq!(ring.encode_frame()[0], 0x0a);
        assert_eq!(ring.encode_frame()[3], 0x4a);
    }

    #[test]
    fn ring_unknown_channel() {
        let ring = RingComponent::new(0x42);
        assert_eq!(ring.state.mode, RingMode::Rainbow);

        let ring = loaded_ring(&reply(0x42, 0x64, 0x00, 0x05, 0x99));
        assert_eq!(ring.state.mode, RingMode::Rainbow);
        assert_eq!(ring.state.speed, Speed::Medium);
        assert_eq!(ring.state.color, Rgb::BLACK);
    }

    #[test]
    fn ring_morse_speed() {
        let mut ring = RingComponent::new(0x0b);
        for speed in Speed::ALL {
            ring.state.speed = speed;
            let frame = ring.encode_frame();
            assert_eq!(frame[1], 0x6b);
            assert_eq!(frame[5], 0x99);
        }
    }

    #[test]
    fn ring_color_source() {
        let mut ring = RingComponent::new(0x09);
        ring.direction = RotationDirection::CounterClockwise;

        ring.state.random_color = true;
        assert_eq!(ring.encode_frame()[2], 0x81);

        ring.state.random_color = false;
        assert_eq!(ring.encode_frame()[2], 0x01);

        ring.state.mode = RingMode::Breathe;
        ring.state.random_color = true;
        assert_eq!(ring.encode_frame()[2], 0x80);

        ring.state.random_color = false;
        assert_eq!(ring.encode_frame()[2], 0x20);

        ring.state.mode = RingMode::Rainbow;
        assert_eq!(ring.encode_frame()[2], 0x00);

        ring.state.mode = RingMode::Bounce;
        ring.state.random_color = true;
        assert_eq!(ring.encode_frame()[2], 0x80);
    }

    #[test]
    fn ring_reply_direction() {
        let ring = loaded_ring(&reply(0x0a, 0x6e, 0x81, 0x4a, 0xff));
        assert_eq!(ring.state.mode, RingMode::Swirl);
        assert_eq!(ring.direction, RotationDirection::CounterClockwise);
        assert!(ring.state.random_color);
        assert_eq!(ring.state.brightness, Brightness::High);

        let ring = loaded_ring(&reply(0x08, 0x6e, 0x81, 0xff, 0xff));
        assert_eq!(ring.state.mode, RingMode::Bounce);
        assert_eq!(ring.direction, RotationDirection::Clockwise);
        assert!(!ring.state.random_color);
    }

    #[test]
    fn ring_text_only_dirty_in_morse_mode() {
        let mut ring = loaded_ring(&reply(0x07, 0x64, 0x00, 0x05, 0x99));
        ring.set_morse_text("sos");
        assert!(!ring.is_dirty());

        ring.state.mode = RingMode::Morse;
        ring.save();
        assert!(!ring.is_dirty());

        ring.set_morse_text("  SOS ");
        assert!(!ring.is_dirty());

        ring.set_morse_text("hi");
        assert!(ring.is_dirty());
    }

    #[test]
    fn ring_frame_dirty_outside_morse_text() {
        let mut ring = loaded_ring(&reply(0x0b, 0x6b, 0x00, 0x05, 0x99));
        ring.state.color = Rgb { r: 0xff, g: 0xff, b: 0xff };
        assert!(ring.is_dirty());
    }

    #[test]
    fn morse_cache_invalidation() {
        let mut text = MorseText::new("e");
        assert_eq!(text.bytes().unwrap(), &[0x31]);

        text.set("t");
        assert_eq!(text.bytes().unwrap(), &[0x32]);

        text.set("#");
        assert_eq!(text.bytes(), Err(PrismError::UnsupportedCharacter('#')));
    }

    #[test]
    fn short_morse_frames() {
        let mut ring = RingComponent::new(0x0b);
        ring.set_morse_text("e");

        let frames = ring.morse_frames().unwrap();
        assert_eq!(&frames[0][..], &[0x51, 0x73, 0x00, 0x00, 0x31]);
        assert_eq!(&frames[1][..], &[0x51, 0x73, 0x01, 0x00]);
        assert_eq!(&frames[2][..], &[0x51, 0x73, 0x02, 0x00, 0x31]);
        assert_eq!(&frames[3][..], &[0x51, 0x73, 0x03, 0x00]);
    }

    #[test]
    fn long_morse_frames() {
        let mut ring = RingComponent::new(0x0b);
        ring.set_morse_text("0".repeat(40));

        let len = ring.morse_bytes().unwrap().len();
        assert!(len > MORSE_CHUNK_LEN && len <= MORSE_MAX_LEN);

        let frames = ring.morse_frames().unwrap();
        assert_eq!(frames[0].len(), 4 + MORSE_CHUNK_LEN);
        assert_eq!(frames[1].len(), 4 + len - MORSE_CHUNK_LEN);
        assert_eq!(frames[0][4..], frames[2][4..]);
        assert_eq!(frames[1][4..], frames[3][4..]);
    }

    #[test]
    fn oversized_morse() {
        let mut ring = RingComponent::new(0x0b);
        ring.set_morse_text("0".repeat(100));
        assert!(matches!(ring.morse_frames(), Err(PrismError::MorseTooLong { .. })));
    }

    #[test]
    fn morse_payload() {
        let mut payload = morse::encode("hi").unwrap();
        payload.resize(MORSE_MAX_LEN, 0x00);

        let mut ring = RingComponent::new(0x0b);
        ring.apply_morse_payload(&payload);
        ring.save();

        assert_eq!(ring.morse_text(), "HI");
        assert_eq!(ring.morse_bytes().unwrap(), &payload[..]);
        assert!(!ring.is_dirty());
    }

    #[test]
    fn undecodable_morse_payload() {
        // Eight dots, followed by the terminator.
        let payload = [0x55, 0x55, 0x0c];

        let mut ring = RingComponent::new(0x0b);
        ring.apply_morse_payload(&payload);
        assert_eq!(ring.morse_text(), "........");
    }
}
