//! Lighting mode catalogs.
//!
//! Each mode maps the abstract speed and brightness levels to the bytes understood by the
//! firmware. Modes without a table for a setting do not support changing it.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

/// Speeds used by the breathe effect.
const BREATHE_SPEEDS: [u8; 5] = [0x3c, 0x37, 0x31, 0x2c, 0x26];

/// Speeds used by the color cycle effect.
const CYCLE_SPEEDS: [u8; 5] = [0x96, 0x8c, 0x80, 0x6e, 0x68];

/// Speeds used by the ring's rainbow effect.
const RAINBOW_SPEEDS: [u8; 5] = [0x72, 0x68, 0x64, 0x62, 0x61];

/// Speeds used by the ring's rotating effects.
const ROTATION_SPEEDS: [u8; 5] = [0x77, 0x74, 0x6e, 0x6b, 0x67];

/// Brightness used by most effects.
const DEFAULT_BRIGHTNESS: [u8; 3] = [0x4c, 0x99, 0xff];

/// Brightness used by the color cycle effect.
const CYCLE_BRIGHTNESS: [u8; 3] = [0x10, 0x40, 0x7f];

/// Color source byte for effects with a fixed color.
const FIXED_COLOR_SOURCE: u8 = 0x20;

/// Effect speed.
#[derive(Default, PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum Speed {
    Slowest,
    Slow,
    #[default]
    Medium,
    Fast,
    Fastest,
}

impl Speed {
    pub const ALL: [Speed; 5] =
        [Speed::Slowest, Speed::Slow, Speed::Medium, Speed::Fast, Speed::Fastest];

    fn name(self) -> &'static str {
        match self {
            Self::Slowest => "slowest",
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
            Self::Fastest => "fastest",
        }
    }
}

/// LED brightness.
#[derive(Default, PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum Brightness {
    Low,
    #[default]
    Medium,
    High,
}

impl Brightness {
    pub const ALL: [Brightness; 3] = [Brightness::Low, Brightness::Medium, Brightness::High];

    fn name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Colors accepted by a mode.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum ColorSupport {
    /// Color is chosen by the effect.
    None,
    /// A single user-defined color.
    Specific,
    /// A user-defined color or a random color.
    All,
}

/// Rotation of the ring's animated effects.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum RotationDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    pub const ALL: [RotationDirection; 2] =
        [RotationDirection::Clockwise, RotationDirection::CounterClockwise];

    /// Direction bit of the color source byte.
    pub fn bit(self) -> u8 {
        match self {
            Self::Clockwise => 0,
            Self::CounterClockwise => 1,
        }
    }

    /// Read the direction from a color source byte.
    pub fn from_color_source(color_source: u8) -> Self {
        if color_source & 1 == 0 {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Clockwise => "clockwise",
            Self::CounterClockwise => "counter-clockwise",
        }
    }
}

/// Static device data of a single mode.
#[derive(Debug)]
pub struct ModeTable {
    /// Device mode byte.
    pub code: u8,
    pub speeds: Option<[u8; 5]>,
    pub brightnesses: Option<[u8; 3]>,
    pub color_support: ColorSupport,
    pub supports_direction: bool,
    /// Color source byte used when neither random colors nor direction apply.
    pub color_source: u8,
}

impl ModeTable {
    const fn new(code: u8) -> Self {
        Self {
            code,
            speeds: None,
            brightnesses: Some(DEFAULT_BRIGHTNESS),
            color_support: ColorSupport::None,
            supports_direction: false,
            color_source: FIXED_COLOR_SOURCE,
        }
    }

    const fn speeds(mut self, speeds: [u8; 5]) -> Self {
        self.speeds = Some(speeds);
        self
    }

    const fn brightnesses(mut self, brightnesses: Option<[u8; 3]>) -> Self {
        self.brightnesses = brightnesses;
        self
    }

    const fn color_support(mut self, color_support: ColorSupport) -> Self {
        self.color_support = color_support;
        self
    }

    const fn with_direction(mut self) -> Self {
        self.supports_direction = true;
        self
    }

    const fn color_source(mut self, color_source: u8) -> Self {
        self.color_source = color_source;
        self
    }
}

static BASIC_OFF: ModeTable = ModeTable::new(0).brightnesses(None);
static BASIC_STATIC: ModeTable = ModeTable::new(1).color_support(ColorSupport::Specific);
static BASIC_CYCLE: ModeTable =
    ModeTable::new(2).speeds(CYCLE_SPEEDS).brightnesses(Some(CYCLE_BRIGHTNESS));
static BASIC_BREATHE: ModeTable =
    ModeTable::new(3).speeds(BREATHE_SPEEDS).color_support(ColorSupport::All);

static RING_OFF: ModeTable = ModeTable::new(0).brightnesses(None);
static RING_STATIC: ModeTable = ModeTable::new(0xff).color_support(ColorSupport::Specific);
static RING_BREATHE: ModeTable =
    ModeTable::new(0xff).speeds(BREATHE_SPEEDS).color_support(ColorSupport::All);
static RING_CYCLE: ModeTable =
    ModeTable::new(0xff).speeds(CYCLE_SPEEDS).brightnesses(Some(CYCLE_BRIGHTNESS));
static RING_RAINBOW: ModeTable = ModeTable::new(5).speeds(RAINBOW_SPEEDS).color_source(0);
static RING_BOUNCE: ModeTable = ModeTable::new(0xff).speeds(ROTATION_SPEEDS).color_source(0x80);
static RING_CHASE: ModeTable =
    ModeTable::new(0xc3).speeds(ROTATION_SPEEDS).color_support(ColorSupport::All).with_direction();
static RING_SWIRL: ModeTable =
    ModeTable::new(0x4a).speeds(ROTATION_SPEEDS).color_support(ColorSupport::All).with_direction();
static RING_MORSE: ModeTable =
    ModeTable::new(5).color_support(ColorSupport::All).brightnesses(None).color_source(0);

/// Mode of a component family, backed by a static [`ModeTable`].
pub trait LightingMode: Debug + Copy + Eq {
    fn table(self) -> &'static ModeTable;

    fn code(self) -> u8 {
        self.table().code
    }

    fn color_support(self) -> ColorSupport {
        self.table().color_support
    }

    fn supports_direction(self) -> bool {
        self.table().supports_direction
    }

    /// Device byte for a speed, if the mode supports it.
    fn speed_byte(self, speed: Speed) -> Option<u8> {
        self.table().speeds.map(|speeds| speeds[speed as usize])
    }

    /// Device byte for a brightness, if the mode supports it.
    fn brightness_byte(self, brightness: Brightness) -> Option<u8> {
        self.table().brightnesses.map(|brightnesses| brightnesses[brightness as usize])
    }

    /// Find the speed for a device byte, falling back to `default` without an exact match.
    fn find_speed(self, byte: u8, default: Speed) -> Speed {
        self.table()
            .speeds
            .and_then(|speeds| speeds.iter().position(|&speed| speed == byte))
            .map_or(default, |index| Speed::ALL[index])
    }

    /// Find the brightness for a device byte, falling back to `default` without an exact match.
    fn find_brightness(self, byte: u8, default: Brightness) -> Brightness {
        self.table()
            .brightnesses
            .and_then(|brightnesses| brightnesses.iter().position(|&b| b == byte))
            .map_or(default, |index| Brightness::ALL[index])
    }
}

/// Modes of the logo and fan.
#[derive(Default, PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum BasicMode {
    #[default]
    Off,
    Static,
    Cycle,
    Breathe,
}

impl BasicMode {
    pub const ALL: [BasicMode; 4] =
        [BasicMode::Off, BasicMode::Static, BasicMode::Cycle, BasicMode::Breathe];

    /// Find the mode for a device mode byte.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.code() == code)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Static => "static",
            Self::Cycle => "cycle",
            Self::Breathe => "breathe",
        }
    }
}

impl LightingMode for BasicMode {
    fn table(self) -> &'static ModeTable {
        match self {
            Self::Off => &BASIC_OFF,
            Self::Static => &BASIC_STATIC,
            Self::Cycle => &BASIC_CYCLE,
            Self::Breathe => &BASIC_BREATHE,
        }
    }
}

/// Modes of the ring.
///
/// Ring modes are identified by their channel, multiple modes share the same mode byte.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum RingMode {
    Off,
    Static,
    Breathe,
    Cycle,
    Rainbow,
    Bounce,
    Chase,
    Swirl,
    Morse,
}

impl RingMode {
    pub const ALL: [RingMode; 9] = [
        RingMode::Off,
        RingMode::Static,
        RingMode::Breathe,
        RingMode::Cycle,
        RingMode::Rainbow,
        RingMode::Bounce,
        RingMode::Chase,
        RingMode::Swirl,
        RingMode::Morse,
    ];

    /// Device channel driving this effect.
    pub fn channel(self) -> u8 {
        match self {
            Self::Off => 0xfe,
            Self::Static => 0x00,
            Self::Breathe => 0x01,
            Self::Cycle => 0x02,
            Self::Rainbow => 0x07,
            Self::Bounce => 0x08,
            Self::Chase => 0x09,
            Self::Swirl => 0x0a,
            Self::Morse => 0x0b,
        }
    }

    /// Find the mode for a ring channel byte.
    pub fn from_channel(channel: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|mode| mode.channel() == channel)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Static => "static",
            Self::Breathe => "breathe",
            Self::Cycle => "cycle",
            Self::Rainbow => "rainbow",
            Self::Bounce => "bounce",
            Self::Chase => "chase",
            Self::Swirl => "swirl",
            Self::Morse => "morse",
        }
    }
}

impl LightingMode for RingMode {
    fn table(self) -> &'static ModeTable {
        match self {
            Self::Off => &RING_OFF,
            Self::Static => &RING_STATIC,
            Self::Breathe => &RING_BREATHE,
            Self::Cycle => &RING_CYCLE,
            Self::Rainbow => &RING_RAINBOW,
            Self::Bounce => &RING_BOUNCE,
            Self::Chase => &RING_CHASE,
            Self::Swirl => &RING_SWIRL,
            Self::Morse => &RING_MORSE,
        }
    }
}

/// Name based `Display` and case-insensitive `FromStr` for the catalog enums.
macro_rules! named_enum {
    ($($ty:ident),*) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::ALL
                        .iter()
                        .copied()
                        .find(|value| value.name().eq_ignore_ascii_case(s.trim()))
                        .ok_or_else(|| {
                            let names: Vec<_> =
                                Self::ALL.iter().map(|value| value.name()).collect();
                            format!("invalid value '{}' [possible values: {}]", s, names.join(", "))
                        })
                }
            }
        )*
    };
}

named_enum!(Speed, Brightness, RotationDirection, BasicMode, RingMode);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_codes_are_unique() {
        for mode in BasicMode::ALL {
            assert_eq!(BasicMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(BasicMode::from_code(0x42), None);
    }

    #[test]
    fn ring_channels_are_unique() {
        for mode in RingMode::ALL {
            assert_eq!(RingMode::from_channel(mode.channel()), Some(mode));
        }
        assert_eq!(RingMode::from_channel(0x05), None);
    }

    #[test]
    fn speed_lookup_is_reversible() {
        for mode in BasicMode::ALL {
            for speed in Speed::ALL {
                if let Some(byte) = mode.speed_byte(speed) {
                    assert_eq!(mode.find_speed(byte, Speed::Slowest), speed);
                }
            }
        }

        for mode in RingMode::ALL {
            for speed in Speed::ALL {
                if let Some(byte) = mode.speed_byte(speed) {
                    assert_eq!(mode.find_speed(byte, Speed::Slowest), speed);
                }
            }
        }
    }

    #[test]
    fn brightness_lookup_is_reversible() {
        for mode in BasicMode::ALL {
            for brightness in Brightness::ALL {
                if let Some(byte) = mode.brightness_byte(brightness) {
                    assert_eq!(mode.find_brightness(byte, Brightness::Low), brightness);
                }
            }
        }

        for mode in RingMode::ALL {
            for brightness in Brightness::ALL {
                if let Some(byte) = mode.brightness_byte(brightness) {
                    assert_eq!(mode.find_brightness(byte, Brightness::Low), brightness);
                }
            }
        }
    }

    #[test]
    fn unmapped_bytes_use_default() {
        assert_eq!(BasicMode::Cycle.find_speed(0x00, Speed::Medium), Speed::Medium);
        assert_eq!(BasicMode::Static.find_speed(0x3c, Speed::Fast), Speed::Fast);
        assert_eq!(BasicMode::Off.find_brightness(0xff, Brightness::Medium), Brightness::Medium);
        assert_eq!(RingMode::Morse.find_brightness(0x4c, Brightness::Low), Brightness::Low);
    }

    #[test]
    fn tables() {
        assert_eq!(BasicMode::Cycle.speed_byte(Speed::Fastest), Some(0x68));
        assert_eq!(BasicMode::Cycle.brightness_byte(Brightness::High), Some(0x7f));
        assert_eq!(BasicMode::Breathe.brightness_byte(Brightness::Low), Some(0x4c));
        assert_eq!(BasicMode::Off.brightness_byte(Brightness::Medium), None);
        assert_eq!(RingMode::Rainbow.speed_byte(Speed::Slowest), Some(0x72));
        assert_eq!(RingMode::Morse.speed_byte(Speed::Medium), None);
        assert_eq!(RingMode::Swirl.code(), 0x4a);
    }

    #[test]
    fn capabilities() {
        assert_eq!(BasicMode::Off.color_support(), ColorSupport::None);
        assert_eq!(BasicMode::Breathe.color_support(), ColorSupport::All);
        assert!(RingMode::Chase.supports_direction());
        assert!(RingMode::Swirl.supports_direction());
        assert!(!RingMode::Bounce.supports_direction());
        assert_eq!(RingMode::Bounce.table().color_source, 0x80);
    }

    #[test]
    fn direction_bit() {
        assert_eq!(RotationDirection::from_color_source(0x81), RotationDirection::CounterClockwise);
        assert_eq!(RotationDirection::from_color_source(0x20), RotationDirection::Clockwise);
        assert_eq!(RotationDirection::CounterClockwise.bit(), 1);
    }

    #[test]
    fn parse_names() {
        assert_eq!("Rainbow".parse::<RingMode>(), Ok(RingMode::Rainbow));
        assert_eq!("fastest".parse::<Speed>(), Ok(Speed::Fastest));
        assert_eq!(
            "counter-clockwise".parse::<RotationDirection>(),
            Ok(RotationDirection::CounterClockwise)
        );
        assert!("rainbow".parse::<BasicMode>().is_err());
        assert_eq!(BasicMode::Breathe.to_string(), "breathe");
    }
}
