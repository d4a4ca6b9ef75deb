//! AMD Wraith Prism RGB cooler control.
//!
//! The Wraith Prism exposes its logo, fan and ring LEDs over a vendor specific HID protocol
//! using 64 byte reports. [`WraithPrism`] keeps the logical state of every LED zone and
//! converts it to the device's frames.

pub mod component;
pub mod error;
pub mod mirage;
pub mod mode;
pub mod morse;
pub mod prism;
pub mod protocol;
pub mod reply;
pub mod transport;

pub use component::{BasicComponent, LedState, PrismComponent, Rgb, RingComponent};
pub use error::PrismError;
pub use mirage::MirageState;
pub use mode::{
    BasicMode, Brightness, ColorSupport, LightingMode, RingMode, RotationDirection, Speed,
};
pub use prism::{ComponentKind, WraithPrism};
pub use transport::{HidConfig, HidTransport, Transport};
