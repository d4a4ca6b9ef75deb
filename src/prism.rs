//! Wraith Prism device session.

use bytes::{BufMut, BytesMut};
use log::{debug, info};

use crate::component::{BasicComponent, PrismComponent, RingComponent};
use crate::error::{PrismError, Result};
use crate::mirage::MirageState;
use crate::mode::{BasicMode, Brightness, RingMode, Speed};
use crate::protocol::*;
use crate::reply::ChannelReply;
use crate::transport::{HidConfig, HidTransport, Transport};

/// Request for the current channel assignment.
const READ_ASSIGNMENT: [u8; 6] = [CMD_READ, TARGET_ASSIGNMENT, 0x01, 0x00, 0x00, 0x03];

/// Request applying all pending changes.
const APPLY: [u8; 5] = [CMD_WRITE, TARGET_APPLY, 0x00, 0x00, 0xe0];

/// LED zones of the cooler.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum ComponentKind {
    Logo,
    Fan,
    Ring,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] =
        [ComponentKind::Logo, ComponentKind::Fan, ComponentKind::Ring];
}

/// Session with a Wraith Prism.
///
/// The session owns its transport exclusively; dropping it closes the device.
pub struct WraithPrism<T: Transport> {
    transport: T,
    logo: BasicComponent,
    fan: BasicComponent,
    fan_mirage: MirageState,
    ring: RingComponent,
}

impl WraithPrism<HidTransport> {
    /// Open the first HID device matching the configuration.
    pub fn open(config: &HidConfig) -> Result<Self> {
        Self::new(HidTransport::open(config)?)
    }
}

impl<T: Transport> WraithPrism<T> {
    /// Power on the device and load the state of all components.
    pub fn new(mut transport: T) -> Result<Self> {
        transport.send(&[CMD_POWER, TARGET_POWER_ON], DEFAULT_FILLER)?;
        transport.send(&[CMD_RESTORE], DEFAULT_FILLER)?;
        transport.send(&APPLY, DEFAULT_FILLER)?;
        debug!("Device powered on");

        let assignment = transport.send(&READ_ASSIGNMENT, DEFAULT_FILLER)?;
        let [logo, fan, ring] = [
            byte_at(&assignment, LOGO_CHANNEL_OFFSET)?,
            byte_at(&assignment, FAN_CHANNEL_OFFSET)?,
            byte_at(&assignment, RING_CHANNEL_OFFSET)?,
        ];
        debug!("Discovered channels logo=0x{logo:02x} fan=0x{fan:02x} ring=0x{ring:02x}");

        // Mirage has no getter, so it is assumed to be disabled.
        let mut prism = Self {
            transport,
            logo: BasicComponent::new(logo),
            fan: BasicComponent::new(fan),
            fan_mirage: MirageState::Off,
            ring: RingComponent::new(ring),
        };

        for kind in ComponentKind::ALL {
            prism.reload_component(kind)?;
        }

        info!("Wraith Prism session ready");

        Ok(prism)
    }

    pub fn logo(&self) -> &BasicComponent {
        &self.logo
    }

    pub fn logo_mut(&mut self) -> &mut BasicComponent {
        &mut self.logo
    }

    pub fn fan(&self) -> &BasicComponent {
        &self.fan
    }

    pub fn fan_mut(&mut self) -> &mut BasicComponent {
        &mut self.fan
    }

    pub fn ring(&self) -> &RingComponent {
        &self.ring
    }

    pub fn ring_mut(&mut self) -> &mut RingComponent {
        &mut self.ring
    }

    /// Last mirage state set for the fan.
    pub fn fan_mirage(&self) -> MirageState {
        self.fan_mirage
    }

    /// Change the fan's mirage state, see [`Self::push_fan_mirage_state`].
    pub fn set_fan_mirage(&mut self, state: MirageState) {
        self.fan_mirage = state;
    }

    pub fn component(&self, kind: ComponentKind) -> &dyn PrismComponent {
        match kind {
            ComponentKind::Logo => &self.logo,
            ComponentKind::Fan => &self.fan,
            ComponentKind::Ring => &self.ring,
        }
    }

    fn component_mut(&mut self, kind: ComponentKind) -> &mut dyn PrismComponent {
        match kind {
            ComponentKind::Logo => &mut self.logo,
            ComponentKind::Fan => &mut self.fan,
            ComponentKind::Ring => &mut self.ring,
        }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Check if any component differs from its last saved state.
    pub fn has_unsaved_changes(&self) -> bool {
        ComponentKind::ALL.iter().any(|&kind| self.component(kind).is_dirty())
    }

    /// Re-read a component's state from the device and mark it as saved.
    pub fn reload_component(&mut self, kind: ComponentKind) -> Result<()> {
        let channel = self.component(kind).channel();
        let bytes = self.send(&[CMD_READ, TARGET_CHANNEL, 0x01, 0x00, channel])?;
        let reply = ChannelReply::new(&bytes)?;

        // Finish all reads before touching the component state.
        let payload = match kind {
            ComponentKind::Ring => Some(self.read_morse_payload()?),
            _ => None,
        };

        self.component_mut(kind).apply_reply(&reply)?;

        if let Some(payload) = payload {
            self.ring.apply_morse_payload(&payload);
        }

        self.component_mut(kind).save();

        Ok(())
    }

    /// Write a single component and activate it.
    pub fn submit_component(&mut self, kind: ComponentKind) -> Result<()> {
        self.submit_components(&[kind])
    }

    /// Write multiple components and activate them.
    pub fn submit_components(&mut self, kinds: &[ComponentKind]) -> Result<()> {
        if kinds.is_empty() {
            return Ok(());
        }

        for &kind in kinds {
            self.write_component(kind)?;
        }

        self.assign_channels()?;
        self.apply()
    }

    /// Write all components and activate them.
    pub fn submit_all_components(&mut self) -> Result<()> {
        self.submit_components(&ComponentKind::ALL)
    }

    /// Persist the current settings to flash.
    pub fn save(&mut self) -> Result<()> {
        self.send(&[CMD_RESTORE, TARGET_SAVE])?;

        for kind in ComponentKind::ALL {
            self.component_mut(kind).save();
        }

        info!("Saved settings to flash");

        Ok(())
    }

    /// Check if enso mode is active.
    pub fn enso(&mut self) -> Result<bool> {
        let reply = self.send(&[CMD_READ, TARGET_ENSO])?;
        Ok(byte_at(&reply, ENSO_OFFSET)? == ENSO_ENABLED)
    }

    /// Enable or disable enso mode, enabling it also saves the current settings.
    pub fn set_enso(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.send(&[CMD_WRITE, TARGET_ENSO, 0x00, 0x00, ENSO_ENABLED])?;
            self.save()
        } else {
            self.send(&[CMD_WRITE, TARGET_ENSO])?;
            Ok(())
        }
    }

    /// Send the channel of every component to the device.
    pub fn assign_channels(&mut self) -> Result<()> {
        let mut buf = BytesMut::with_capacity(10 + RING_SLOTS);
        buf.put_slice(&[CMD_WRITE, TARGET_ASSIGNMENT, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00]);
        buf.put_u8(self.logo.channel());
        buf.put_u8(self.fan.channel());
        buf.put_bytes(self.ring.channel(), RING_SLOTS);

        self.send(&buf)?;

        Ok(())
    }

    /// Activate all written changes.
    pub fn apply(&mut self) -> Result<()> {
        self.send(&APPLY)?;
        Ok(())
    }

    /// Send the fan's mirage state to the device.
    pub fn push_fan_mirage_state(&mut self) -> Result<()> {
        let frame = self.fan_mirage.frame()?;
        self.send(&frame)?;
        Ok(())
    }

    /// Read the firmware version.
    pub fn firmware_version(&mut self) -> Result<String> {
        let reply = self.send(&[CMD_INFO, TARGET_FIRMWARE])?;

        let bytes = reply.get(FIRMWARE_RANGE).ok_or(PrismError::ShortReply {
            expected: FIRMWARE_RANGE.end,
            actual: reply.len(),
        })?;
        let version: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0).collect();

        Ok(String::from_utf8_lossy(&version).to_lowercase())
    }

    pub fn power_on(&mut self) -> Result<()> {
        self.send(&[CMD_POWER, TARGET_POWER_ON])?;
        Ok(())
    }

    pub fn power_off(&mut self) -> Result<()> {
        self.send(&[CMD_POWER, TARGET_POWER_OFF])?;
        Ok(())
    }

    /// Restore the factory effects on all components.
    pub fn reset_to_default(&mut self) -> Result<()> {
        self.set_enso(false)?;

        self.logo.state.mode = BasicMode::Cycle;
        self.fan.state.mode = BasicMode::Cycle;
        self.ring.state.mode = RingMode::Rainbow;

        self.logo.state.speed = Speed::Medium;
        self.fan.state.speed = Speed::Medium;
        self.ring.state.speed = Speed::Medium;

        self.logo.state.brightness = Brightness::High;
        self.fan.state.brightness = Brightness::High;
        self.ring.state.brightness = Brightness::High;

        self.fan_mirage = MirageState::DEFAULT;
        self.push_fan_mirage_state()?;

        self.submit_all_components()?;

        info!("Reset all components to their defaults");

        Ok(())
    }

    /// Close the device.
    pub fn close(self) {
        debug!("Closing Wraith Prism session");
    }

    /// Write the frames of a single component, without activating them.
    fn write_component(&mut self, kind: ComponentKind) -> Result<()> {
        if kind == ComponentKind::Ring {
            for frame in self.ring.morse_frames()? {
                self.send(&frame)?;
            }
        }

        let frame = self.component(kind).encode_frame();

        let mut buf = BytesMut::with_capacity(4 + frame.len() + 3);
        buf.put_slice(&[CMD_WRITE, TARGET_CHANNEL, 0x01, 0x00]);
        buf.put_slice(&frame);
        buf.put_bytes(0x00, 3);

        self.transport.send(&buf, SUBMIT_FILLER)?;

        Ok(())
    }

    /// Read both halves of the ring's morse payload.
    fn read_morse_payload(&mut self) -> Result<Vec<u8>> {
        let mut payload = Vec::new();

        for slot in [2, 3] {
            let reply = self.send(&[CMD_READ, TARGET_MORSE, slot])?;
            payload.extend_from_slice(reply.get(MORSE_PAYLOAD_OFFSET..).unwrap_or_default());
        }

        Ok(payload)
    }

    fn send(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.transport.send(payload, DEFAULT_FILLER)
    }
}

fn byte_at(reply: &[u8], offset: usize) -> Result<u8> {
    reply
        .get(offset)
        .copied()
        .ok_or(PrismError::ShortReply { expected: offset + 1, actual: reply.len() })
}
