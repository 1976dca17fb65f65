//! Socket-level HCI event filter
//!
//! A raw HCI socket only delivers the packet types and event codes enabled in
//! its `hci_filter`. The layout below matches the kernel's `struct hci_ufilter`
//! so it can be passed straight to `getsockopt`/`setsockopt`.

use crate::hci::constants::*;
use crate::hci::packet::Opcode;
use bitflags::bitflags;

bitflags! {
    /// Packet types accepted by a filter, one bit per HCI packet indicator
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PacketTypes: u32 {
        const VENDOR = 1 << 0;
        const COMMAND = 1 << HCI_COMMAND_PKT;
        const ACL = 1 << HCI_ACL_PKT;
        const SCO = 1 << HCI_SCO_PKT;
        const EVENT = 1 << HCI_EVENT_PKT;
        const ISO = 1 << HCI_ISO_PKT;
    }
}

const HCI_FLT_EVENT_BITS: u8 = 63;

/// HCI filter structure
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HciFilter {
    type_mask: u32,
    event_mask: [u32; 2],
    opcode: u16,
}

impl HciFilter {
    /// An empty filter that lets nothing through
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter used for plain command transmission: every HCI event
    pub fn all_events() -> Self {
        let mut filter = Self::new();
        filter.set_packet_type(HCI_EVENT_PKT);
        filter.event_mask = [u32::MAX; 2];
        filter
    }

    /// Filter used while scanning: LE meta events only
    pub fn le_meta_only() -> Self {
        let mut filter = Self::new();
        filter.set_packet_type(HCI_EVENT_PKT);
        filter.set_event(EVT_LE_META_EVENT);
        filter
    }

    /// Filter used while waiting for the completion of `opcode`
    pub fn command_response(opcode: Opcode) -> Self {
        let mut filter = Self::new();
        filter.set_packet_type(HCI_EVENT_PKT);
        filter.set_event(EVT_CMD_STATUS);
        filter.set_event(EVT_CMD_COMPLETE);
        filter.set_event(EVT_LE_META_EVENT);
        filter.opcode = opcode.value();
        filter
    }

    pub fn set_packet_type(&mut self, packet_type: u8) {
        let bit = if packet_type == HCI_VENDOR_PKT {
            0
        } else {
            packet_type & 31
        };
        self.type_mask |= 1 << bit;
    }

    pub fn set_event(&mut self, event_code: u8) {
        let bit = event_code & HCI_FLT_EVENT_BITS;
        self.event_mask[(bit >> 5) as usize] |= 1 << (bit & 31);
    }

    pub fn packet_types(&self) -> PacketTypes {
        PacketTypes::from_bits_retain(self.type_mask)
    }

    pub fn accepts_event(&self, event_code: u8) -> bool {
        let bit = event_code & HCI_FLT_EVENT_BITS;
        self.packet_types().contains(PacketTypes::EVENT)
            && self.event_mask[(bit >> 5) as usize] & (1 << (bit & 31)) != 0
    }

    pub fn opcode(&self) -> u16 {
        self.opcode
    }
}
