//! HCI packet structures and parsing
//!
//! This module contains structures and methods for handling HCI packets.

use crate::error::HciError;
use crate::hci::constants::*;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fmt;

/// Two-part command identifier: opcode group field and opcode command field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    pub ogf: u8,
    pub ocf: u16,
}

impl Opcode {
    pub const LE_SET_ADVERTISING_PARAMETERS: Opcode =
        Opcode::new(OGF_LE, OCF_LE_SET_ADVERTISING_PARAMETERS);
    pub const LE_SET_ADVERTISING_DATA: Opcode = Opcode::new(OGF_LE, OCF_LE_SET_ADVERTISING_DATA);
    pub const LE_SET_ADVERTISING_ENABLE: Opcode =
        Opcode::new(OGF_LE, OCF_LE_SET_ADVERTISING_ENABLE);
    pub const LE_SET_SCAN_PARAMETERS: Opcode = Opcode::new(OGF_LE, OCF_LE_SET_SCAN_PARAMETERS);
    pub const LE_SET_SCAN_ENABLE: Opcode = Opcode::new(OGF_LE, OCF_LE_SET_SCAN_ENABLE);

    pub const fn new(ogf: u8, ocf: u16) -> Self {
        Self { ogf, ocf }
    }

    /// Packed 16-bit opcode as it appears on the wire
    pub const fn value(&self) -> u16 {
        ((self.ogf as u16) << 10) | (self.ocf & 0x03ff)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ogf={:#04x} ocf={:#06x}", self.ogf, self.ocf)
    }
}

/// Commands sent by this tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HciCommand {
    LeSetAdvertisingParameters { min_interval: u16, max_interval: u16 },
    LeSetAdvertisingData { data: [u8; ADV_DATA_LEN] },
    LeSetAdvertisingEnable { enable: bool },
    LeSetScanParameters {
        scan_type: u8,
        scan_interval: u16,
        scan_window: u16,
        own_address_type: u8,
        filter_policy: u8,
    },
    LeSetScanEnable { enable: bool, filter_duplicates: bool },
    /// Any opcode with caller-built parameters
    Raw { opcode: Opcode, params: Vec<u8> },
}

impl HciCommand {
    /// Creates a raw command, rejecting parameters the transport cannot carry
    pub fn new(ogf: u8, ocf: u16, params: Vec<u8>) -> Result<Self, HciError> {
        if params.len() > HCI_MAX_PARAM_LEN {
            return Err(HciError::InvalidParamLength(params.len()));
        }
        Ok(Self::Raw {
            opcode: Opcode::new(ogf, ocf),
            params,
        })
    }

    /// Get the opcode for this command
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::LeSetAdvertisingParameters { .. } => Opcode::LE_SET_ADVERTISING_PARAMETERS,
            Self::LeSetAdvertisingData { .. } => Opcode::LE_SET_ADVERTISING_DATA,
            Self::LeSetAdvertisingEnable { .. } => Opcode::LE_SET_ADVERTISING_ENABLE,
            Self::LeSetScanParameters { .. } => Opcode::LE_SET_SCAN_PARAMETERS,
            Self::LeSetScanEnable { .. } => Opcode::LE_SET_SCAN_ENABLE,
            Self::Raw { opcode, .. } => *opcode,
        }
    }

    /// Convert the command to its raw parameter bytes
    pub fn parameters(&self) -> Vec<u8> {
        match self {
            // Intervals go out most significant byte first
            Self::LeSetAdvertisingParameters {
                min_interval,
                max_interval,
            } => {
                let mut params = vec![0u8; 4];
                BigEndian::write_u16(&mut params[0..2], *min_interval);
                BigEndian::write_u16(&mut params[2..4], *max_interval);
                params.extend_from_slice(&LE_ADV_PARAMS_TAIL);
                params
            }

            Self::LeSetAdvertisingData { data } => data.to_vec(),

            Self::LeSetAdvertisingEnable { enable } => vec![*enable as u8],

            Self::LeSetScanParameters {
                scan_type,
                scan_interval,
                scan_window,
                own_address_type,
                filter_policy,
            } => {
                let mut params = vec![0u8; 7];
                params[0] = *scan_type;
                LittleEndian::write_u16(&mut params[1..3], *scan_interval);
                LittleEndian::write_u16(&mut params[3..5], *scan_window);
                params[5] = *own_address_type;
                params[6] = *filter_policy;
                params
            }

            Self::LeSetScanEnable {
                enable,
                filter_duplicates,
            } => vec![*enable as u8, *filter_duplicates as u8],

            Self::Raw { params, .. } => params.clone(),
        }
    }

    /// Convert the command to a raw HCI packet
    pub fn to_packet(&self) -> Vec<u8> {
        let params = self.parameters();

        let mut packet = vec![HCI_COMMAND_PKT, 0, 0, params.len() as u8];
        LittleEndian::write_u16(&mut packet[1..3], self.opcode().value());
        packet.extend_from_slice(&params);
        packet
    }
}

/// HCI Event packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HciEvent {
    pub event_code: u8,
    pub parameter_total_length: u8,
    pub parameters: Vec<u8>,
}

impl HciEvent {
    /// Parse an HCI event from raw bytes (without the packet type byte)
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HCI_EVENT_HDR_SIZE {
            return None;
        }

        let event_code = data[0];
        let parameter_total_length = data[1];
        let end = HCI_EVENT_HDR_SIZE + parameter_total_length as usize;

        if data.len() < end {
            return None;
        }

        Some(HciEvent {
            event_code,
            parameter_total_length,
            parameters: data[HCI_EVENT_HDR_SIZE..end].to_vec(),
        })
    }

    /// Checks whether this is a Command Complete event for `opcode`
    pub fn is_command_complete(&self, opcode: Opcode) -> bool {
        self.event_code == EVT_CMD_COMPLETE
            && self.parameters.len() >= 3
            && LittleEndian::read_u16(&self.parameters[1..3]) == opcode.value()
    }

    /// Checks whether this is a Command Status event for `opcode`
    pub fn is_command_status(&self, opcode: Opcode) -> bool {
        self.event_code == EVT_CMD_STATUS
            && self.parameters.len() >= 4
            && LittleEndian::read_u16(&self.parameters[2..4]) == opcode.value()
    }

    /// Status byte of a Command Complete or Command Status event
    pub fn status(&self) -> Option<u8> {
        match self.event_code {
            EVT_CMD_COMPLETE => self.parameters.get(3).copied(),
            EVT_CMD_STATUS => self.parameters.first().copied(),
            _ => None,
        }
    }

    /// Return parameters of a Command Complete event, status byte first
    pub fn return_parameters(&self) -> &[u8] {
        match self.event_code {
            EVT_CMD_COMPLETE if self.parameters.len() > 3 => &self.parameters[3..],
            _ => &[],
        }
    }
}
