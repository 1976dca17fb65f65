//! HCI protocol constants
//!
//! This module contains constants used in the Bluetooth HCI protocol and the
//! Linux HCI socket interface.

// Bluetooth socket constants
pub const AF_BLUETOOTH: i32 = 31;
pub const BTPROTO_HCI: i32 = 1;
pub const HCI_CHANNEL_RAW: u16 = 0;
pub const SOL_HCI: i32 = 0;
pub const HCI_FILTER: i32 = 2;

// HCI packet types
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACL_PKT: u8 = 0x02;
pub const HCI_SCO_PKT: u8 = 0x03;
pub const HCI_EVENT_PKT: u8 = 0x04;
pub const HCI_ISO_PKT: u8 = 0x05;
pub const HCI_VENDOR_PKT: u8 = 0xFF;

// Maximum size of HCI command parameters
pub const HCI_MAX_PARAM_LEN: usize = 255;

// Event header (event code + parameter length) and maximum event size
pub const HCI_EVENT_HDR_SIZE: usize = 2;
pub const HCI_MAX_EVENT_SIZE: usize = 260;

// OGF (Opcode Group Field) values
pub const OGF_HOST_CTL: u8 = 0x03;
pub const OGF_LE: u8 = 0x08;

// Host Controller Commands (OGF: 0x03)
pub const OCF_RESET: u16 = 0x0003;

// LE Command OCF values (OGF: 0x08)
pub const OCF_LE_SET_ADVERTISING_PARAMETERS: u16 = 0x0006;
pub const OCF_LE_SET_ADVERTISING_DATA: u16 = 0x0008;
pub const OCF_LE_SET_ADVERTISING_ENABLE: u16 = 0x000A;
pub const OCF_LE_SET_SCAN_PARAMETERS: u16 = 0x000B;
pub const OCF_LE_SET_SCAN_ENABLE: u16 = 0x000C;

// HCI Events
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
pub const EVT_LE_META_EVENT: u8 = 0x3E;

// LE Meta Events
pub const EVT_LE_ADVERTISING_REPORT: u8 = 0x02;

// LE scan parameters
pub const LE_SCAN_PASSIVE: u8 = 0x00;
pub const LE_SCAN_INTERVAL: u16 = 0x0010; // 10 ms
pub const LE_SCAN_WINDOW: u16 = 0x0010; // 10 ms
pub const LE_PUBLIC_ADDRESS: u8 = 0x00;
pub const LE_FILTER_POLICY_ACCEPT_ALL: u8 = 0x00;

// Advertising parameters after the two intervals: advertising type, own
// address type, peer address type, peer address, channel map (all three
// channels), filter policy.
pub const LE_ADV_PARAMS_TAIL: [u8; 9] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0x00];

// Advertising data header: flags, 16-bit service UUID list, service data
pub const ADV_DATA_HEADER: &str = "1F0201060303AAFE1716AAFE80";
pub const ADV_DATA_LEN: usize = 32;

// Timeout used by the request helper for scan commands
pub const HCI_REQUEST_TIMEOUT_MS: u64 = 1000;

// ioctl requests on a raw HCI socket
pub const HCI_MAX_DEV: usize = 16;
pub const HCI_DEV_UP: u32 = 0;

const IOC_READ: libc::c_ulong = 2;

const fn ior_int(nr: libc::c_ulong) -> libc::c_ulong {
    (IOC_READ << 30)
        | ((b'H' as libc::c_ulong) << 8)
        | nr
        | ((std::mem::size_of::<libc::c_int>() as libc::c_ulong) << 16)
}

pub const HCIGETDEVLIST: libc::c_ulong = ior_int(210);
