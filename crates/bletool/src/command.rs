//! Command encoding and one-shot transmission
//!
//! Each call to [`send_command`] runs a complete session of its own: open the
//! device, install a filter passing every HCI event, write the command, close.
//! Nothing waits for the controller's acknowledgement at this layer.

use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::{Device, HciCommand, HciFilter, Opcode, Transport};
use tracing::debug;

/// Decodes a hex string two characters at a time into a bounded payload
pub fn decode_hex(data: &str) -> Result<Vec<u8>, HciError> {
    let bytes = hex::decode(data)?;
    if bytes.len() > HCI_MAX_PARAM_LEN {
        return Err(HciError::InvalidParamLength(bytes.len()));
    }
    Ok(bytes)
}

/// Renders a payload as upper-case hex, two digits per byte
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Opens a session on `device` and sends one command over it
pub fn send_command<D: Device>(device: &D, command: &HciCommand) -> Result<(), HciError> {
    let mut transport = device.open()?;

    transport
        .set_filter(&HciFilter::all_events())
        .map_err(HciError::FilterInstallFailure)?;

    transport
        .send_command(command)
        .map_err(HciError::CommandSendFailure)?;

    debug!(opcode = %command.opcode(), "command sent, closing session");
    Ok(())
}

/// Sends `opcode` with a payload given as a hex string
pub fn send_hex<D: Device>(device: &D, opcode: Opcode, data: &str) -> Result<(), HciError> {
    let params = decode_hex(data)?;
    let command = HciCommand::new(opcode.ogf, opcode.ocf, params)?;
    send_command(device, &command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hci::mock::{MockDevice, Op};

    #[test]
    fn test_hex_round_trip() {
        for hex in ["", "00", "0A1B", "DEADBEEF", "00112233445566778899AABBCCDDEEFF"] {
            let bytes = decode_hex(hex).unwrap();
            assert_eq!(bytes.len(), hex.len() / 2);
            assert_eq!(encode_hex(&bytes), hex);
        }
    }

    #[test]
    fn test_decode_hex_rejects_bad_input() {
        assert!(matches!(decode_hex("ABC"), Err(HciError::InvalidHex(_))));
        assert!(matches!(decode_hex("G0"), Err(HciError::InvalidHex(_))));

        let too_long = "00".repeat(HCI_MAX_PARAM_LEN + 1);
        assert!(matches!(
            decode_hex(&too_long),
            Err(HciError::InvalidParamLength(256))
        ));
    }

    #[test]
    fn test_send_hex_runs_one_session() {
        let device = MockDevice::new();
        send_hex(&device, Opcode::LE_SET_ADVERTISING_ENABLE, "01").unwrap();

        assert_eq!(
            device.ops(),
            vec![
                Op::Open(1),
                Op::SetFilter(1, HciFilter::all_events()),
                Op::Send(1, Opcode::LE_SET_ADVERTISING_ENABLE, vec![0x01]),
                Op::Close(1),
            ]
        );
    }

    #[test]
    fn test_send_hex_validates_before_opening() {
        let device = MockDevice::new();
        let result = send_hex(&device, Opcode::LE_SET_ADVERTISING_DATA, "0");
        assert!(matches!(result, Err(HciError::InvalidHex(_))));
        assert!(device.ops().is_empty());
    }
}
