//! In-memory device used by the unit tests
//!
//! Every open, close, filter change, command and read is appended to a shared
//! log. Commands are answered with a Command Complete event carrying the
//! configured status, and queued frames are handed out by `read`.

use crate::cancel::CancelToken;
use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::filter::HciFilter;
use crate::hci::packet::Opcode;
use crate::hci::transport::{Device, Transport};
use byteorder::{ByteOrder, LittleEndian};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Open(usize),
    Close(usize),
    GetFilter(usize),
    SetFilter(usize, HciFilter),
    Send(usize, Opcode, Vec<u8>),
    Read(usize, HciFilter),
}

#[derive(Default)]
struct State {
    ops: Vec<Op>,
    sessions: usize,
    frames: VecDeque<Vec<u8>>,
    statuses: HashMap<Opcode, u8>,
    silent: Vec<Opcode>,
    fail_open: bool,
    fail_send: bool,
    fail_get_filter_after: Option<Opcode>,
    fail_set_filter: Option<HciFilter>,
    cancel_when_drained: Option<CancelToken>,
    fail_read_when_drained: bool,
}

#[derive(Clone, Default)]
pub struct MockDevice {
    state: Rc<RefCell<State>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    /// Commands written so far, in order
    pub fn sent(&self) -> Vec<(Opcode, Vec<u8>)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Send(_, opcode, params) => Some((opcode, params)),
                _ => None,
            })
            .collect()
    }

    pub fn push_frame(&self, frame: Vec<u8>) {
        self.state.borrow_mut().frames.push_back(frame);
    }

    /// Answer `opcode` with a non-zero status
    pub fn reject(&self, opcode: Opcode, status: u8) {
        self.state.borrow_mut().statuses.insert(opcode, status);
    }

    /// Never answer `opcode`
    pub fn ignore(&self, opcode: Opcode) {
        self.state.borrow_mut().silent.push(opcode);
    }

    pub fn fail_open(&self) {
        self.state.borrow_mut().fail_open = true;
    }

    pub fn fail_send(&self) {
        self.state.borrow_mut().fail_send = true;
    }

    /// Fail reading the filter once `opcode` has been sent
    pub fn fail_get_filter_after(&self, opcode: Opcode) {
        self.state.borrow_mut().fail_get_filter_after = Some(opcode);
    }

    /// Refuse installing `filter`
    pub fn fail_set_filter(&self, filter: HciFilter) {
        self.state.borrow_mut().fail_set_filter = Some(filter);
    }

    /// Once no frames are left, set `token` and fail the read with `EINTR`,
    /// as the SIGINT handler would
    pub fn interrupt_when_drained(&self, token: CancelToken) {
        self.state.borrow_mut().cancel_when_drained = Some(token);
    }

    /// Once no frames are left, fail the read with `EIO`
    pub fn fail_read_when_drained(&self) {
        self.state.borrow_mut().fail_read_when_drained = true;
    }
}

/// Filter every mock transport starts with
pub fn initial_filter() -> HciFilter {
    let mut filter = HciFilter::new();
    filter.set_packet_type(HCI_EVENT_PKT);
    filter.set_event(EVT_CMD_COMPLETE);
    filter
}

pub fn command_complete(opcode: Opcode, status: u8) -> Vec<u8> {
    let mut frame = vec![HCI_EVENT_PKT, EVT_CMD_COMPLETE, 4, 1, 0, 0, status];
    LittleEndian::write_u16(&mut frame[4..6], opcode.value());
    frame
}

/// Single-report LE advertising report frame carrying `data`
pub fn advertising_report(address: [u8; 6], data: &[u8], rssi: i8) -> Vec<u8> {
    let mut params = vec![EVT_LE_ADVERTISING_REPORT, 1, 0x00, 0x00];
    params.extend_from_slice(&address);
    params.push(data.len() as u8);
    params.extend_from_slice(data);
    params.push(rssi as u8);

    let mut frame = vec![HCI_EVENT_PKT, EVT_LE_META_EVENT, params.len() as u8];
    frame.extend_from_slice(&params);
    frame
}

pub struct MockTransport {
    id: usize,
    filter: HciFilter,
    responses: VecDeque<Vec<u8>>,
    state: Rc<RefCell<State>>,
}

impl Device for MockDevice {
    type Transport = MockTransport;

    fn open(&self) -> Result<MockTransport, HciError> {
        let mut state = self.state.borrow_mut();
        if state.fail_open {
            return Err(HciError::DeviceOpenFailure(io::Error::from_raw_os_error(
                libc::ENODEV,
            )));
        }
        state.sessions += 1;
        let id = state.sessions;
        state.ops.push(Op::Open(id));

        Ok(MockTransport {
            id,
            filter: initial_filter(),
            responses: VecDeque::new(),
            state: Rc::clone(&self.state),
        })
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Read(self.id, self.filter));

        let frame = match self.responses.pop_front() {
            Some(frame) => frame,
            None => match state.frames.pop_front() {
                Some(frame) => frame,
                None => {
                    if state.fail_read_when_drained {
                        return Err(io::Error::from_raw_os_error(libc::EIO));
                    }
                    if let Some(token) = &state.cancel_when_drained {
                        token.cancel();
                    }
                    return Err(io::Error::from(io::ErrorKind::Interrupted));
                }
            },
        };

        let n = frame.len().min(buf.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Ok(n)
    }

    fn write(&mut self, packet: &[u8]) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_send {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }

        let opcode_value = LittleEndian::read_u16(&packet[1..3]);
        let opcode = Opcode::new((opcode_value >> 10) as u8, opcode_value & 0x03ff);
        state
            .ops
            .push(Op::Send(self.id, opcode, packet[4..].to_vec()));

        if !state.silent.contains(&opcode) {
            let status = state.statuses.get(&opcode).copied().unwrap_or(0);
            self.responses.push_back(command_complete(opcode, status));
        }
        Ok(())
    }

    fn filter(&self) -> io::Result<HciFilter> {
        let mut state = self.state.borrow_mut();
        if let Some(after) = state.fail_get_filter_after {
            let sent = state
                .ops
                .iter()
                .any(|op| matches!(op, Op::Send(_, opcode, _) if *opcode == after));
            if sent {
                return Err(io::Error::from_raw_os_error(libc::EBADF));
            }
        }
        state.ops.push(Op::GetFilter(self.id));
        Ok(self.filter)
    }

    fn set_filter(&mut self, filter: &HciFilter) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_set_filter == Some(*filter) {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        state.ops.push(Op::SetFilter(self.id, *filter));
        self.filter = *filter;
        Ok(())
    }

    fn wait_readable(&self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.responses.is_empty() || !self.state.borrow().frames.is_empty())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.state.borrow_mut().ops.push(Op::Close(self.id));
    }
}
