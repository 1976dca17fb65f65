//! HCI Socket implementation for Bluetooth communication
//!
//! This module provides a wrapper around the raw HCI socket interface,
//! allowing for communication with Bluetooth controllers.

use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::filter::HciFilter;
use crate::hci::transport::{Device, Transport};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::debug;

/// Represents an HCI socket
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
    dev_id: u16,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct HciDevReq {
    dev_id: u16,
    dev_opt: u32,
}

#[repr(C)]
struct HciDevListReq {
    dev_num: u16,
    dev_req: [HciDevReq; HCI_MAX_DEV],
}

fn raw_socket() -> io::Result<RawFd> {
    let fd = unsafe {
        libc::socket(
            AF_BLUETOOTH,
            libc::SOCK_RAW | libc::SOCK_CLOEXEC,
            BTPROTO_HCI,
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

impl HciSocket {
    /// Opens a raw HCI socket bound to `dev_id`
    pub fn open(dev_id: u16) -> Result<Self, HciError> {
        let fd = raw_socket().map_err(HciError::DeviceOpenFailure)?;

        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW,
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(HciError::DeviceOpenFailure(err));
        }

        debug!(dev_id, fd, "opened HCI socket");
        Ok(HciSocket { fd, dev_id })
    }

    pub fn dev_id(&self) -> u16 {
        self.dev_id
    }
}

impl Transport for HciSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn write(&mut self, packet: &[u8]) -> io::Result<()> {
        let n = unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n as usize != packet.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "short write on HCI socket",
            ));
        }
        Ok(())
    }

    fn filter(&self) -> io::Result<HciFilter> {
        let mut filter = HciFilter::new();
        let mut len = std::mem::size_of::<HciFilter>() as libc::socklen_t;
        let result = unsafe {
            libc::getsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                &mut filter as *mut HciFilter as *mut libc::c_void,
                &mut len,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(filter)
    }

    fn set_filter(&mut self, filter: &HciFilter) -> io::Result<()> {
        let result = unsafe {
            libc::setsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                filter as *const HciFilter as *const libc::c_void,
                std::mem::size_of::<HciFilter>() as libc::socklen_t,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        // Set up the fd_set for select()
        let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
        unsafe {
            libc::FD_ZERO(&mut read_fds);
            libc::FD_SET(self.fd, &mut read_fds);
        }

        let mut timeout_val = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        let result = unsafe {
            libc::select(
                self.fd + 1,
                &mut read_fds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut timeout_val,
            )
        };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(result > 0)
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        debug!(dev_id = self.dev_id, fd = self.fd, "closing HCI socket");
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// A local adapter addressed by its `hciN` name, falling back to the first
/// adapter that is up when the name does not resolve
#[derive(Debug, Clone)]
pub struct HciDevice {
    name: String,
}

impl HciDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the adapter id the next `open` will bind to
    pub fn resolve(&self) -> Result<u16, HciError> {
        let devices = list_devices().map_err(HciError::DeviceOpenFailure)?;

        if let Some(id) = parse_device_name(&self.name) {
            if devices.iter().any(|dev| dev.dev_id == id) {
                return Ok(id);
            }
        }

        // Default route: first adapter that is up
        devices
            .iter()
            .find(|dev| dev.dev_opt & (1 << HCI_DEV_UP) != 0)
            .map(|dev| dev.dev_id)
            .ok_or_else(|| {
                HciError::DeviceOpenFailure(io::Error::from_raw_os_error(libc::ENODEV))
            })
    }
}

impl Device for HciDevice {
    type Transport = HciSocket;

    fn open(&self) -> Result<HciSocket, HciError> {
        let dev_id = self.resolve()?;
        HciSocket::open(dev_id)
    }
}

/// Parses an adapter name of the form `hciN`
pub fn parse_device_name(name: &str) -> Option<u16> {
    name.strip_prefix("hci")
        .filter(|id| !id.is_empty())
        .and_then(|id| id.parse().ok())
}

fn list_devices() -> io::Result<Vec<HciDevReq>> {
    let fd = raw_socket()?;

    let mut request = HciDevListReq {
        dev_num: HCI_MAX_DEV as u16,
        dev_req: [HciDevReq::default(); HCI_MAX_DEV],
    };

    let result = unsafe {
        libc::ioctl(
            fd,
            HCIGETDEVLIST as _,
            &mut request as *mut HciDevListReq as *mut libc::c_void,
        )
    };
    let err = io::Error::last_os_error();
    unsafe { libc::close(fd) };

    if result < 0 {
        return Err(err);
    }

    let count = (request.dev_num as usize).min(HCI_MAX_DEV);
    Ok(request.dev_req[..count].to_vec())
}
