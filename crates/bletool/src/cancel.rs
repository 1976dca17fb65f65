//! Cooperative cancellation driven by the interrupt signal
//!
//! The SIGINT handler does one thing: it sets the [`CancelToken`] handed out by
//! [`interrupt_token`]. It is installed without `SA_RESTART`, so a blocked
//! `read` on the HCI socket returns `EINTR` and the event reader gets a chance
//! to look at the token.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared flag telling a blocking loop to stop
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

static INTERRUPT_TOKEN: OnceLock<CancelToken> = OnceLock::new();

extern "C" fn on_interrupt(_: libc::c_int) {
    if let Some(token) = INTERRUPT_TOKEN.get() {
        token.cancel();
    }
}

/// Installs the SIGINT handler (once) and returns the token it sets
pub fn interrupt_token() -> io::Result<CancelToken> {
    if let Some(token) = INTERRUPT_TOKEN.get() {
        return Ok(token.clone());
    }
    let token = INTERRUPT_TOKEN.get_or_init(CancelToken::new).clone();

    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = on_interrupt as usize;
        sa.sa_flags = 0;
        libc::sigemptyset(&mut sa.sa_mask);
        if libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut()) < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(token)
}
