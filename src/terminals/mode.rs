// termios raw mode control

use std::io;
use std::os::unix::io::RawFd;

use crate::{signals, Error, Result};

/// Reads the current settings of `fd`, switches it to raw mode and returns
/// the previous settings.
///
/// # Errors
///
/// Returns [`Error::TerminalControl`] if `fd` is not a terminal or the
/// attributes cannot be applied.
pub fn enter_raw(fd: RawFd) -> Result<libc::termios> {
    let original = get_attributes(fd)?;
    set_attributes(fd, &make_raw(original))?;
    Ok(original)
}

/// Restores settings returned by [`enter_raw`].
pub fn exit_raw(fd: RawFd, previous: &libc::termios) -> Result<()> {
    set_attributes(fd, previous)
}

/// Raw mode switch that remembers the cooked settings it replaced.
///
/// Exiting without having entered is a no-op, and entering twice reapplies
/// raw settings without overwriting the saved ones, so every successful
/// [`enter_raw`](Self::enter_raw) is undone by exactly one restore. Dropping
/// the value restores the terminal.
#[derive(Debug)]
pub struct TerminalMode {
    fd: RawFd,
    original: Option<libc::termios>,
}

impl TerminalMode {
    /// Creates a controller for `fd` in cooked mode.
    pub fn new(fd: RawFd) -> Self {
        Self { fd, original: None }
    }

    /// The controlled descriptor.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Returns `true` while cooked settings are saved for restoring.
    pub fn is_raw(&self) -> bool {
        self.original.is_some()
    }

    /// Switches to raw mode, saving the cooked settings on first entry.
    pub fn enter_raw(&mut self) -> Result<()> {
        match self.original {
            Some(original) => set_attributes(self.fd, &make_raw(original)),
            None => {
                let original = enter_raw(self.fd)?;
                signals::remember_cooked(self.fd, &original);
                self.original = Some(original);
                Ok(())
            }
        }
    }

    /// Restores the saved cooked settings. A no-op when not raw.
    pub fn exit_raw(&mut self) -> Result<()> {
        if let Some(original) = self.original.take() {
            signals::forget_cooked(self.fd);
            exit_raw(self.fd, &original)?;
        }
        Ok(())
    }

    /// Marks the mode as raw with `original` as the saved settings, without
    /// touching the descriptor.
    #[cfg(test)]
    pub(crate) fn assume_raw(&mut self, original: libc::termios) {
        self.original = Some(original);
    }
}

impl Drop for TerminalMode {
    fn drop(&mut self) {
        if let Err(e) = self.exit_raw() {
            log::warn!("failed to restore terminal settings: {}", e);
        }
    }
}

/// Derives raw settings: no canonical input, echo, signal keys or flow
/// control, and reads that return immediately.
fn make_raw(mut termios: libc::termios) -> libc::termios {
    termios.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG | libc::IEXTEN);
    termios.c_iflag &= !(libc::IXON | libc::ICRNL);
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 0;
    termios
}

fn get_attributes(fd: RawFd) -> Result<libc::termios> {
    unsafe {
        let mut termios: libc::termios = core::mem::zeroed();
        if libc::tcgetattr(fd, &mut termios) != 0 {
            return Err(Error::TerminalControl(io::Error::last_os_error()));
        }
        Ok(termios)
    }
}

fn set_attributes(fd: RawFd, termios: &libc::termios) -> Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(Error::TerminalControl(io::Error::last_os_error()));
    }
    Ok(())
}
