// Unix terminal implementation using termios, poll(2) and ANSI escape codes

use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use super::mode::TerminalMode;
use crate::{signals, Error, ReadByte, Readiness, Result, SignalEvents, TermSize, Terminal};

/// Unix terminal on stdin/stdout.
///
/// Input is read from fd 0 with `read(2)` one byte at a time rather than
/// through `std::io::Stdin`, whose internal buffer would hide bytes from
/// `poll`. Every read is preceded by a zero-timeout `poll`, so reads stay
/// non-blocking even when raw mode could not be entered.
pub struct StdioTerminal {
    stdout: io::Stdout,
    mode: TerminalMode,
}

impl StdioTerminal {
    /// Creates a terminal on stdin and stdout, initially in cooked mode.
    pub fn new() -> Self {
        Self::with_input_fd(io::stdin().as_raw_fd())
    }

    fn with_input_fd(fd: RawFd) -> Self {
        Self {
            stdout: io::stdout(),
            mode: TerminalMode::new(fd),
        }
    }

    /// Returns `true` while raw mode is active.
    pub fn is_raw(&self) -> bool {
        self.mode.is_raw()
    }

    fn input_fd(&self) -> RawFd {
        self.mode.fd()
    }

    /// Leaves raw mode, runs `stop` and re-enters raw mode if it was active.
    /// Mode switch failures are logged, not returned.
    fn suspend_with(&mut self, stop: impl FnOnce() -> Result<()>) -> Result<()> {
        let was_raw = self.mode.is_raw();
        if let Err(e) = self.mode.exit_raw() {
            log::warn!("could not restore terminal before suspending: {}", e);
        }
        stop()?;
        if was_raw {
            if let Err(e) = self.mode.enter_raw() {
                log::warn!("could not re-enter raw mode after suspend: {}", e);
            }
        }
        Ok(())
    }
}

impl Default for StdioTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdioTerminal {
    fn read_byte(&mut self) -> Result<ReadByte> {
        // Cooked terminals and pipes ignore VMIN, so never read unless poll
        // says it will return at once
        if !self.wait_for_input(None, Duration::ZERO)?.input {
            return Ok(ReadByte::Empty);
        }

        let mut byte = 0u8;
        loop {
            let n = unsafe { libc::read(self.input_fd(), (&mut byte as *mut u8).cast(), 1) };
            if n == 1 {
                return Ok(ReadByte::Byte(byte));
            }
            if n == 0 {
                return Ok(ReadByte::Eof);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(ReadByte::Empty),
                _ => return Err(Error::Io(err)),
            }
        }
    }

    fn wait_for_input(&mut self, external: Option<RawFd>, timeout: Duration) -> Result<Readiness> {
        let mut fds = [
            libc::pollfd {
                fd: self.input_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: external.unwrap_or(-1),
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        let nfds: libc::nfds_t = if external.is_some() { 2 } else { 1 };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        let ready = unsafe { libc::poll(fds.as_mut_ptr(), nfds, timeout_ms) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Readiness::default());
            }
            return Err(Error::Io(err));
        }

        let readable = libc::POLLIN | libc::POLLHUP | libc::POLLERR;
        Ok(Readiness {
            input: fds[0].revents & readable != 0,
            external: external.is_some() && fds[1].revents & readable != 0,
        })
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stdout.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        self.mode.enter_raw()
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        self.mode.exit_raw()
    }

    fn window_size(&mut self) -> Option<TermSize> {
        let mut ws: libc::winsize = unsafe { core::mem::zeroed() };
        let result = unsafe { libc::ioctl(self.stdout.as_raw_fd(), libc::TIOCGWINSZ, &mut ws) };
        if result == -1 || ws.ws_col == 0 {
            return None;
        }
        Some(TermSize {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    }

    fn take_signals(&mut self) -> SignalEvents {
        signals::take_pending()
    }

    fn suspend(&mut self) -> Result<()> {
        self.suspend_with(signals::raise_suspend)
    }

    fn resume(&mut self) -> Result<()> {
        if let Err(e) = signals::rearm_suspend() {
            log::warn!("could not reinstall SIGTSTP handler: {}", e);
        }
        if self.mode.is_raw() {
            self.mode.enter_raw()?;
        }
        Ok(())
    }
}

impl Drop for StdioTerminal {
    fn drop(&mut self) {
        let _ = self.stdout.flush();
        let _ = self.exit_raw_mode();
    }
}
