use std::collections::VecDeque;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::{Error, ReadByte, Readiness, Result, SignalEvents, TermSize, Terminal};

/// Scripted terminal for driver tests.
///
/// Bytes are served from `input`; once it runs dry reads report
/// [`ReadByte::Eof`] if `closed` is set and [`ReadByte::Empty`] otherwise.
/// Each `wait_for_input` pops the next scripted readiness (keyboard-ready once
/// the script runs out) and each `take_signals` pops the next scripted signal
/// batch.
#[derive(Debug, Default)]
pub struct MockTerminal {
    pub input: VecDeque<u8>,
    pub closed: bool,
    pub output: Vec<u8>,
    pub readiness: VecDeque<Readiness>,
    pub signals: VecDeque<SignalEvents>,
    pub size: Option<TermSize>,
    pub fail_raw_mode: bool,
    pub raw: bool,
    pub raw_entries: usize,
    pub raw_exits: usize,
    pub suspends: usize,
    pub waits: usize,
}

impl MockTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(bytes: &[u8]) -> Self {
        let mut term = Self::new();
        term.input.extend(bytes);
        term
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Terminal for MockTerminal {
    fn read_byte(&mut self) -> Result<ReadByte> {
        Ok(match self.input.pop_front() {
            Some(byte) => ReadByte::Byte(byte),
            None if self.closed => ReadByte::Eof,
            None => ReadByte::Empty,
        })
    }

    fn wait_for_input(&mut self, _external: Option<RawFd>, _timeout: Duration) -> Result<Readiness> {
        self.waits += 1;
        Ok(self.readiness.pop_front().unwrap_or(Readiness {
            input: true,
            external: false,
        }))
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        if self.fail_raw_mode {
            return Err(Error::TerminalControl(io::Error::from_raw_os_error(libc::ENOTTY)));
        }
        self.raw = true;
        self.raw_entries += 1;
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        if self.raw {
            self.raw = false;
            self.raw_exits += 1;
        }
        Ok(())
    }

    fn window_size(&mut self) -> Option<TermSize> {
        self.size
    }

    fn take_signals(&mut self) -> SignalEvents {
        self.signals.pop_front().unwrap_or_default()
    }

    fn suspend(&mut self) -> Result<()> {
        self.suspends += 1;
        Ok(())
    }
}
