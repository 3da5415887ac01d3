//! Raw-mode line editor with command history for Unix terminals.
//!
//! This library provides readline-style input over a non-canonical terminal,
//! built to be shared by two very different call sites: an interactive client
//! that multiplexes the keyboard against a network socket, and a server
//! console that is fed one keystroke at a time from a larger event loop.
//!
//! # Features
//!
//! - **Line editing**: Insert, backspace, delete, cursor movement, Home/End
//! - **Command history**: 100-entry ring with up/down navigation; the line
//!   being typed is kept as a draft and restored when scrolling back down
//! - **Incremental key decoding**: CSI and SS3 sequences are decoded one byte
//!   at a time, so partial sequences survive across non-blocking polls
//! - **Job control**: Ctrl+Z / `SIGTSTP` drops back to cooked mode before the
//!   process stops, and raw mode is re-armed after `SIGCONT`
//! - **Resize aware**: the line is redrawn after `SIGWINCH`
//! - **Raw mode restoration** on every exit path, including fatal signals
//!
//! # Quick Start
//!
//! ```no_run
//! use ttyline::{EditorConfig, History, LineEditor, ReadOutcome, terminals::StdioTerminal};
//!
//! let config = EditorConfig::default().with_prompt("> ");
//! let mut history = History::from_config(&config);
//! let mut editor = LineEditor::new(&config);
//! let mut terminal = StdioTerminal::new();
//! ttyline::signals::install()?;
//!
//! loop {
//!     match editor.read_line(&mut terminal, &mut history, None)? {
//!         ReadOutcome::Line(line) if line == "exit" => break,
//!         ReadOutcome::Line(line) => println!("You typed: {}", line),
//!         ReadOutcome::ExternalReady => {}
//!         ReadOutcome::EndOfInput | ReadOutcome::Interrupted => break,
//!     }
//! }
//! # Ok::<(), ttyline::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`History`]: bounded ring of past lines with a navigation cursor
//! - [`EscapeDecoder`]: byte-driven state machine producing [`KeyEvent`]s
//! - [`LineState`]: line buffer, cursor, saved draft and redraw logic
//! - [`signals`]: async-signal-safe flags for resize, interrupt and resume
//! - [`terminals`]: termios raw mode control and the stdio [`Terminal`]
//! - [`LineEditor`] and [`PollEditor`]: the blocking and non-blocking drivers
//!
//! All I/O is abstracted through the [`Terminal`] trait, so both drivers can
//! be exercised against scripted input.

#[cfg(not(unix))]
compile_error!("ttyline needs a Unix terminal (termios and POSIX signals)");

use core::time::Duration;
use std::io;
use std::os::unix::io::RawFd;

mod buffer;
mod config;
mod decoder;
mod editor;
mod history;
mod poll_editor;
pub mod signals;
mod sync_editor;
pub mod terminals;

#[cfg(test)]
mod test_support;

pub use buffer::{is_printable, LineBuffer};
pub use config::{
    EditorConfig, DEFAULT_HISTORY_CAPACITY, DEFAULT_LINE_CAPACITY, DEFAULT_POLL_INTERVAL,
};
pub use decoder::{DecoderState, EscapeDecoder, KeyEvent, ESCAPE_CAPACITY};
pub use editor::{LineState, Step};
pub use history::History;
pub use poll_editor::{PollEditor, PollStatus};
pub use signals::SignalEvents;
pub use sync_editor::{LineEditor, ReadOutcome};

/// Error type for ttyline operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the terminal or the watched descriptor
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Terminal attributes could not be queried or applied
    #[error("terminal control failed: {0}")]
    TerminalControl(#[source] io::Error),

    /// A signal handler could not be installed
    #[error("failed to install handler for signal {signal}: {source}")]
    SignalInstall {
        signal: i32,
        #[source]
        source: io::Error,
    },

    /// Line contents were not valid UTF-8
    #[error("Invalid UTF-8")]
    InvalidUtf8,
}

impl From<core::str::Utf8Error> for Error {
    fn from(_: core::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}

/// Result type for ttyline operations
pub type Result<T> = core::result::Result<T, Error>;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub cols: u16,
    pub rows: u16,
}

/// Result of a non-blocking [`Terminal::read_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadByte {
    /// One byte of input
    Byte(u8),
    /// Nothing available right now
    Empty,
    /// The input side was closed
    Eof,
}

/// Which descriptors became readable during [`Terminal::wait_for_input`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// Keyboard input is available
    pub input: bool,
    /// The external descriptor is readable
    pub external: bool,
}

/// Terminal abstraction shared by both drivers.
///
/// Implementors supply byte I/O, raw-mode control and a readiness wait. The
/// cursor helpers default to ANSI escape sequences, and the signal and size
/// hooks default to "nothing happened", so a scripted terminal only needs the
/// required methods.
///
/// # Example
///
/// ```
/// use std::collections::VecDeque;
/// use std::os::unix::io::RawFd;
/// use std::time::Duration;
/// use ttyline::{ReadByte, Readiness, Result, Terminal};
///
/// struct MockTerminal {
///     input: VecDeque<u8>,
///     output: Vec<u8>,
/// }
///
/// impl Terminal for MockTerminal {
///     fn read_byte(&mut self) -> Result<ReadByte> {
///         Ok(self.input.pop_front().map_or(ReadByte::Empty, ReadByte::Byte))
///     }
///
///     fn wait_for_input(&mut self, _: Option<RawFd>, _: Duration) -> Result<Readiness> {
///         Ok(Readiness { input: true, external: false })
///     }
///
///     fn write(&mut self, data: &[u8]) -> Result<()> {
///         self.output.extend_from_slice(data);
///         Ok(())
///     }
///
///     // ... implement other methods
/// #   fn flush(&mut self) -> Result<()> { Ok(()) }
/// #   fn enter_raw_mode(&mut self) -> Result<()> { Ok(()) }
/// #   fn exit_raw_mode(&mut self) -> Result<()> { Ok(()) }
/// }
/// ```
pub trait Terminal {
    /// Reads one byte if one is available.
    ///
    /// Must not block, whether or not raw mode is active: returns
    /// [`ReadByte::Empty`] when nothing is buffered and [`ReadByte::Eof`]
    /// once the input has been closed.
    fn read_byte(&mut self) -> Result<ReadByte>;

    /// Waits until keyboard input or `external` becomes readable, or until
    /// `timeout` passes. An interrupted wait returns an empty [`Readiness`].
    fn wait_for_input(&mut self, external: Option<RawFd>, timeout: Duration) -> Result<Readiness>;

    /// Writes raw bytes to the output.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flushes any buffered output.
    fn flush(&mut self) -> Result<()>;

    /// Switches to raw mode: no line buffering, no echo, no signal keys.
    fn enter_raw_mode(&mut self) -> Result<()>;

    /// Restores the settings saved by [`enter_raw_mode`](Self::enter_raw_mode).
    ///
    /// Must be a no-op if raw mode was never entered.
    fn exit_raw_mode(&mut self) -> Result<()>;

    /// Current size, if the terminal can report one.
    fn window_size(&mut self) -> Option<TermSize> {
        None
    }

    /// Collects signal notifications raised since the last call.
    fn take_signals(&mut self) -> SignalEvents {
        SignalEvents::default()
    }

    /// Suspends the process as if Ctrl+Z had reached the tty driver.
    fn suspend(&mut self) -> Result<()> {
        Ok(())
    }

    /// Re-arms the terminal after the process was continued.
    fn resume(&mut self) -> Result<()> {
        self.enter_raw_mode()
    }

    /// Moves the cursor left by one position.
    fn cursor_left(&mut self) -> Result<()> {
        self.write(b"\x1b[D")
    }

    /// Moves the cursor right by one position.
    fn cursor_right(&mut self) -> Result<()> {
        self.write(b"\x1b[C")
    }

    /// Clears from the cursor position to the end of the line.
    fn clear_eol(&mut self) -> Result<()> {
        self.write(b"\x1b[K")
    }

    /// Moves the cursor to an absolute, zero-based column on the current row.
    fn cursor_to_column(&mut self, column: usize) -> Result<()> {
        self.write(format!("\x1b[{}G", column + 1).as_bytes())
    }
}
