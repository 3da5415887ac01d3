//! Blocking line editor driver.
//!
//! [`LineEditor`] waits for keyboard input while also watching one external
//! descriptor, typically a network socket. When that descriptor becomes
//! readable the call returns [`ReadOutcome::ExternalReady`] so the caller can
//! drain it; the half-typed line is kept and redrawn on the next call.

use core::time::Duration;
use std::os::unix::io::RawFd;

use crate::editor::{LineState, Step};
use crate::{EditorConfig, History, ReadByte, Result, Terminal};

/// What ended a [`LineEditor::read_line`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Enter was pressed
    Line(String),
    /// The external descriptor is readable; drain it and call again
    ExternalReady,
    /// Ctrl+D on an empty line, or stdin closed
    EndOfInput,
    /// Ctrl+C or `SIGINT`; the session should end
    Interrupted,
}

/// Blocking line editor with full editing and history support.
///
/// One `LineEditor` lives for the whole session and keeps its line state
/// across calls. Raw mode is entered at the start of every
/// [`read_line`](Self::read_line) and restored before it returns, whatever
/// the outcome.
///
/// # Examples
///
/// ```no_run
/// use ttyline::{EditorConfig, History, LineEditor, ReadOutcome, terminals::StdioTerminal};
///
/// let config = EditorConfig::default().with_prompt("[you] ");
/// let mut history = History::from_config(&config);
/// let mut editor = LineEditor::new(&config);
/// let mut terminal = StdioTerminal::new();
///
/// match editor.read_line(&mut terminal, &mut history, None)? {
///     ReadOutcome::Line(line) => println!("Got: {}", line),
///     other => println!("Stopped: {:?}", other),
/// }
/// # Ok::<(), ttyline::Error>(())
/// ```
///
/// # Key Bindings
///
/// - **Left/Right**: Move cursor
/// - **Up/Down**: Navigate history
/// - **Home/End**: Jump to start/end of line
/// - **Backspace/Delete**: Delete characters
/// - **Ctrl+C**: Cancel and end the session
/// - **Ctrl+D**: End the session on an empty line
/// - **Ctrl+Z**: Suspend
/// - **Enter**: Submit line
#[derive(Debug)]
pub struct LineEditor {
    state: LineState,
    poll_interval: Duration,
}

impl LineEditor {
    /// Creates an editor with an empty line.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: LineState::from_config(config),
            poll_interval: config.poll_interval,
        }
    }

    /// The line being edited.
    pub fn state(&self) -> &LineState {
        &self.state
    }

    /// Reads until a line is entered, input ends, the session is
    /// interrupted, or `external` becomes readable.
    ///
    /// Failing to enter raw mode is not fatal; editing continues on a
    /// cooked terminal with degraded display.
    pub fn read_line<T: Terminal>(
        &mut self,
        terminal: &mut T,
        history: &mut History,
        external: Option<RawFd>,
    ) -> Result<ReadOutcome> {
        if let Err(e) = terminal.enter_raw_mode() {
            log::warn!("raw mode unavailable, continuing without it: {}", e);
        }

        let result = self.run(terminal, history, external);

        // Always exit raw mode, even if an error occurred
        if let Err(e) = terminal.exit_raw_mode() {
            log::warn!("failed to restore terminal settings: {}", e);
        }

        if let Ok(outcome) = &result {
            log::debug!("read_line finished: {:?}", outcome);
        }
        result
    }

    fn run<T: Terminal>(
        &mut self,
        terminal: &mut T,
        history: &mut History,
        external: Option<RawFd>,
    ) -> Result<ReadOutcome> {
        self.state.show_prompt(terminal)?;

        loop {
            let events = terminal.take_signals();
            if events.interrupted {
                self.state.cancel(history, terminal)?;
                return Ok(ReadOutcome::Interrupted);
            }
            if events.resumed {
                self.state.handle_resume(terminal)?;
            }
            if events.resized {
                self.state.handle_resize(terminal)?;
            }

            let ready = terminal.wait_for_input(external, self.poll_interval)?;
            if ready.external {
                self.state.hide(terminal)?;
                return Ok(ReadOutcome::ExternalReady);
            }
            if !ready.input {
                continue;
            }

            let byte = match terminal.read_byte()? {
                ReadByte::Byte(byte) => byte,
                // Another reader got there first
                ReadByte::Empty => continue,
                ReadByte::Eof => {
                    self.state.hide(terminal)?;
                    return Ok(ReadOutcome::EndOfInput);
                }
            };

            match self.state.feed(byte, history, terminal)? {
                Step::Continue => {}
                Step::Line(line) => return Ok(ReadOutcome::Line(line)),
                Step::Cancelled => return Ok(ReadOutcome::Interrupted),
                Step::EndOfInput => return Ok(ReadOutcome::EndOfInput),
            }
        }
    }
}
