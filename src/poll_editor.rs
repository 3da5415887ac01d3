//! Non-blocking line editor driver.
//!
//! [`PollEditor`] is meant for programs that already own an event loop: the
//! host waits for stdin to become readable and then calls
//! [`process_input`](PollEditor::process_input), which consumes at most one
//! byte and returns straight away. Partial escape sequences carry over to
//! the next call.

use crate::editor::{LineState, Step};
use crate::{EditorConfig, History, ReadByte, Result, Terminal};

/// Result of one [`PollEditor::process_input`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Line not finished yet; call again when input is available
    Pending,
    /// Enter was pressed
    Line(String),
    /// Ctrl+D on an empty line
    EndOfInput,
}

/// Byte-at-a-time line editor for host event loops.
///
/// Raw mode is held from [`start`](Self::start) until
/// [`finish`](Self::finish). The [`LineState`] is emptied by every finished
/// line and reused for the next one. Ctrl+C only discards the current line;
/// the console keeps running.
///
/// # Examples
///
/// ```no_run
/// use ttyline::{EditorConfig, History, PollEditor, PollStatus, terminals::StdioTerminal};
///
/// let config = EditorConfig::default().with_prompt("server> ");
/// let mut history = History::from_config(&config);
/// let mut console = PollEditor::new(&config);
/// let mut terminal = StdioTerminal::new();
///
/// console.start(&mut terminal);
/// loop {
///     // ... host loop waits for stdin readiness here ...
///     match console.process_input(&mut terminal, &mut history)? {
///         PollStatus::Pending => continue,
///         PollStatus::Line(line) => println!("command: {}", line),
///         PollStatus::EndOfInput => break,
///     }
/// }
/// console.finish(&mut terminal);
/// # Ok::<(), ttyline::Error>(())
/// ```
#[derive(Debug)]
pub struct PollEditor {
    state: LineState,
}

impl PollEditor {
    /// Creates a console editor with an empty line.
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: LineState::from_config(config),
        }
    }

    /// The line being edited.
    pub fn state(&self) -> &LineState {
        &self.state
    }

    /// Enters raw mode for the session. Failure is logged and editing
    /// continues on a cooked terminal.
    pub fn start<T: Terminal>(&mut self, terminal: &mut T) {
        if let Err(e) = terminal.enter_raw_mode() {
            log::warn!("raw mode unavailable, continuing without it: {}", e);
        }
    }

    /// Leaves raw mode.
    pub fn finish<T: Terminal>(&mut self, terminal: &mut T) {
        if let Err(e) = terminal.exit_raw_mode() {
            log::warn!("failed to restore terminal settings: {}", e);
        }
    }

    /// Clears the prompt row so the host can print its own output. The line
    /// is kept and redrawn by the next [`process_input`](Self::process_input).
    pub fn hide_prompt<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        self.state.hide(terminal)
    }

    /// Handles pending signals, then at most one input byte.
    ///
    /// Never blocks. Safe to call when no input is available; it only makes
    /// sure the prompt is on screen. Returns [`PollStatus::EndOfInput`] once
    /// the input has been closed.
    pub fn process_input<T: Terminal>(
        &mut self,
        terminal: &mut T,
        history: &mut History,
    ) -> Result<PollStatus> {
        let events = terminal.take_signals();
        if events.interrupted {
            log::debug!("interrupt: discarding current line");
            self.state.cancel(history, terminal)?;
        }
        if events.resumed {
            self.state.handle_resume(terminal)?;
        }
        if events.resized {
            self.state.handle_resize(terminal)?;
        }

        self.state.show_prompt(terminal)?;

        let byte = match terminal.read_byte()? {
            ReadByte::Byte(byte) => byte,
            ReadByte::Empty => return Ok(PollStatus::Pending),
            ReadByte::Eof => {
                log::debug!("console input closed");
                self.state.hide(terminal)?;
                return Ok(PollStatus::EndOfInput);
            }
        };

        match self.state.feed(byte, history, terminal)? {
            Step::Continue | Step::Cancelled => Ok(PollStatus::Pending),
            Step::Line(line) => Ok(PollStatus::Line(line)),
            Step::EndOfInput => Ok(PollStatus::EndOfInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTerminal;
    use crate::{DecoderState, SignalEvents};

    fn console() -> PollEditor {
        PollEditor::new(&EditorConfig::default().with_prompt("srv> "))
    }

    fn pump(console: &mut PollEditor, term: &mut MockTerminal, history: &mut History, calls: usize) -> Vec<PollStatus> {
        (0..calls)
            .map(|_| console.process_input(term, history).unwrap())
            .collect()
    }

    #[test]
    fn test_no_input_is_noop() {
        let mut console = console();
        let mut term = MockTerminal::new();
        let mut history = History::new(100);

        assert_eq!(console.process_input(&mut term, &mut history).unwrap(), PollStatus::Pending);
        assert_eq!(term.output_str(), "\r\x1b[Ksrv> \x1b[6G");

        // Prompt is not printed again
        term.output.clear();
        assert_eq!(console.process_input(&mut term, &mut history).unwrap(), PollStatus::Pending);
        assert!(term.output.is_empty());
    }

    #[test]
    fn test_one_byte_per_call() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"list\r");
        let mut history = History::new(100);

        let statuses = pump(&mut console, &mut term, &mut history, 5);
        assert_eq!(statuses[..4], [PollStatus::Pending, PollStatus::Pending, PollStatus::Pending, PollStatus::Pending]);
        assert_eq!(statuses[4], PollStatus::Line("list".to_string()));
        assert_eq!(history.len(), 1);

        // Fresh state for the next line
        assert!(console.state().is_empty());
        assert!(!console.state().prompt_visible());
    }

    #[test]
    fn test_escape_sequence_spans_calls() {
        let mut console = console();
        let mut term = MockTerminal::new();
        let mut history = History::new(100);
        history.append("broadcast hi");

        term.input.extend(b"\x1b[");
        pump(&mut console, &mut term, &mut history, 2);
        assert_eq!(console.state().decoder_state(), DecoderState::Bracket);

        // Nothing available in between
        pump(&mut console, &mut term, &mut history, 3);
        assert_eq!(console.state().decoder_state(), DecoderState::Bracket);

        term.input.push_back(b'A');
        pump(&mut console, &mut term, &mut history, 1);
        assert_eq!(console.state().as_str(), "broadcast hi");
    }

    #[test]
    fn test_interrupt_byte_cancels_line_only() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"send 1\x03list\r");
        let mut history = History::new(100);

        let statuses = pump(&mut console, &mut term, &mut history, 12);
        assert_eq!(statuses.last(), Some(&PollStatus::Line("list".to_string())));
        assert!(term.output_str().contains("^C\r\n"));
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["list"]);
    }

    #[test]
    fn test_sigint_flag_cancels_line_and_continues() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"abc");
        let mut history = History::new(100);
        pump(&mut console, &mut term, &mut history, 3);

        term.signals.push_back(SignalEvents {
            interrupted: true,
            ..SignalEvents::default()
        });
        term.input.extend(b"x\r");
        let statuses = pump(&mut console, &mut term, &mut history, 2);
        assert_eq!(statuses[1], PollStatus::Line("x".to_string()));
    }

    #[test]
    fn test_hide_prompt_redraws_on_next_call() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"ab");
        let mut history = History::new(100);
        pump(&mut console, &mut term, &mut history, 2);

        console.hide_prompt(&mut term).unwrap();
        term.output.clear();
        pump(&mut console, &mut term, &mut history, 1);
        assert_eq!(term.output_str(), "\r\x1b[Ksrv> ab\x1b[8G");
    }

    #[test]
    fn test_closed_input_is_end_of_input() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"li");
        term.closed = true;
        let mut history = History::new(100);

        let statuses = pump(&mut console, &mut term, &mut history, 3);
        assert_eq!(statuses, vec![PollStatus::Pending, PollStatus::Pending, PollStatus::EndOfInput]);
        assert!(!console.state().prompt_visible());
        assert!(history.is_empty());
    }

    #[test]
    fn test_pasted_crlf_lines() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"list\r\nquit\r\n");
        let mut history = History::new(100);

        let lines: Vec<_> = pump(&mut console, &mut term, &mut history, 12)
            .into_iter()
            .filter(|status| *status != PollStatus::Pending)
            .collect();
        assert_eq!(lines, vec![PollStatus::Line("list".to_string()), PollStatus::Line("quit".to_string())]);
    }

    #[test]
    fn test_end_of_input_on_empty_line() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"\x04");
        let mut history = History::new(100);

        assert_eq!(console.process_input(&mut term, &mut history).unwrap(), PollStatus::EndOfInput);
    }

    #[test]
    fn test_start_and_finish_manage_raw_mode() {
        let mut console = console();
        let mut term = MockTerminal::new();
        console.start(&mut term);
        assert!(term.raw);
        console.finish(&mut term);
        assert!(!term.raw);
        console.finish(&mut term);
        assert_eq!(term.raw_exits, 1);
    }

    #[test]
    fn test_start_tolerates_raw_mode_failure() {
        let mut console = console();
        let mut term = MockTerminal::with_input(b"ok\r");
        term.fail_raw_mode = true;
        let mut history = History::new(100);

        console.start(&mut term);
        let statuses = pump(&mut console, &mut term, &mut history, 3);
        assert_eq!(statuses[2], PollStatus::Line("ok".to_string()));
    }
}
