//! Line editing state shared by both drivers.
//!
//! [`LineState`] owns the buffer, cursor, draft and decoder for the line
//! being typed. Drivers only decide where the next byte comes from and what
//! to do with a finished line; every edit goes through here.

use unicode_width::UnicodeWidthStr;

use crate::decoder::{DecoderState, EscapeDecoder, KeyEvent};
use crate::{EditorConfig, History, LineBuffer, Result, TermSize, Terminal};

/// Result of feeding one byte or key event to a [`LineState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep reading
    Continue,
    /// Enter was pressed; the committed line
    Line(String),
    /// Ctrl+C cleared the line
    Cancelled,
    /// Ctrl+D on an empty line
    EndOfInput,
}

/// Buffer, cursor and display state for one input line.
///
/// History is borrowed per call rather than owned, so the same
/// [`History`] can outlive any number of line states.
///
/// # Examples
///
/// ```
/// use ttyline::{History, LineState, Step};
/// # use std::os::unix::io::RawFd;
/// # use std::time::Duration;
/// # use ttyline::{ReadByte, Readiness, Result, Terminal};
/// # struct Sink(Vec<u8>);
/// # impl Terminal for Sink {
/// #   fn read_byte(&mut self) -> Result<ReadByte> { Ok(ReadByte::Empty) }
/// #   fn wait_for_input(&mut self, _: Option<RawFd>, _: Duration) -> Result<Readiness> { Ok(Readiness::default()) }
/// #   fn write(&mut self, data: &[u8]) -> Result<()> { self.0.extend_from_slice(data); Ok(()) }
/// #   fn flush(&mut self) -> Result<()> { Ok(()) }
/// #   fn enter_raw_mode(&mut self) -> Result<()> { Ok(()) }
/// #   fn exit_raw_mode(&mut self) -> Result<()> { Ok(()) }
/// # }
/// # let mut terminal = Sink(Vec::new());
///
/// let mut history = History::new(100);
/// let mut state = LineState::new("> ", 1024);
///
/// for byte in b"hello\r" {
///     if let Step::Line(line) = state.feed(*byte, &mut history, &mut terminal)? {
///         assert_eq!(line, "hello");
///     }
/// }
/// assert_eq!(history.len(), 1);
/// # Ok::<(), ttyline::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LineState {
    line: LineBuffer,
    saved_draft: Option<String>,
    decoder: EscapeDecoder,
    prompt: String,
    prompt_width: usize,
    prompt_visible: bool,
    term_size: Option<TermSize>,
}

impl LineState {
    /// Creates an empty line with the given prompt and buffer capacity.
    pub fn new(prompt: impl Into<String>, line_capacity: usize) -> Self {
        let prompt = prompt.into();
        Self {
            line: LineBuffer::new(line_capacity),
            saved_draft: None,
            decoder: EscapeDecoder::new(),
            prompt_width: prompt.width(),
            prompt,
            prompt_visible: false,
            term_size: None,
        }
    }

    /// Creates an empty line using the configured prompt and capacity.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.prompt.clone(), config.line_capacity)
    }

    /// The underlying line buffer.
    pub fn buffer(&self) -> &LineBuffer {
        &self.line
    }

    /// Current line contents.
    pub fn as_str(&self) -> &str {
        self.line.as_str().unwrap_or("")
    }

    /// Cursor position in bytes from the start of the line.
    pub fn cursor_pos(&self) -> usize {
        self.line.cursor_pos()
    }

    /// Length of the line in bytes.
    pub fn len(&self) -> usize {
        self.line.len()
    }

    /// Returns `true` if nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// The prompt printed before the line.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Whether the prompt has been drawn for the current line.
    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Returns `true` while a line typed before history navigation is saved.
    pub fn has_draft(&self) -> bool {
        self.saved_draft.is_some()
    }

    /// State of the escape decoder, which persists between bytes.
    pub fn decoder_state(&self) -> DecoderState {
        self.decoder.state()
    }

    /// Last size reported after a resize notification.
    pub fn term_size(&self) -> Option<TermSize> {
        self.term_size
    }

    /// Decodes one input byte and applies the resulting key, if any.
    pub fn feed<T: Terminal>(
        &mut self,
        byte: u8,
        history: &mut History,
        terminal: &mut T,
    ) -> Result<Step> {
        match self.decoder.feed(byte) {
            Some(event) => self.apply(event, history, terminal),
            None => Ok(Step::Continue),
        }
    }

    /// Applies one decoded key event.
    pub fn apply<T: Terminal>(
        &mut self,
        event: KeyEvent,
        history: &mut History,
        terminal: &mut T,
    ) -> Result<Step> {
        match event {
            KeyEvent::Char(byte) => self.insert(byte, history, terminal)?,
            KeyEvent::Backspace => self.backspace(history, terminal)?,
            KeyEvent::Delete => self.delete_forward(history, terminal)?,
            KeyEvent::Left => self.move_left(terminal)?,
            KeyEvent::Right => self.move_right(terminal)?,
            KeyEvent::Home => self.move_home(terminal)?,
            KeyEvent::End => self.move_end(terminal)?,
            KeyEvent::Up => self.history_up(history, terminal)?,
            KeyEvent::Down => self.history_down(history, terminal)?,
            KeyEvent::Enter => return self.commit(history, terminal).map(Step::Line),
            KeyEvent::Interrupt => {
                self.cancel(history, terminal)?;
                return Ok(Step::Cancelled);
            }
            KeyEvent::EndOfInput => {
                if self.line.is_empty() {
                    terminal.write(b"\r\n")?;
                    terminal.flush()?;
                    self.reset();
                    history.reset_navigation();
                    return Ok(Step::EndOfInput);
                }
            }
            KeyEvent::Suspend => self.suspend(terminal)?,
        }
        Ok(Step::Continue)
    }

    /// Inserts a printable byte at the cursor. Ignored when the buffer is full.
    pub fn insert<T: Terminal>(
        &mut self,
        byte: u8,
        history: &mut History,
        terminal: &mut T,
    ) -> Result<()> {
        if !self.line.insert(byte) {
            return Ok(());
        }
        self.cancel_navigation(history);
        self.redraw(terminal)
    }

    /// Deletes the byte before the cursor and redraws.
    pub fn backspace<T: Terminal>(&mut self, history: &mut History, terminal: &mut T) -> Result<()> {
        if !self.line.delete_before_cursor() {
            return Ok(());
        }
        self.cancel_navigation(history);
        self.redraw(terminal)
    }

    /// Deletes the byte under the cursor and redraws.
    pub fn delete_forward<T: Terminal>(
        &mut self,
        history: &mut History,
        terminal: &mut T,
    ) -> Result<()> {
        if !self.line.delete_at_cursor() {
            return Ok(());
        }
        self.cancel_navigation(history);
        self.redraw(terminal)
    }

    /// Moves the cursor one position left without redrawing.
    pub fn move_left<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        if self.line.move_cursor_left() {
            terminal.cursor_left()?;
            terminal.flush()?;
        }
        Ok(())
    }

    /// Moves the cursor one position right without redrawing.
    pub fn move_right<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        if self.line.move_cursor_right() {
            terminal.cursor_right()?;
            terminal.flush()?;
        }
        Ok(())
    }

    /// Jumps to the start of the line, redrawing only if the cursor moved.
    pub fn move_home<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        if self.line.move_cursor_to_start() {
            self.redraw(terminal)?;
        }
        Ok(())
    }

    /// Jumps to the end of the line, redrawing only if the cursor moved.
    pub fn move_end<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        if self.line.move_cursor_to_end() {
            self.redraw(terminal)?;
        }
        Ok(())
    }

    /// Replaces the line with the previous history entry.
    ///
    /// The first step back snapshots a non-empty line as the draft.
    pub fn history_up<T: Terminal>(&mut self, history: &mut History, terminal: &mut T) -> Result<()> {
        let Some(entry) = history.previous() else {
            return Ok(());
        };

        if self.saved_draft.is_none() && !self.line.is_empty() {
            self.saved_draft = Some(self.line.as_str()?.to_owned());
        }

        self.line.load(entry);
        self.redraw(terminal)
    }

    /// Replaces the line with the next history entry, or restores the draft
    /// once navigation moves past the newest entry.
    pub fn history_down<T: Terminal>(
        &mut self,
        history: &mut History,
        terminal: &mut T,
    ) -> Result<()> {
        let Some(entry) = history.next_entry() else {
            return Ok(());
        };

        if entry.is_empty() {
            match self.saved_draft.take() {
                Some(draft) => self.line.load(&draft),
                None => self.line.clear(),
            }
        } else {
            self.line.load(entry);
        }

        self.redraw(terminal)
    }

    /// Ends the line: moves to a new row, records it in history and returns
    /// its contents. The state is left empty for the next line.
    pub fn commit<T: Terminal>(&mut self, history: &mut History, terminal: &mut T) -> Result<String> {
        terminal.write(b"\r\n")?;
        terminal.flush()?;

        let line = self.line.as_str()?.to_owned();
        history.append(&line);
        history.reset_navigation();
        self.reset();

        Ok(line)
    }

    /// Discards the line after Ctrl+C.
    pub fn cancel<T: Terminal>(&mut self, history: &mut History, terminal: &mut T) -> Result<()> {
        terminal.write(b"^C\r\n")?;
        terminal.flush()?;
        history.reset_navigation();
        self.reset();
        Ok(())
    }

    /// Reprints prompt and line, then places the cursor by absolute column so
    /// output written by others on this row cannot throw it off.
    pub fn redraw<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        terminal.write(b"\r")?;
        terminal.clear_eol()?;
        terminal.write(self.prompt.as_bytes())?;
        terminal.write(self.line.as_bytes())?;
        terminal.cursor_to_column(self.prompt_width + self.line.cursor_pos())?;
        terminal.flush()?;
        self.prompt_visible = true;
        Ok(())
    }

    /// Draws prompt and line unless already on screen.
    pub fn show_prompt<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        if self.prompt_visible {
            return Ok(());
        }
        self.redraw(terminal)
    }

    /// Erases the prompt row so the caller can print; the line itself is kept
    /// and drawn again by the next [`show_prompt`](Self::show_prompt).
    pub fn hide<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        if self.prompt_visible {
            terminal.write(b"\r")?;
            terminal.clear_eol()?;
            terminal.flush()?;
            self.prompt_visible = false;
        }
        Ok(())
    }

    /// Re-reads the terminal size and redraws.
    pub fn handle_resize<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        self.term_size = terminal.window_size();
        if let Some(size) = self.term_size {
            log::debug!("terminal resized to {}x{}", size.cols, size.rows);
        }
        if self.prompt_visible {
            self.redraw(terminal)?;
        }
        Ok(())
    }

    /// Re-enters raw mode after the process was continued and redraws.
    pub fn handle_resume<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        log::debug!("resumed, re-arming raw mode");
        if let Err(e) = terminal.resume() {
            log::warn!("could not re-enter raw mode after resume: {}", e);
        }
        self.term_size = terminal.window_size();
        self.redraw(terminal)
    }

    fn suspend<T: Terminal>(&mut self, terminal: &mut T) -> Result<()> {
        log::debug!("suspending on Ctrl+Z");
        terminal.write(b"\r\n")?;
        terminal.flush()?;
        self.prompt_visible = false;
        terminal.suspend()
    }

    fn cancel_navigation(&mut self, history: &mut History) {
        if history.is_navigating() {
            history.reset_navigation();
            self.saved_draft = None;
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.saved_draft = None;
        self.decoder.reset();
        self.prompt_visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTerminal;
    use crate::DEFAULT_LINE_CAPACITY;

    fn setup() -> (LineState, History, MockTerminal) {
        (LineState::new("> ", DEFAULT_LINE_CAPACITY), History::new(100), MockTerminal::new())
    }

    fn feed_all(state: &mut LineState, history: &mut History, term: &mut MockTerminal, bytes: &[u8]) -> Vec<Step> {
        bytes
            .iter()
            .map(|&b| state.feed(b, history, term).unwrap())
            .filter(|step| *step != Step::Continue)
            .collect()
    }

    #[test]
    fn test_type_and_commit() {
        let (mut state, mut history, mut term) = setup();
        let steps = feed_all(&mut state, &mut history, &mut term, b"hello\r");
        assert_eq!(steps, vec![Step::Line("hello".to_string())]);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["hello"]);
        assert_eq!(state.cursor_pos(), 0);
        assert_eq!(state.len(), 0);
        assert!(!state.prompt_visible());
    }

    #[test]
    fn test_insert_in_middle_and_redraw_uses_absolute_column() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"ac\x1b[D");
        term.output.clear();
        feed_all(&mut state, &mut history, &mut term, b"b");
        assert_eq!(state.as_str(), "abc");
        assert_eq!(state.cursor_pos(), 2);
        // prompt width 2 + pos 2 -> column 5 (1-based)
        assert_eq!(term.output_str(), "\r\x1b[K> abc\x1b[5G");
    }

    #[test]
    fn test_insert_rejected_when_full() {
        let (mut state, mut history, mut term) = setup();
        for _ in 0..DEFAULT_LINE_CAPACITY - 1 {
            state.insert(b'x', &mut history, &mut term).unwrap();
        }
        assert_eq!(state.len(), DEFAULT_LINE_CAPACITY - 1);
        term.output.clear();
        state.insert(b'y', &mut history, &mut term).unwrap();
        assert_eq!(state.len(), DEFAULT_LINE_CAPACITY - 1);
        assert!(!state.as_str().contains('y'));
        assert!(term.output.is_empty());
    }

    #[test]
    fn test_backspace_and_delete() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"abcd\x7f");
        assert_eq!(state.as_str(), "abc");

        // Move to 'b' and delete forward
        feed_all(&mut state, &mut history, &mut term, b"\x1b[D\x1b[D\x1b[3~");
        assert_eq!(state.as_str(), "ac");
        assert_eq!(state.cursor_pos(), 1);
        assert_eq!(state.len(), 2);

        // Backspace at start is a no-op
        feed_all(&mut state, &mut history, &mut term, b"\x1b[H\x7f");
        assert_eq!(state.as_str(), "ac");
        assert_eq!(state.cursor_pos(), 0);
    }

    #[test]
    fn test_delete_at_end_is_noop() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"ab");
        term.output.clear();
        feed_all(&mut state, &mut history, &mut term, b"\x1b[3~");
        assert_eq!(state.as_str(), "ab");
        assert!(term.output.is_empty());
    }

    #[test]
    fn test_arrows_move_without_redraw() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"ab");
        term.output.clear();
        feed_all(&mut state, &mut history, &mut term, b"\x1b[D\x1b[D\x1b[D\x1b[C");
        assert_eq!(state.cursor_pos(), 1);
        assert_eq!(term.output_str(), "\x1b[D\x1b[D\x1b[C");
    }

    #[test]
    fn test_home_end_redraw_only_when_moved() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"abc");
        term.output.clear();
        feed_all(&mut state, &mut history, &mut term, b"\x1b[F");
        assert!(term.output.is_empty());

        feed_all(&mut state, &mut history, &mut term, b"\x1b[1~");
        assert_eq!(state.cursor_pos(), 0);
        assert_eq!(term.output_str(), "\r\x1b[K> abc\x1b[3G");

        feed_all(&mut state, &mut history, &mut term, b"\x1bOF");
        assert_eq!(state.cursor_pos(), 3);
    }

    #[test]
    fn test_up_arrow_matches_history_previous() {
        let (mut state, mut history, mut term) = setup();
        history.append("first");
        history.append("second");

        let mut reference = history.clone();
        let expected = reference.previous().map(str::to_owned);

        feed_all(&mut state, &mut history, &mut term, b"\x1b[A");
        assert_eq!(Some(state.as_str().to_owned()), expected);
        assert_eq!(state.cursor_pos(), state.len());
    }

    #[test]
    fn test_history_navigation_restores_draft() {
        let (mut state, mut history, mut term) = setup();
        for line in ["a", "b", "c"] {
            history.append(line);
        }
        feed_all(&mut state, &mut history, &mut term, b"dra");
        feed_all(&mut state, &mut history, &mut term, b"\x1b[A");
        assert!(state.has_draft());
        assert_eq!(state.as_str(), "c");
        feed_all(&mut state, &mut history, &mut term, b"\x1b[A\x1b[A\x1b[A");
        assert_eq!(state.as_str(), "a");

        feed_all(&mut state, &mut history, &mut term, b"\x1b[B\x1b[B");
        assert_eq!(state.as_str(), "c");
        feed_all(&mut state, &mut history, &mut term, b"\x1b[B");
        assert_eq!(state.as_str(), "dra");
        assert_eq!(state.cursor_pos(), 3);
        assert!(!state.has_draft());

        // Not navigating any more
        feed_all(&mut state, &mut history, &mut term, b"\x1b[B");
        assert_eq!(state.as_str(), "dra");
    }

    #[test]
    fn test_history_down_past_newest_without_draft_clears() {
        let (mut state, mut history, mut term) = setup();
        history.append("only");
        feed_all(&mut state, &mut history, &mut term, b"\x1b[A");
        assert!(!state.has_draft());
        feed_all(&mut state, &mut history, &mut term, b"\x1b[B");
        assert_eq!(state.as_str(), "");
    }

    #[test]
    fn test_up_on_empty_history_keeps_line() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"typing\x1b[A");
        assert_eq!(state.as_str(), "typing");
        assert!(!state.has_draft());
    }

    #[test]
    fn test_editing_cancels_navigation() {
        let (mut state, mut history, mut term) = setup();
        history.append("one");
        history.append("two");
        feed_all(&mut state, &mut history, &mut term, b"\x1b[A\x1b[Ax");
        assert_eq!(state.as_str(), "onex");
        assert!(!history.is_navigating());

        // Down does nothing once navigation was cancelled
        feed_all(&mut state, &mut history, &mut term, b"\x1b[B");
        assert_eq!(state.as_str(), "onex");
    }

    #[test]
    fn test_interrupt_clears_line() {
        let (mut state, mut history, mut term) = setup();
        let steps = feed_all(&mut state, &mut history, &mut term, b"abc\x03");
        assert_eq!(steps, vec![Step::Cancelled]);
        assert!(state.is_empty());
        assert!(term.output_str().ends_with("^C\r\n"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_end_of_input_only_on_empty_line() {
        let (mut state, mut history, mut term) = setup();
        let steps = feed_all(&mut state, &mut history, &mut term, b"x\x04");
        assert!(steps.is_empty());
        assert_eq!(state.as_str(), "x");

        let steps = feed_all(&mut state, &mut history, &mut term, b"\x7f\x04");
        assert_eq!(steps, vec![Step::EndOfInput]);
    }

    #[test]
    fn test_suspend_calls_terminal() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"ab\x1a");
        assert_eq!(term.suspends, 1);
        assert_eq!(state.as_str(), "ab");
        assert!(!state.prompt_visible());
    }

    #[test]
    fn test_resize_refreshes_size_and_redraws() {
        let (mut state, mut history, mut term) = setup();
        term.size = Some(TermSize { cols: 120, rows: 40 });
        feed_all(&mut state, &mut history, &mut term, b"ab");
        term.output.clear();
        state.handle_resize(&mut term).unwrap();
        assert_eq!(state.term_size(), Some(TermSize { cols: 120, rows: 40 }));
        assert_eq!(term.output_str(), "\r\x1b[K> ab\x1b[5G");
    }

    #[test]
    fn test_resume_reenters_raw_mode() {
        let (mut state, _history, mut term) = setup();
        state.handle_resume(&mut term).unwrap();
        assert_eq!(term.raw_entries, 1);
        assert!(state.prompt_visible());
    }

    #[test]
    fn test_hide_and_show_prompt_keep_line() {
        let (mut state, mut history, mut term) = setup();
        feed_all(&mut state, &mut history, &mut term, b"partial");
        state.hide(&mut term).unwrap();
        assert!(!state.prompt_visible());
        term.output.clear();
        state.show_prompt(&mut term).unwrap();
        assert_eq!(term.output_str(), "\r\x1b[K> partial\x1b[10G");
        term.output.clear();
        state.show_prompt(&mut term).unwrap();
        assert!(term.output.is_empty());
    }

    #[test]
    fn test_wide_prompt_width() {
        let mut state = LineState::new("[你] ", 16);
        let mut term = MockTerminal::new();
        state.redraw(&mut term).unwrap();
        // "[你] " is 5 columns wide
        assert!(term.output_str().ends_with("\x1b[6G"));
    }
}
