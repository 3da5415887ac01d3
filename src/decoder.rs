//! Byte-at-a-time decoder for keyboard input.
//!
//! Raw terminal input arrives one byte per read. Printable bytes and single
//! control bytes map straight to a [`KeyEvent`]; `ESC [` (CSI) and `ESC O`
//! (SS3) sequences are assembled across calls, so a sequence split between
//! two non-blocking polls decodes the same as one read in a single burst.
//!
//! Anything malformed or unsupported is dropped and the decoder returns to
//! [`DecoderState::Normal`]; it never waits for bytes that may not come.
//!
//! A `\n` directly after `\r` is swallowed, so pasted CRLF text commits
//! each line once.

use crate::buffer::is_printable;

/// Maximum bytes held for one pending escape sequence (after the `ESC`).
pub const ESCAPE_CAPACITY: usize = 8;

const ESC: u8 = 0x1b;

/// Key events produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Printable ASCII byte
    Char(u8),
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Up arrow (history previous)
    Up,
    /// Down arrow (history next)
    Down,
    Home,
    End,
    Backspace,
    /// Delete (forward)
    Delete,
    /// Enter/Return
    Enter,
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D
    EndOfInput,
    /// Ctrl+Z
    Suspend,
}

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Plain input
    Normal,
    /// After `ESC`
    Escape,
    /// After `ESC [` or `ESC O`
    Bracket,
    /// Collecting numeric parameters of a CSI sequence
    BracketParam,
}

/// Escape sequence state machine.
///
/// # Examples
///
/// ```
/// use ttyline::{EscapeDecoder, KeyEvent};
///
/// let mut decoder = EscapeDecoder::new();
/// assert_eq!(decoder.feed(0x1b), None);
/// assert_eq!(decoder.feed(b'['), None);
/// assert_eq!(decoder.feed(b'3'), None);
/// assert_eq!(decoder.feed(b'~'), Some(KeyEvent::Delete));
/// assert_eq!(decoder.feed(b'x'), Some(KeyEvent::Char(b'x')));
/// ```
#[derive(Debug, Clone)]
pub struct EscapeDecoder {
    state: DecoderState,
    accum: [u8; ESCAPE_CAPACITY],
    accum_len: usize,
    after_cr: bool,
}

impl Default for EscapeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EscapeDecoder {
    /// Creates a decoder in [`DecoderState::Normal`].
    pub fn new() -> Self {
        Self {
            state: DecoderState::Normal,
            accum: [0; ESCAPE_CAPACITY],
            accum_len: 0,
            after_cr: false,
        }
    }

    /// Current state of the machine.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes of the sequence collected so far, excluding the leading `ESC`.
    pub fn pending(&self) -> &[u8] {
        &self.accum[..self.accum_len]
    }

    /// Drops any partial sequence.
    ///
    /// Whether the last byte was `\r` is kept, since a committed line is
    /// reset between the two halves of a CRLF pair.
    pub fn reset(&mut self) {
        self.state = DecoderState::Normal;
        self.accum_len = 0;
    }

    /// Consumes one byte. Returns the completed key event, if any.
    pub fn feed(&mut self, byte: u8) -> Option<KeyEvent> {
        let after_cr = core::mem::take(&mut self.after_cr);
        match self.state {
            DecoderState::Normal => self.feed_normal(byte, after_cr),
            DecoderState::Escape => {
                if byte == b'[' || byte == b'O' {
                    self.push(byte);
                    self.state = DecoderState::Bracket;
                } else {
                    self.discard(byte);
                }
                None
            }
            DecoderState::Bracket => match byte {
                b'A' => self.finish(KeyEvent::Up),
                b'B' => self.finish(KeyEvent::Down),
                b'C' => self.finish(KeyEvent::Right),
                b'D' => self.finish(KeyEvent::Left),
                b'H' => self.finish(KeyEvent::Home),
                b'F' => self.finish(KeyEvent::End),
                b'0'..=b'9' if self.pending() == b"[" => {
                    self.state = DecoderState::BracketParam;
                    self.push(byte);
                    None
                }
                _ => {
                    self.discard(byte);
                    None
                }
            },
            DecoderState::BracketParam => match byte {
                b'0'..=b'9' | b';' => {
                    self.push(byte);
                    None
                }
                b'~' => {
                    let event = match self.first_param() {
                        Some(1) | Some(7) => Some(KeyEvent::Home),
                        Some(3) => Some(KeyEvent::Delete),
                        Some(4) | Some(8) => Some(KeyEvent::End),
                        _ => None,
                    };
                    match event {
                        Some(event) => self.finish(event),
                        None => {
                            self.discard(byte);
                            None
                        }
                    }
                }
                _ => {
                    self.discard(byte);
                    None
                }
            },
        }
    }

    fn feed_normal(&mut self, byte: u8, after_cr: bool) -> Option<KeyEvent> {
        match byte {
            ESC => {
                self.state = DecoderState::Escape;
                self.accum_len = 0;
                None
            }
            b'\r' => {
                self.after_cr = true;
                Some(KeyEvent::Enter)
            }
            b'\n' if after_cr => None,
            b'\n' => Some(KeyEvent::Enter),
            0x7f | 0x08 => Some(KeyEvent::Backspace),
            0x03 => Some(KeyEvent::Interrupt),
            0x04 => Some(KeyEvent::EndOfInput),
            0x1a => Some(KeyEvent::Suspend),
            b if is_printable(b) => Some(KeyEvent::Char(b)),
            _ => None,
        }
    }

    fn push(&mut self, byte: u8) {
        if self.accum_len == ESCAPE_CAPACITY {
            log::trace!("escape sequence overflow, dropping {:?}", self.pending());
            self.reset();
            return;
        }
        self.accum[self.accum_len] = byte;
        self.accum_len += 1;
    }

    fn finish(&mut self, event: KeyEvent) -> Option<KeyEvent> {
        self.reset();
        Some(event)
    }

    fn discard(&mut self, byte: u8) {
        log::trace!("discarding escape sequence {:?} + {:#04x}", self.pending(), byte);
        self.reset();
    }

    /// First numeric parameter of a CSI sequence, e.g. `3` for `ESC [ 3 ; 5 ~`.
    fn first_param(&self) -> Option<u32> {
        let params = self.pending().get(1..)?;
        let digits = params.split(|&b| b == b';').next()?;
        if digits.is_empty() {
            return None;
        }
        digits
            .iter()
            .try_fold(0u32, |acc, &d| acc.checked_mul(10)?.checked_add(u32::from(d - b'0')))
    }
}
