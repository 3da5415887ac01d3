//! Fixed-capacity byte buffer with cursor tracking.

use crate::{Error, Result};

/// Returns `true` for bytes that may be inserted into a line (`0x20..0x7F`).
pub fn is_printable(byte: u8) -> bool {
    (0x20..0x7f).contains(&byte)
}

/// Text buffer with cursor tracking for line editing operations.
///
/// The buffer never grows past `capacity - 1` bytes; the last slot is kept
/// free the way a terminated C buffer would be. Only printable ASCII is
/// inserted through [`insert`](Self::insert), so the contents are always
/// valid UTF-8.
///
/// This struct is typically not used directly - [`LineState`](crate::LineState)
/// drives it and keeps the display in sync.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buffer: Vec<u8>,
    max_len: usize,
    cursor_pos: usize,
}

impl LineBuffer {
    /// Creates a new line buffer holding at most `capacity - 1` bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use ttyline::LineBuffer;
    ///
    /// let buffer = LineBuffer::new(1024);
    /// assert!(buffer.is_empty());
    /// assert_eq!(buffer.max_len(), 1023);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let max_len = capacity.saturating_sub(1).max(1);
        Self {
            buffer: Vec::with_capacity(max_len),
            max_len,
            cursor_pos: 0,
        }
    }

    /// Clears the buffer and resets the cursor to the start.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor_pos = 0;
    }

    /// Returns the number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Largest number of bytes the buffer accepts.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Returns `true` once [`max_len`](Self::max_len) bytes are stored.
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.max_len
    }

    /// Returns the current cursor position in bytes from the start.
    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    /// Returns the buffer contents as a string slice.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a loaded line contained invalid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        core::str::from_utf8(&self.buffer).map_err(|_| Error::InvalidUtf8)
    }

    /// Returns the raw buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Inserts a byte at the cursor, shifting the tail right.
    ///
    /// Returns `false` without touching the buffer when it is full.
    pub fn insert(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buffer.insert(self.cursor_pos, byte);
        self.cursor_pos += 1;
        true
    }

    /// Deletes the byte before the cursor (backspace operation).
    ///
    /// Returns `true` if a byte was deleted, `false` if the cursor is at the start.
    pub fn delete_before_cursor(&mut self) -> bool {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            self.buffer.remove(self.cursor_pos);
            true
        } else {
            false
        }
    }

    /// Deletes the byte at the cursor (delete key operation).
    ///
    /// Returns `true` if a byte was deleted, `false` if the cursor is at the end.
    pub fn delete_at_cursor(&mut self) -> bool {
        if self.cursor_pos < self.buffer.len() {
            self.buffer.remove(self.cursor_pos);
            true
        } else {
            false
        }
    }

    /// Moves the cursor one byte left. Returns `true` if it moved.
    pub fn move_cursor_left(&mut self) -> bool {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            true
        } else {
            false
        }
    }

    /// Moves the cursor one byte right. Returns `true` if it moved.
    pub fn move_cursor_right(&mut self) -> bool {
        if self.cursor_pos < self.buffer.len() {
            self.cursor_pos += 1;
            true
        } else {
            false
        }
    }

    /// Moves the cursor to the start of the line. Returns `true` if it moved.
    pub fn move_cursor_to_start(&mut self) -> bool {
        let moved = self.cursor_pos != 0;
        self.cursor_pos = 0;
        moved
    }

    /// Moves the cursor to the end of the line. Returns `true` if it moved.
    pub fn move_cursor_to_end(&mut self) -> bool {
        let moved = self.cursor_pos != self.buffer.len();
        self.cursor_pos = self.buffer.len();
        moved
    }

    /// Replaces the contents with `text`, truncated to [`max_len`](Self::max_len)
    /// bytes, and puts the cursor at the end.
    pub fn load(&mut self, text: &str) {
        let mut take = text.len().min(self.max_len);
        while !text.is_char_boundary(take) {
            take -= 1;
        }
        self.buffer.clear();
        self.buffer.extend_from_slice(&text.as_bytes()[..take]);
        self.cursor_pos = self.buffer.len();
    }
}
