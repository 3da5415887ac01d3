//! Bounded command history with up/down navigation.

use crate::config::{EditorConfig, DEFAULT_LINE_CAPACITY};

/// Command history stored in a fixed-size ring.
///
/// Blank lines and consecutive duplicates are skipped. Once the ring is full
/// the oldest entry is overwritten. Navigation walks from the newest entry
/// towards the oldest with [`previous`](Self::previous) and back with
/// [`next_entry`](Self::next_entry).
///
/// # Examples
///
/// ```
/// use ttyline::History;
///
/// let mut hist = History::new(100);
/// hist.append("a");
/// hist.append("b");
/// hist.append("c");
///
/// assert_eq!(hist.previous(), Some("c"));
/// assert_eq!(hist.previous(), Some("b"));
/// assert_eq!(hist.next_entry(), Some("c"));
/// assert_eq!(hist.next_entry(), Some("")); // back past the newest entry
/// assert_eq!(hist.next_entry(), None);     // no longer navigating
/// ```
#[derive(Debug, Clone)]
pub struct History {
    entries: Box<[String]>,
    max_entry_len: usize,
    count: usize,
    head: Option<usize>,
    cursor: Option<usize>,
}

impl History {
    /// Creates an empty history holding at most `capacity` entries of up to
    /// `DEFAULT_LINE_CAPACITY - 1` bytes each.
    pub fn new(capacity: usize) -> Self {
        Self::with_entry_limit(capacity, DEFAULT_LINE_CAPACITY - 1)
    }

    /// Creates an empty history sized by `config`, with entries limited to
    /// `line_capacity - 1` bytes.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::with_entry_limit(config.history_capacity, config.line_capacity.saturating_sub(1))
    }

    fn with_entry_limit(capacity: usize, max_entry_len: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: vec![String::new(); capacity].into_boxed_slice(),
            max_entry_len: max_entry_len.max(1),
            count: 0,
            head: None,
            cursor: None,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` while the caller is scrolling through history.
    pub fn is_navigating(&self) -> bool {
        self.cursor.is_some()
    }

    /// Adds a line to the history.
    ///
    /// Whitespace-only lines and an exact repeat of the newest entry are
    /// ignored. Lines longer than the entry limit are truncated. Any active
    /// navigation is reset.
    pub fn append(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        let line = truncate_at_boundary(line, self.max_entry_len);

        if self.newest() == Some(line) {
            return;
        }

        let capacity = self.capacity();
        let next = match self.head {
            Some(head) => (head + 1) % capacity,
            None => 0,
        };

        if self.count == capacity {
            log::trace!("history full, evicting {:?}", self.entries[next]);
        }

        let slot = &mut self.entries[next];
        slot.clear();
        slot.push_str(line);

        self.head = Some(next);
        if self.count < capacity {
            self.count += 1;
        }

        self.reset_navigation();
    }

    /// Steps to the previous (older) entry.
    ///
    /// The first call starts at the newest entry. Returns `None` when the
    /// history is empty or navigation already sits on the oldest entry; it
    /// never wraps around.
    pub fn previous(&mut self) -> Option<&str> {
        let head = self.head?;

        let idx = match self.cursor {
            None => head,
            Some(idx) if idx == self.oldest_index() => return None,
            Some(idx) => (idx + self.capacity() - 1) % self.capacity(),
        };

        self.cursor = Some(idx);
        Some(&self.entries[idx])
    }

    /// Steps to the next (newer) entry.
    ///
    /// Stepping past the newest entry ends navigation and returns `Some("")`,
    /// telling the caller to restore whatever was being typed before
    /// navigation began. Stored entries are never empty, so the sentinel is
    /// unambiguous. Returns `None` when not navigating.
    pub fn next_entry(&mut self) -> Option<&str> {
        let idx = self.cursor?;

        if Some(idx) == self.head {
            self.reset_navigation();
            return Some("");
        }

        let next = (idx + 1) % self.capacity();
        self.cursor = Some(next);
        Some(&self.entries[next])
    }

    /// Leaves navigation mode without touching stored entries.
    pub fn reset_navigation(&mut self) {
        self.cursor = None;
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.clear();
        }
        self.count = 0;
        self.head = None;
        self.cursor = None;
    }

    /// Iterates over stored entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let capacity = self.capacity();
        let head = self.head.unwrap_or(0);
        (0..self.count).map(move |back| self.entries[(head + capacity - back) % capacity].as_str())
    }

    fn newest(&self) -> Option<&str> {
        self.head.map(|head| self.entries[head].as_str())
    }

    fn oldest_index(&self) -> usize {
        let capacity = self.capacity();
        let head = self.head.unwrap_or(0);
        (head + capacity + 1 - self.count) % capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

fn truncate_at_boundary(line: &str, max_len: usize) -> &str {
    if line.len() <= max_len {
        return line;
    }
    let mut end = max_len;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
