//! Editor configuration.
//!
//! Everything is plain data supplied by the embedding program; nothing is read
//! from files or the environment.

use core::time::Duration;

/// Maximum number of lines kept in a [`History`](crate::History).
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Size of the line buffer in bytes, including the slot reserved for the
/// terminator. A line holds at most `DEFAULT_LINE_CAPACITY - 1` bytes.
pub const DEFAULT_LINE_CAPACITY: usize = 1024;

/// How long the blocking driver waits for input before re-checking signals.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Settings shared by the history store, the line state and both drivers.
///
/// # Examples
///
/// ```
/// use ttyline::EditorConfig;
/// use std::time::Duration;
///
/// let config = EditorConfig::default()
///     .with_prompt("[you] ")
///     .with_history_capacity(20)
///     .with_poll_interval(Duration::from_millis(20));
///
/// assert_eq!(config.prompt, "[you] ");
/// assert_eq!(config.line_capacity, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Text printed before the editable line.
    pub prompt: String,
    /// Line buffer capacity in bytes (one byte is reserved).
    pub line_capacity: usize,
    /// Number of history entries retained before the oldest is evicted.
    pub history_capacity: usize,
    /// Readiness wait timeout used by the blocking driver.
    pub poll_interval: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            prompt: String::from("> "),
            line_capacity: DEFAULT_LINE_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl EditorConfig {
    /// Sets the prompt printed before each line.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Sets the line capacity. Values below 2 are raised to 2 so that at
    /// least one byte can be typed.
    pub fn with_line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity.max(2);
        self
    }

    /// Sets the history capacity. Values below 1 are raised to 1.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    /// Sets how long the blocking driver waits before rechecking signals.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
