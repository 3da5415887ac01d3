//! Unix terminal support.
//!
//! - [`StdioTerminal`]: the [`Terminal`](crate::Terminal) implementation over
//!   stdin/stdout
//! - [`TerminalMode`], [`enter_raw`], [`exit_raw`]: termios raw mode control
//!
//! Raw mode here disables canonical input, echo, `ISIG` (Ctrl+C and Ctrl+Z
//! arrive as bytes `0x03` / `0x1a`), `IEXTEN`, `IXON` and `ICRNL`, and sets
//! `VMIN = VTIME = 0` so reads never block.

mod mode;
mod unix;

pub use mode::{enter_raw, exit_raw, TerminalMode};
pub use unix::StdioTerminal;
