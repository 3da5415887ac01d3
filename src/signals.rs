//! Signal coordination for raw-mode sessions.
//!
//! Handlers only flip atomic flags, with two exceptions that must act before
//! the process stops or dies: `SIGTSTP` and the terminating signals restore
//! the saved cooked terminal settings with a single `tcsetattr` and re-raise.
//! Everything else (re-reading the window size, redrawing, re-entering raw
//! mode, reinstalling the `SIGTSTP` handler) happens on the main loop after
//! [`take_pending`] reports it.
//!
//! Handlers are installed without `SA_RESTART`, so a signal arriving during
//! the blocking driver's `poll` wakes it immediately.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::io;
use std::os::unix::io::RawFd;

use crate::{Error, Result};

static RESIZED: AtomicBool = AtomicBool::new(false);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static RESUMED: AtomicBool = AtomicBool::new(false);
static INSTALLED: AtomicBool = AtomicBool::new(false);

const TERMINATING: [libc::c_int; 3] = [libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Cooked terminal settings published for the suspend/terminate handlers.
///
/// Only the thread holding raw mode writes it, and `valid` is cleared while
/// it does, so a handler never reads a half-written struct.
struct CookedTermios {
    valid: AtomicBool,
    fd: AtomicI32,
    termios: UnsafeCell<MaybeUninit<libc::termios>>,
}

unsafe impl Sync for CookedTermios {}

static COOKED: CookedTermios = CookedTermios {
    valid: AtomicBool::new(false),
    fd: AtomicI32::new(-1),
    termios: UnsafeCell::new(MaybeUninit::uninit()),
};

/// Signal notifications collected since the previous poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalEvents {
    /// `SIGWINCH` arrived
    pub resized: bool,
    /// `SIGINT` arrived
    pub interrupted: bool,
    /// `SIGCONT` arrived (the process was stopped and continued)
    pub resumed: bool,
}

impl SignalEvents {
    /// Returns `true` if no signal arrived.
    pub fn is_empty(&self) -> bool {
        !(self.resized || self.interrupted || self.resumed)
    }
}

/// Installs the resize, interrupt, job-control and termination handlers.
///
/// Calling it again reinstalls every handler.
///
/// # Errors
///
/// Returns [`Error::SignalInstall`] naming the first signal that failed.
pub fn install() -> Result<()> {
    install_handler(libc::SIGWINCH, on_resize, 0)?;
    install_handler(libc::SIGINT, on_interrupt, 0)?;
    install_handler(libc::SIGCONT, on_continue, 0)?;
    install_handler(libc::SIGTSTP, on_suspend, libc::SA_RESETHAND)?;
    for signal in TERMINATING {
        install_handler(signal, on_terminate, libc::SA_RESETHAND)?;
    }
    INSTALLED.store(true, Ordering::SeqCst);
    log::debug!("signal handlers installed");
    Ok(())
}

/// Returns `true` once [`install`] has succeeded.
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

/// Reinstalls the `SIGTSTP` handler, which resets itself on delivery.
///
/// Called from the main loop after a resume, never from a handler.
pub fn rearm_suspend() -> Result<()> {
    if !is_installed() {
        return Ok(());
    }
    install_handler(libc::SIGTSTP, on_suspend, libc::SA_RESETHAND)
}

/// Puts back the default disposition of every signal [`install`] touched.
pub fn restore_default_handlers() -> Result<()> {
    let signals = [libc::SIGWINCH, libc::SIGINT, libc::SIGCONT, libc::SIGTSTP];
    for signal in signals.into_iter().chain(TERMINATING) {
        set_disposition(signal, libc::SIG_DFL, 0)?;
    }
    INSTALLED.store(false, Ordering::SeqCst);
    Ok(())
}

/// Takes and clears all pending notifications.
pub fn take_pending() -> SignalEvents {
    SignalEvents {
        resized: RESIZED.swap(false, Ordering::SeqCst),
        interrupted: INTERRUPTED.swap(false, Ordering::SeqCst),
        resumed: RESUMED.swap(false, Ordering::SeqCst),
    }
}

/// Stops the process the way the tty driver would on Ctrl+Z.
///
/// Returns once the process has been continued.
pub fn raise_suspend() -> Result<()> {
    if unsafe { libc::raise(libc::SIGTSTP) } != 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
}

/// Publishes the cooked settings of `fd` for the suspend/terminate handlers.
pub(crate) fn remember_cooked(fd: RawFd, termios: &libc::termios) {
    COOKED.valid.store(false, Ordering::SeqCst);
    unsafe {
        (*COOKED.termios.get()).write(*termios);
    }
    COOKED.fd.store(fd, Ordering::SeqCst);
    COOKED.valid.store(true, Ordering::SeqCst);
}

/// Withdraws the settings published for `fd`, if they are the current ones.
pub(crate) fn forget_cooked(fd: RawFd) {
    if COOKED.fd.load(Ordering::SeqCst) == fd {
        COOKED.valid.store(false, Ordering::SeqCst);
    }
}

fn restore_cooked() {
    if COOKED.valid.load(Ordering::SeqCst) {
        let fd = COOKED.fd.load(Ordering::SeqCst);
        unsafe {
            libc::tcsetattr(fd, libc::TCSANOW, (*COOKED.termios.get()).as_ptr());
        }
    }
}

extern "C" fn on_resize(_: libc::c_int) {
    RESIZED.store(true, Ordering::SeqCst);
}

extern "C" fn on_interrupt(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

extern "C" fn on_continue(_: libc::c_int) {
    RESUMED.store(true, Ordering::SeqCst);
}

// SIGTSTP stays blocked while this runs; the re-raised signal is delivered
// with the default action (SA_RESETHAND) as soon as the handler returns.
extern "C" fn on_suspend(_: libc::c_int) {
    let _errno = SavedErrno::save();
    restore_cooked();
    unsafe {
        libc::raise(libc::SIGTSTP);
    }
}

extern "C" fn on_terminate(signal: libc::c_int) {
    let _errno = SavedErrno::save();
    restore_cooked();
    unsafe {
        libc::raise(signal);
    }
}

/// Puts `errno` back when dropped, so a handler's own syscalls are invisible
/// to the code it interrupted.
struct SavedErrno(libc::c_int);

impl SavedErrno {
    fn save() -> Self {
        Self(unsafe { *errno_location() })
    }
}

impl Drop for SavedErrno {
    fn drop(&mut self) {
        unsafe {
            *errno_location() = self.0;
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "fuchsia"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__error()
}

fn install_handler(
    signal: libc::c_int,
    handler: extern "C" fn(libc::c_int),
    flags: libc::c_int,
) -> Result<()> {
    set_disposition(signal, handler as libc::sighandler_t, flags)
}

fn set_disposition(
    signal: libc::c_int,
    disposition: libc::sighandler_t,
    flags: libc::c_int,
) -> Result<()> {
    unsafe {
        let mut action: libc::sigaction = core::mem::zeroed();
        action.sa_sigaction = disposition;
        action.sa_flags = flags;
        libc::sigemptyset(&mut action.sa_mask);

        if libc::sigaction(signal, &action, core::ptr::null_mut()) != 0 {
            return Err(Error::SignalInstall {
                signal,
                source: io::Error::last_os_error(),
            });
        }
    }
    Ok(())
}
