//! Kernel-style print macros for timerloop
//!
//! Thread-aware debug output, scoped to the timer thread since this
//! crate has no scheduler of its own.
//!
//! # Environment variables
//!
//! - `TIMERLOOP_LOG_LEVEL` — 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
//! - `TIMERLOOP_LOG_TIME` — include a relative nanosecond timestamp
//!
//! # Output format
//!
//! `[LEVEL] [<thread-name>] message`, or with timestamps enabled:
//! `[LEVEL] [<ns>] [<thread-name>] message`

use crate::env::{env_get, env_get_bool};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static TIME_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static START_TIME: OnceLock<Instant> = OnceLock::new();

fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    LOG_LEVEL.store(env_get::<u8>("TIMERLOOP_LOG_LEVEL", LogLevel::Info as u8), Ordering::Relaxed);
    TIME_ENABLED.store(env_get_bool("TIMERLOOP_LOG_TIME", false), Ordering::Relaxed);
    START_TIME.get_or_init(Instant::now);
}

#[inline]
pub fn level() -> LogLevel {
    init();
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Called by the macros below; not part of the public API.
#[doc(hidden)]
pub fn emit(level: LogLevel, args: std::fmt::Arguments<'_>) {
    init();
    if level > LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed)) {
        return;
    }
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("unnamed");
    let mut stderr = std::io::stderr();
    if TIME_ENABLED.load(Ordering::Relaxed) {
        let ns = START_TIME.get_or_init(Instant::now).elapsed().as_nanos();
        let _ = writeln!(stderr, "{} [{ns}] [{name}] {args}", level.prefix());
    } else {
        let _ = writeln!(stderr, "{} [{name}] {args}", level.prefix());
    }
}

#[macro_export]
macro_rules! terror {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Error, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! twarn {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! tinfo {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! tdebug {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Debug, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! ttrace {
    ($($arg:tt)*) => {
        $crate::log::emit($crate::log::LogLevel::Trace, format_args!($($arg)*))
    };
}
