//! Kernel logging subsystem.
//!
//! Records are formatted straight into a registered [`Sink`] (serial port on
//! hardware, a capture buffer in tests) without touching the heap, so the
//! macros work from the first instruction of boot. Until a sink is
//! registered every record is dropped.
//!
//! [`init`] also installs this crate as the global `log` backend, so
//! dependencies that log through the `log` facade land on the same console.
#![cfg_attr(not(test), no_std)]

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};
use spin::{Mutex, Once};

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => " INFO",
            Level::Warn => " WARN",
            Level::Error => "ERROR",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Level::Trace => "\x1b[90m", // Gray
            Level::Debug => "\x1b[36m", // Cyan
            Level::Info => "\x1b[32m",  // Green
            Level::Warn => "\x1b[33m",  // Yellow
            Level::Error => "\x1b[31m", // Red
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            _ => Level::Error,
        }
    }
}

impl From<::log::Level> for Level {
    fn from(level: ::log::Level) -> Self {
        match level {
            ::log::Level::Trace => Level::Trace,
            ::log::Level::Debug => Level::Debug,
            ::log::Level::Info => Level::Info,
            ::log::Level::Warn => Level::Warn,
            ::log::Level::Error => Level::Error,
        }
    }
}

impl From<Level> for ::log::LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => ::log::LevelFilter::Trace,
            Level::Debug => ::log::LevelFilter::Debug,
            Level::Info => ::log::LevelFilter::Info,
            Level::Warn => ::log::LevelFilter::Warn,
            Level::Error => ::log::LevelFilter::Error,
        }
    }
}

// ── Sink ────────────────────────────────────────────────────────

/// Destination for formatted log text.
///
/// Implementations must tolerate being called from any core; `klog`
/// serializes whole records, so a sink only ever sees one record at a time.
pub trait Sink: Sync {
    fn write_str(&self, s: &str);
}

static SINK: Once<&'static dyn Sink> = Once::new();

/// Serializes records so lines from different cores never interleave.
static EMIT: Mutex<()> = Mutex::new(());

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

struct SinkWriter(&'static dyn Sink);

impl fmt::Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

/// Register the console sink and the `log` bridge.
///
/// Only the first call wins; later calls just adjust the level.
pub fn init(sink: &'static dyn Sink, max_level: Level) {
    SINK.call_once(|| sink);
    set_max_level(max_level);
    if ::log::set_logger(&BRIDGE).is_ok() {
        ::log::set_max_level(max_level.into());
    }
}

/// Change the runtime level filter.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
    ::log::set_max_level(level.into());
}

pub fn max_level() -> Level {
    Level::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

/// Would a record at `level` reach the sink?
#[inline]
pub fn enabled(level: Level) -> bool {
    level >= max_level() && SINK.is_completed()
}

/// Log a message with a specific level
pub fn log(level: Level, args: fmt::Arguments) {
    if !enabled(level) {
        return;
    }
    let Some(&sink) = SINK.get() else { return };
    let _emit = EMIT.lock();
    let mut out = SinkWriter(sink);
    let _ = fmt::Write::write_fmt(
        &mut out,
        format_args!("{}[{}]\x1b[0m {}\n", level.color(), level.as_str(), args),
    );
}

/// Print to the sink without formatting or a level prefix
pub fn print(args: fmt::Arguments) {
    let Some(&sink) = SINK.get() else { return };
    let _emit = EMIT.lock();
    let _ = fmt::Write::write_fmt(&mut SinkWriter(sink), args);
}

// ── `log` facade bridge ─────────────────────────────────────────

struct Bridge;

static BRIDGE: Bridge = Bridge;

impl ::log::Log for Bridge {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        crate::enabled(metadata.level().into())
    }

    fn log(&self, record: &::log::Record) {
        crate::log(record.level().into(), *record.args());
    }

    fn flush(&self) {}
}

/// Log at TRACE level
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Trace, format_args!($($arg)*))
    };
}

/// Log at DEBUG level
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Debug, format_args!($($arg)*))
    };
}

/// Log at INFO level
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Info, format_args!($($arg)*))
    };
}

/// Log at WARN level
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Warn, format_args!($($arg)*))
    };
}

/// Log at ERROR level
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log($crate::Level::Error, format_args!($($arg)*))
    };
}

/// Print without newline
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::print(format_args!($($arg)*))
    };
}

/// Print with newline
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => {{
        $crate::print(format_args!("{}\n", format_args!($($arg)*)));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    struct Capture(Mutex<String>);

    impl Sink for Capture {
        fn write_str(&self, s: &str) {
            self.0.lock().push_str(s);
        }
    }

    static CAPTURE: Capture = Capture(Mutex::new(String::new()));

    fn take() -> String {
        core::mem::take(&mut *CAPTURE.0.lock())
    }

    // One test owns the global sink; splitting it would race on `init`.
    #[test]
    fn records_reach_the_sink_filtered_by_level() {
        assert!(!enabled(Level::Error));
        init(&CAPTURE, Level::Info);

        crate::debug!("hidden {}", 1);
        assert_eq!(take(), "");

        crate::warn!("[ps_list] limit {} rejected", -1);
        let line = take();
        assert!(line.contains("[ WARN]"), "{line:?}");
        assert!(line.ends_with("[ps_list] limit -1 rejected\n"), "{line:?}");

        ::log::error!("through the facade");
        assert!(take().contains("through the facade"));

        set_max_level(Level::Trace);
        crate::trace!("now visible");
        assert!(take().contains("[TRACE]"));

        crate::println!("pid {}", 12);
        assert_eq!(take(), "pid 12\n");
        set_max_level(Level::Info);
    }
}
