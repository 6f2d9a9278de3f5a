use std::sync::atomic::{AtomicU8, Ordering};

pub use colored::Colorize;

/// Severity of a log message, from most to least verbose.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Sets the most verbose level that will still be printed.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn max_level() -> Level {
    match MAX_LEVEL.load(Ordering::Relaxed) {
        0 => Level::Trace,
        1 => Level::Debug,
        2 => Level::Info,
        3 => Level::Warning,
        _ => Level::Error,
    }
}

/// Returns whether messages at `level` are currently printed.
pub fn enabled(level: Level) -> bool {
    level >= max_level()
}

/// Internal macro used to deduplicate logic.
/// Please do not use this. This is an implementation
/// detail and may disappear at any time. This macro
/// is public because `macro_rules!` is limited
/// and rust-analyzer doesn't handle macros 2.0.
#[cfg(debug_assertions)]
#[doc(hidden)]
#[macro_export]
macro_rules! log {
    (($level:ident, $name:ident, $colour:ident) => $($arg:tt)+) => {{
        if $crate::enabled($crate::Level::$level) {
            eprintln!(
                "{} {} {}",
                $crate::Colorize::$colour(concat!("[", stringify!($name), "]")),
                $crate::Colorize::yellow(concat!(file!(), ":", line!(), ":")),
                format_args!($($arg)+)
            );
        }
    }};
}

#[cfg(not(debug_assertions))]
#[doc(hidden)]
#[macro_export]
macro_rules! log {
    (($level:ident, $name:ident, $colour:ident) => $($arg:tt)+) => {{
        if $crate::enabled($crate::Level::$level) {
            eprintln!(
                "{} {}",
                $crate::Colorize::$colour(concat!("[", stringify!($name), "]")),
                format_args!($($arg)+)
            );
        }
    }};
}

/// For verbose output tracking the execution of the program.
#[macro_export]
macro_rules! trace {
    ($($input:tt)*) => {
        $crate::log!((Trace, trace, purple) => $($input)*)
    };
}

/// For additional information that might be helpful for debugging.
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug {
    ($($input:tt)*) => {
        $crate::log!((Debug, debug, cyan) => $($input)*)
    };
}

// Release builds type-check the arguments but never print them.
#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug {
    ($($input:tt)*) => {{
        if false {
            let _ = format_args!($($input)*);
        }
    }};
}

/// Information that may be useful to the user.
#[macro_export]
macro_rules! info {
    ($($input:tt)*) => {
        $crate::log!((Info, info, blue) => $($input)*)
    };
}

/// An alert that something may have gone wrong.
#[macro_export]
macro_rules! warning {
    ($($input:tt)*) => {
        $crate::log!((Warning, warning, bright_yellow) => $($input)*)
    };
}

/// An alert that something has gone horribly wrong.
#[macro_export]
macro_rules! error {
    ($($input:tt)*) => {
        $crate::log!((Error, error, bright_red) => $($input)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        trace!("Hello world");
        debug!("Hello {}", "world");
        info!("Hello world");
        warning!("Hello {}", 42);
        error!("Hello world");
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Warning < Level::Error);

        // Only the default level is observed here, since tests share the
        // global filter.
        assert!(enabled(Level::Error));
        assert!(!enabled(Level::Trace) || max_level() == Level::Trace);
    }
}
