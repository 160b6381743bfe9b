use std::io::{self, Write};

use colored::{Color, Colorize};
use crossterm::tty::IsTty;
use log::{Level, LevelFilter, Log};

pub const USER_TARGET: &str = "minish::user";

const USER_PREFIX: &str = "minish: ";
const USER_LEVEL: LevelFilter = LevelFilter::Warn;

macro_rules! logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => (::log::log!(target: $target, ::log::Level::$rule_level, $d($d arg)+));
        }

        #[allow(unused_imports)]
        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        logger_macro!($name is $rule_level to $target, $);
    };
}

logger_macro!(user_error is Error to "minish::user");
logger_macro!(user_warn is Warn to "minish::user");

logger_macro!(dev_info is Info to "minish::dev");
logger_macro!(dev_debug is Debug to "minish::dev");
logger_macro!(dev_trace is Trace to "minish::dev");

/// Writes every record to a single sink, one line each.
///
/// User diagnostics are printed as `minish: message` whatever `level` says;
/// developer records get a level tag and are cut off at `level`.
pub struct SimpleLogger<W: Send + Sync>
where
    for<'a> &'a W: Write,
{
    target: W,
    level: LevelFilter,
}

impl SimpleLogger<io::Stderr> {
    pub fn to_stderr(level: LevelFilter) -> Self {
        SimpleLogger {
            target: io::stderr(),
            level,
        }
    }
}

impl<W: Send + Sync> SimpleLogger<W>
where
    for<'a> &'a W: Write,
{
    fn format(record: &log::Record) -> String {
        if record.target() == USER_TARGET {
            return format!("{USER_PREFIX}{}", record.args());
        }
        let tag = format!("[{}]", record.level()).color(level_color(record.level()));
        format!("{tag} {}", record.args())
    }

    pub fn into_global_logger(self)
    where
        W: 'static,
    {
        // user diagnostics are at most Warn and must always get through
        let max_level = self.level.max(USER_LEVEL);
        // A second install only happens in tests; keep the first one.
        if log::set_boxed_logger(Box::new(self)).is_ok() {
            log::set_max_level(max_level);
        }
    }
}

impl<W: Send + Sync> Log for SimpleLogger<W>
where
    for<'a> &'a W: Write,
{
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let limit = if metadata.target() == USER_TARGET {
            USER_LEVEL
        } else {
            self.level
        };
        metadata.level() <= limit && metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(&self.target, "{}", Self::format(record));
    }

    fn flush(&self) {
        let _ = (&self.target).flush();
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Magenta,
    }
}

/// Turns colors off when stderr is not a terminal.
///
/// `colored` already honors `NO_COLOR` and `CLICOLOR`; this only adds the tty
/// check on top.
pub fn configure_colors() {
    if !io::stderr().is_tty() {
        colored::control::set_override(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, RwLock};

    #[derive(Clone, Default)]
    struct Buffer {
        inner: Arc<RwLock<String>>,
    }

    impl Buffer {
        fn read(&self) -> String {
            self.inner.read().unwrap().clone()
        }
    }

    impl Write for &'_ Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.inner
                .write()
                .unwrap()
                .push_str(std::str::from_utf8(buf).unwrap());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_user_records_get_prefix() {
        let buffer = Buffer::default();
        let logger = SimpleLogger {
            target: buffer.clone(),
            level: LevelFilter::Trace,
        };

        logger.log(
            &log::Record::builder()
                .target(USER_TARGET)
                .level(Level::Error)
                .args(format_args!("cd: HOME not set"))
                .build(),
        );

        assert_eq!(buffer.read(), "minish: cd: HOME not set\n");
    }

    #[test]
    fn test_dev_records_get_level_tag() {
        colored::control::set_override(false);
        let buffer = Buffer::default();
        let logger = SimpleLogger {
            target: buffer.clone(),
            level: LevelFilter::Trace,
        };

        logger.log(
            &log::Record::builder()
                .target("minish::dev")
                .level(Level::Debug)
                .args(format_args!("forked 17"))
                .build(),
        );

        assert_eq!(buffer.read(), "[DEBUG] forked 17\n");
    }

    #[test]
    fn test_user_records_ignore_level_off() {
        let buffer = Buffer::default();
        let logger = SimpleLogger {
            target: buffer.clone(),
            level: LevelFilter::Off,
        };

        logger.log(
            &log::Record::builder()
                .target(USER_TARGET)
                .level(Level::Error)
                .args(format_args!("cannot open missing.txt for input"))
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .target("minish::dev")
                .level(Level::Error)
                .args(format_args!("dropped"))
                .build(),
        );

        assert_eq!(buffer.read(), "minish: cannot open missing.txt for input\n");
    }

    #[test]
    fn test_dev_records_respect_level() {
        let logger = SimpleLogger {
            target: Buffer::default(),
            level: LevelFilter::Info,
        };
        let metadata = |level| {
            log::Metadata::builder()
                .target("minish::dev")
                .level(level)
                .build()
        };

        assert!(logger.enabled(&metadata(Level::Info)));
        assert!(!logger.enabled(&metadata(Level::Debug)));
    }
}
