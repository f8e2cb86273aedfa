//! Console logger implementation

use std::fmt;

use super::traits::Logger;

/// Environment variable read by [`ConsoleLogger::from_env`]
pub const LOG_LEVEL_ENV: &str = "SCOPECONF_LOG_LEVEL";

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Parse a level name, case-insensitive
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "debug" | "trace" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A logger that outputs to the console
///
/// Info goes to stdout, everything else to stderr. Messages below the
/// minimum level are dropped.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a new console logger with default prefix, logging info and above
    pub fn new() -> Self {
        Self {
            prefix: "[scopeconf]".to_string(),
            min_level: LogLevel::Info,
        }
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::new()
        }
    }

    /// Create a console logger whose level comes from `SCOPECONF_LOG_LEVEL`
    ///
    /// Unset or unrecognized values keep the default (info).
    pub fn from_env() -> Self {
        let logger = Self::new();
        match std::env::var(LOG_LEVEL_ENV).ok().as_deref().and_then(LogLevel::parse) {
            Some(level) => logger.with_min_level(level),
            None => logger,
        }
    }

    /// Drop messages below `level`
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Minimum level that gets printed
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            eprintln!("{} {}: {}", self.prefix, LogLevel::Debug, message);
        }
    }

    fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            println!("{} {}: {}", self.prefix, LogLevel::Info, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            eprintln!("{} {}: {}", self.prefix, LogLevel::Warn, message);
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}: {}", self.prefix, LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logger_creation() {
        let logger = ConsoleLogger::new();
        assert_eq!(logger.prefix, "[scopeconf]");
        assert_eq!(logger.min_level(), LogLevel::Info);

        let custom = ConsoleLogger::with_prefix("[svc]").with_min_level(LogLevel::Debug);
        assert_eq!(custom.prefix, "[svc]");
        assert!(custom.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_log_levels() {
        assert!(LogLevel::Info > LogLevel::Debug);
        assert!(LogLevel::Warn > LogLevel::Info);
        assert!(LogLevel::Error > LogLevel::Warn);

        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_min_level_filters() {
        let logger = ConsoleLogger::new().with_min_level(LogLevel::Warn);
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Error));
    }

    #[test]
    fn test_console_logger_logs() {
        // This test just verifies the logger doesn't panic
        let logger = ConsoleLogger::new().with_min_level(LogLevel::Debug);
        logger.debug("debug message");
        logger.info("info message");
        logger.warn("warn message");
        logger.error("error message");
    }
}
