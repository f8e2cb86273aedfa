//! Logger trait definition

use std::sync::Arc;

/// Logger abstraction used by providers and the change registry
///
/// Implementations:
/// - `NoOpLogger`: Silent logger, the default everywhere
/// - `ConsoleLogger`: Logs to stdout/stderr
/// - Host adapters: forward to whatever logging the embedding application uses
pub trait Logger: Send + Sync {
    /// Log a debug message
    fn debug(&self, message: &str);

    /// Log an info message
    fn info(&self, message: &str);

    /// Log a warning message
    fn warn(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);
}

/// Type alias for an Arc-wrapped logger
pub type SharedLogger = Arc<dyn Logger>;

/// Extension trait for logging with format arguments
pub trait LoggerExt: Logger {
    /// Log a debug message with format arguments
    fn debug_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.debug(&args.to_string());
    }

    /// Log an info message with format arguments
    fn info_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.info(&args.to_string());
    }

    /// Log a warning message with format arguments
    fn warn_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.warn(&args.to_string());
    }

    /// Log an error message with format arguments
    fn error_fmt(&self, args: std::fmt::Arguments<'_>) {
        self.error(&args.to_string());
    }
}

// Implement LoggerExt for all Logger implementations
impl<T: Logger + ?Sized> LoggerExt for T {}

/// Convenience macros for logging
///
/// ```
/// use scopeconf_core::logging::{ConsoleLogger, SharedLogger};
/// use std::sync::Arc;
///
/// let logger: SharedLogger = Arc::new(ConsoleLogger::with_prefix("[svc]"));
/// scopeconf_core::log_info!(logger, "loaded {} keys", 3);
/// ```
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        {
            use $crate::logging::LoggerExt as _;
            $logger.debug_fmt(format_args!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        {
            use $crate::logging::LoggerExt as _;
            $logger.info_fmt(format_args!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        {
            use $crate::logging::LoggerExt as _;
            $logger.warn_fmt(format_args!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        {
            use $crate::logging::LoggerExt as _;
            $logger.error_fmt(format_args!($($arg)*))
        }
    };
}
