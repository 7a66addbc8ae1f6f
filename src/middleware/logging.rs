//! Request/response logging middleware

use super::pipeline::Middleware;
use crate::error::Result;
use crate::http::{Request, Response};
use crate::types::LogLevel;
use tracing::{debug, error, info, trace, warn};

/// Logs every request and response at a fixed level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware {
    level: LogLevel,
}

impl LoggingMiddleware {
    /// Log at `INFO`
    pub fn new() -> Self {
        Self::default()
    }

    /// Log at the given level
    pub fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    /// Configured level
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, message: &str) {
        match self.level {
            LogLevel::Trace => trace!("{message}"),
            LogLevel::Debug => debug!("{message}"),
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn process_request(&self, request: Request) -> Result<Request> {
        self.log(&format!("→ {} {}", request.method, request.url));
        Ok(request)
    }

    fn process_response(&self, response: Response) -> Result<Response> {
        self.log(&format!(
            "← {} {} ({:.2}ms)",
            response.status(),
            response.url(),
            response.elapsed().as_secs_f64() * 1000.0
        ));
        Ok(response)
    }
}
