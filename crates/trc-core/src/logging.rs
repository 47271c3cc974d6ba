//! # Injected Logging Capability
//!
//! Components that report progress (the quorum engine, the migrator, the
//! batch runner) hold an `Arc<dyn Logger>` handed to them at construction.
//! The binary wires in [`TracingLogger`]; tests use [`NoopLogger`].

use std::sync::Arc;

/// Logging capability injected into each component.
pub trait Logger: Send + Sync + std::fmt::Debug {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl NoopLogger {
    /// Shared handle, the default for components built in tests.
    pub fn shared() -> Arc<dyn Logger> {
        Arc::new(Self)
    }
}

impl Logger for NoopLogger {
    fn debug(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Forwards to the `tracing` macros, tagged with a component name.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Shared handle for a named component.
    pub fn shared(component: &'static str) -> Arc<dyn Logger> {
        Arc::new(Self::new(component))
    }
}

impl Logger for TracingLogger {
    fn debug(&self, msg: &str) {
        tracing::debug!(component = self.component, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(component = self.component, "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(component = self.component, "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(component = self.component, "{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_logger_is_object_safe() {
        let logger: Arc<dyn Logger> = NoopLogger::shared();
        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger::shared("test");
        logger.info("no subscriber installed; must not panic");
    }
}
