//! Structured request/response logging for adapter pipelines
//!
//! Generated code logs operations with up to two parameters through inline
//! `tracing` macros behind [`AdapterLogger::is_enabled`]. Wider request events
//! carry the same per-parameter fields, but the generated code hands them to
//! [`AdapterLogger::log_request`] as a closure so the callsite stays off the
//! hot path.

/// Logger handle held by every generated pipeline
#[derive(Debug, Clone, Default)]
pub struct AdapterLogger {
    muted: bool,
}

impl AdapterLogger {
    /// Logger emitting under [`crate::LOG_TARGET`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that never emits; metrics and spans are still recorded
    pub fn muted() -> Self {
        Self { muted: true }
    }

    /// Whether adapter events would currently be recorded
    pub fn is_enabled(&self) -> bool {
        !self.muted && tracing::enabled!(target: crate::LOG_TARGET, tracing::Level::INFO)
    }

    /// Run `event` when logging is enabled
    ///
    /// Used for request events too wide for an inline callsite.
    #[cold]
    #[inline(never)]
    pub fn log_request(&self, event: impl FnOnce()) {
        if self.is_enabled() {
            event();
        }
    }
}
