//! Structured-log call shape for request events
//!
//! Every request event carries 4 context fields (layer, category, handler,
//! method) plus one per operation parameter. Up to 6 fields fit an inline
//! `tracing` callsite guarded by the logger's enabled check. Wider events keep
//! their per-parameter field names but are emitted from a closure handed to
//! `AdapterLogger::log_request`, which stays out of line.

/// Context fields on every request event
pub const CONTEXT_FIELDS: usize = 4;

/// Largest total arity emitted as an inline callsite
pub const MAX_FIXED_ARITY: usize = 6;

/// Emitted form of the request log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogShape {
    /// Inline `tracing::info!` with static field names
    Fixed,
    /// The same event inside a closure run by `AdapterLogger::log_request`
    Dynamic,
}

impl LogShape {
    /// Shape for an operation with `params` parameters
    pub fn select(params: usize) -> Self {
        if params + CONTEXT_FIELDS <= MAX_FIXED_ARITY {
            LogShape::Fixed
        } else {
            LogShape::Dynamic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_sits_between_two_and_three_parameters() {
        assert_eq!(LogShape::select(0), LogShape::Fixed);
        assert_eq!(LogShape::select(1), LogShape::Fixed);
        assert_eq!(LogShape::select(2), LogShape::Fixed);
        assert_eq!(LogShape::select(3), LogShape::Dynamic);
        assert_eq!(LogShape::select(12), LogShape::Dynamic);
    }
}
