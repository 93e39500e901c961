//! Tag and field keys shared by every generated adapter pipeline
//!
//! Dashboards and alert rules match on these strings, so they are part of the
//! public contract and must never be renamed.

/// Architectural layer of the instrumented component (always [`crate::LAYER`])
pub const REQUEST_LAYER: &str = "request.layer";
/// Adapter category, e.g. `Repository` or `Client`
pub const REQUEST_CATEGORY: &str = "request.category";
/// Concrete adapter type that handled the call
pub const REQUEST_HANDLER: &str = "request.handler";
/// Contract operation that was invoked
pub const REQUEST_HANDLER_METHOD: &str = "request.handler.method";
/// `success` or `failure`
pub const RESPONSE_STATUS: &str = "response.status";
/// Wall-clock duration of the delegated call in milliseconds
pub const RESPONSE_ELAPSED: &str = "response.elapsed";
/// Failure bucket, see [`crate::ErrorType`]
pub const ERROR_TYPE: &str = "error.type";
/// Representative code of the failure
pub const ERROR_CODE: &str = "error.code";

/// Prefix of request parameter fields in structured logs
pub const REQUEST_PARAMS: &str = "request.params";
/// Field carrying the operation's return value
pub const RESPONSE_RESULT: &str = "response.result";
/// Field carrying the size of an observable return value
pub const RESPONSE_RESULT_COUNT: &str = "response.result.count";

/// Value of [`RESPONSE_STATUS`] for completed calls
pub const STATUS_SUCCESS: &str = "success";
/// Value of [`RESPONSE_STATUS`] for failed calls
pub const STATUS_FAILURE: &str = "failure";
