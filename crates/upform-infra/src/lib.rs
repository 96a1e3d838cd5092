//! Upform Infrastructure Library
//!
//! Shared infrastructure used by the Upform service:
//! - Telemetry initialization (tracing subscriber)
//! - Anti-forgery (CSRF) token issuance and validation

pub mod antiforgery;
pub mod telemetry;

// Re-export commonly used types
pub use antiforgery::{context_from_headers, CsrfTokens, CSRF_COOKIE_NAME, CSRF_HEADER_NAME};
pub use telemetry::init_telemetry;
