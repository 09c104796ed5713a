//! Error types for the calculation engine and its surfaces.

use thiserror::Error;

/// A specialized Result type for calculator operations.
pub type CalcResult<T> = Result<T, CalcError>;

/// Errors raised where a value cannot be coerced into something meaningful.
///
/// The numeric calculators themselves never fail: bad numbers are coerced to 0
/// and degenerate inputs produce empty results. Only inputs with no sensible
/// fallback end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Confidence level outside the supported 95% / 99% tiers.
    #[error("Unsupported confidence level {0}: only 0.95 and 0.99 are supported")]
    UnsupportedConfidence(f64),

    /// Request payload that could not be decoded.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}
