//! # Error Types
//!
//! Domain-specific error types for promo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  promo-core errors (this file)                                         │
//! │  ├── CoreError        - What the resolver and converters return        │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  promo-db errors (separate crate)                                      │
//! │  └── DbError          - Rule store failures                            │
//! │                                                                         │
//! │  promo-api errors (in app)                                             │
//! │  └── ApiError         - What HTTP callers see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line id, SKU, field)
//! 3. Errors are enum variants, never String
//! 4. The resolver never returns a partial result alongside an error

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// `InvalidInput` is the only error the resolver itself raises. It is fatal
/// to that single resolution call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed cart or rule data.
    ///
    /// ## When This Occurs
    /// - Line quantity is zero or negative
    /// - Line unit price is negative
    /// - Rule percentage is negative
    /// - Amount rule range has `from > to`
    /// - Two cart lines share an id
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout sends cart
    ///      │
    ///      ▼
    /// resolve(cart, rules)
    ///      │
    ///      ▼
    /// InvalidInput(MustBePositive { field: "lines[2].quantity" })
    ///      │
    ///      ▼
    /// Caller reports: "no discounts applied" + explicit error
    /// ```
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs, both by the resolver and by the
/// rule store when accepting new rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Range lower bound is above its upper bound.
    #[error("{field} range is inverted: from {from} is greater than to {to}")]
    InvertedRange {
        field: String,
        from: String,
        to: String,
    },

    /// Invalid format (e.g., unparseable decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate cart line id).
    #[error("{field} '{value}' is duplicated")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::InvertedRange {
            field: "rules[1]".to_string(),
            from: "150".to_string(),
            to: "50".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rules[1] range is inverted: from 150 is greater than to 50"
        );

        let err = ValidationError::Duplicate {
            field: "line id".to_string(),
            value: "gid://line/1".to_string(),
        };
        assert_eq!(err.to_string(), "line id 'gid://line/1' is duplicated");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::InvalidInput(_)));
        assert_eq!(core_err.to_string(), "Invalid input: quantity must be positive");
    }
}
