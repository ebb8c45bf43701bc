//! Unified error type for the superapp core.
//!
//! Precondition failures (insufficient funds, vendor conflicts, illegal state
//! transitions) are ordinary variants so callers can match on them and surface a
//! message to the user. Infrastructure failures wrap the underlying library error.

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read, parsed, or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A persisted snapshot could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted snapshot parsed but breaks a record invariant
    #[error("Corrupt {store} snapshot: {message}")]
    CorruptSnapshot {
        /// Store the snapshot belongs to
        store: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Amount was zero, negative, or out of range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// A debit would overdraw the account
    #[error("Insufficient funds: balance {current:.2}, required {required:.2}")]
    InsufficientFunds {
        /// Balance at the time of the attempt
        current: Decimal,
        /// Amount (including fees) the operation needed
        required: Decimal,
    },

    /// Cart already holds products from another vendor
    #[error("Cart holds items from vendor '{cart_vendor}', cannot add product from '{product_vendor}'")]
    VendorConflict {
        /// Vendor of the items already in the cart
        cart_vendor: String,
        /// Vendor of the rejected product
        product_vendor: String,
    },

    /// Comparison list is at capacity
    #[error("Comparison list is full ({limit} items)")]
    CompareFull {
        /// Maximum number of compared products
        limit: usize,
    },

    /// Product category differs from the products already being compared
    #[error("Cannot compare category '{found}' with '{expected}'")]
    CategoryMismatch {
        /// Category of the current comparison set
        expected: String,
        /// Category of the rejected product
        found: String,
    },

    /// A lifecycle state machine rejected the requested transition
    #[error("Invalid {entity} transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// Which state machine (e.g. "ride", "parcel")
        entity: &'static str,
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// Referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Caller's role does not permit the operation
    #[error("Operation requires role '{required}'")]
    Unauthorized {
        /// Role that would have been accepted
        required: String,
    },

    /// A required input field was empty
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// No unused tracking code could be generated
    #[error("Could not generate a unique tracking code")]
    TrackingCodeExhausted,
}

impl Error {
    /// Stable machine-readable tag for the error, used by front ends to pick a message.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG",
            Self::Database(_) => "DATABASE",
            Self::Serialization(_) => "SERIALIZATION",
            Self::CorruptSnapshot { .. } => "CORRUPT_SNAPSHOT",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::VendorConflict { .. } => "VENDOR_CONFLICT",
            Self::CompareFull { .. } => "FULL",
            Self::CategoryMismatch { .. } => "CATEGORY_MISMATCH",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::TrackingCodeExhausted => "TRACKING_CODE_EXHAUSTED",
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
