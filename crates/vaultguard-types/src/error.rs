//! Error types for VaultGuard.
//!
//! All errors use the `VG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Numeric guard
//! - 2xx: Account store
//! - 3xx: Initialization / vault / rewards
//! - 4xx: Order / commitment guard
//! - 5xx: Delegation guard
//! - 6xx: Replay guard
//! - 9xx: General / internal errors
//!
//! Every variant is terminal for the operation that produced it: nothing is
//! committed and nothing is retried inside the core.

use thiserror::Error;

use crate::{Action, OrderKey, ProgramId, TokenId};

/// Central error enum for all guard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    // =================================================================
    // Numeric Guard (1xx)
    // =================================================================
    /// `lhs + rhs` (or `lhs * rhs`) does not fit in a `u64`.
    #[error("VG_ERR_100: Arithmetic overflow: {lhs} and {rhs}")]
    ArithmeticOverflow { lhs: u64, rhs: u64 },

    /// `lhs - rhs` would go below zero.
    #[error("VG_ERR_101: Arithmetic underflow: {lhs} - {rhs}")]
    ArithmeticUnderflow { lhs: u64, rhs: u64 },

    // =================================================================
    // Account Store (2xx)
    // =================================================================
    /// No record exists under the given key.
    #[error("VG_ERR_200: Record not found: {0}")]
    NotFound(String),

    /// An initialized record already exists under the given key.
    #[error("VG_ERR_201: Record already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic commit lost the race: the record moved on.
    #[error("VG_ERR_202: Version conflict on {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    // =================================================================
    // Initialization / Vault / Rewards (3xx)
    // =================================================================
    /// Setup logic was already run for this key.
    #[error("VG_ERR_300: Already initialized: {0}")]
    AlreadyInitialized(String),

    /// The caller is not the owner / maker of the record it tried to mutate.
    #[error("VG_ERR_301: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Supplied `now` is earlier than a timestamp already committed.
    #[error("VG_ERR_302: Timestamp regression: now is {delta_secs}s before the recorded time")]
    TimestampRegression { delta_secs: i64 },

    // =================================================================
    // Order / Commitment Guard (4xx)
    // =================================================================
    /// The taker's locked price no longer matches the order price.
    #[error("VG_ERR_400: Price mismatch: expected {expected}, order is at {actual}")]
    PriceMismatch { expected: u64, actual: u64 },

    /// Not enough balance to pay for the operation.
    #[error("VG_ERR_401: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    /// The order does not have enough remaining amount for the fill.
    #[error("VG_ERR_402: Insufficient liquidity: requested {requested}, remaining {remaining}")]
    InsufficientLiquidity { requested: u64, remaining: u64 },

    /// The order request failed validation.
    #[error("VG_ERR_403: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// The order is already `Filled` or `Expired`.
    #[error("VG_ERR_404: Order closed: {0}")]
    OrderClosed(OrderKey),

    /// The order's expiry has passed.
    #[error("VG_ERR_405: Order expired: {0}")]
    OrderExpired(OrderKey),

    /// `expire_order` was called before the expiry time.
    #[error("VG_ERR_406: Order not yet expired: {0}")]
    OrderNotExpired(OrderKey),

    /// Maker and taker settle against the same account.
    #[error("VG_ERR_407: Self-trade prevented: taker and maker share an account")]
    SelfTradeBlocked,

    // =================================================================
    // Delegation Guard (5xx)
    // =================================================================
    /// The call target is not on the allow-list.
    #[error("VG_ERR_500: Untrusted delegated-call target: {0}")]
    UntrustedTarget(ProgramId),

    /// The delegated call left the account owned by an outsider.
    #[error("VG_ERR_501: Ownership hijacked by delegated call to {target}")]
    OwnershipHijacked { target: ProgramId },

    /// The callee itself returned an error.
    #[error("VG_ERR_502: Delegated call to {target} failed: {reason}")]
    DelegatedCallFailed { target: ProgramId, reason: String },

    // =================================================================
    // Replay Guard (6xx)
    // =================================================================
    /// The token was already consumed for this `(account, action)` scope.
    #[error("VG_ERR_600: Token reused: {token} for action {action}")]
    TokenReused { token: TokenId, action: Action },

    /// The token is outside its validity window.
    #[error("VG_ERR_601: Token expired: {token}")]
    TokenExpired { token: TokenId },

    /// The external verifier rejected the token signature.
    #[error("VG_ERR_602: Invalid token signature: {reason}")]
    InvalidSignature { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid values, malformed file, ...).
    #[error("VG_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("VG_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("VG_ERR_902: Internal error: {0}")]
    Internal(String),
}

impl GuardError {
    /// Stable numeric code (the digits after `VG_ERR_`).
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::ArithmeticOverflow { .. } => 100,
            Self::ArithmeticUnderflow { .. } => 101,
            Self::NotFound(_) => 200,
            Self::AlreadyExists(_) => 201,
            Self::VersionConflict { .. } => 202,
            Self::AlreadyInitialized(_) => 300,
            Self::Unauthorized { .. } => 301,
            Self::TimestampRegression { .. } => 302,
            Self::PriceMismatch { .. } => 400,
            Self::InsufficientBalance { .. } => 401,
            Self::InsufficientLiquidity { .. } => 402,
            Self::InvalidOrder { .. } => 403,
            Self::OrderClosed(_) => 404,
            Self::OrderExpired(_) => 405,
            Self::OrderNotExpired(_) => 406,
            Self::SelfTradeBlocked => 407,
            Self::UntrustedTarget(_) => 500,
            Self::OwnershipHijacked { .. } => 501,
            Self::DelegatedCallFailed { .. } => 502,
            Self::TokenReused { .. } => 600,
            Self::TokenExpired { .. } => 601,
            Self::InvalidSignature { .. } => 602,
            Self::Configuration(_) => 900,
            Self::Serialization(_) => 901,
            Self::Internal(_) => 902,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GuardError>;

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
