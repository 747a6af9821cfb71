//! Error Types for FundMe
//!
//! Every failure is surfaced synchronously to the caller of the failing
//! operation. No operation commits state before returning one of these.

use crate::types::Address;

/// Result type alias for FundMe operations
pub type FundMeResult<T> = Result<T, FundMeError>;

/// Main error enum for all FundMe errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundMeError {
    // ============ Contribution Errors ============
    /// Contribution converts to less than the minimum USD amount
    InsufficientContribution { usd_value: u128, minimum: u128 },

    // ============ Authorization Errors ============
    /// Withdrawal attempted by someone other than the owner
    NotOwner { owner: Address, caller: Address },

    /// Caller is not the price feed operator
    Unauthorized { expected: Address, actual: Address },

    // ============ Oracle Errors ============
    /// Price feed could not produce a usable answer
    OracleUnavailable { reason: OracleFailure },

    // ============ Transfer Errors ============
    /// Value transfer primitive reported failure
    TransferFailed { to: Address, amount: u128 },

    // ============ Query Errors ============
    /// Roster position does not exist
    IndexOutOfRange { index: usize, len: usize },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Division by zero
    DivisionByZero,

    // ============ Input Validation Errors ============
    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    /// Invalid address (e.g., zero address)
    InvalidAddress {
        /// Description of why the address is invalid
        reason: &'static str,
    },

    // ============ State Errors ============
    /// Output state does not match the replayed operation
    InvalidStateTransition,
}

/// Why a price feed read was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleFailure {
    /// No feed was reachable for the call
    Unreachable,
    /// Supplied feed is not the one the ledger was built with
    UnknownFeed,
    /// Answer was zero or negative
    NonPositiveAnswer,
    /// Answer cannot be expressed at native precision
    InvalidDecimals,
    /// Round was started but never answered
    IncompleteRound,
    /// Feed has never published a round
    NoRoundData,
    /// Requested round id was never published
    RoundNotFound,
}

impl FundMeError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientContribution { .. } => "E010_INSUFFICIENT_CONTRIBUTION",
            Self::NotOwner { .. } => "E020_NOT_OWNER",
            Self::Unauthorized { .. } => "E021_UNAUTHORIZED",
            Self::OracleUnavailable { .. } => "E030_ORACLE_UNAVAILABLE",
            Self::TransferFailed { .. } => "E040_TRANSFER_FAILED",
            Self::IndexOutOfRange { .. } => "E050_INDEX_OUT_OF_RANGE",
            Self::Overflow => "E060_OVERFLOW",
            Self::DivisionByZero => "E061_DIV_ZERO",
            Self::InvalidInput { .. } => "E070_INVALID_INPUT",
            Self::InvalidAddress { .. } => "E071_INVALID_ADDRESS",
            Self::InvalidStateTransition => "E080_INVALID_STATE",
        }
    }

    /// Returns true if the caller can retry and possibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientContribution { .. } => true, // Send more
            Self::OracleUnavailable { .. } => true,        // Wait for the feed
            Self::TransferFailed { .. } => true,           // Retry withdrawal
            _ => false,
        }
    }
}

impl From<OracleFailure> for FundMeError {
    fn from(reason: OracleFailure) -> Self {
        Self::OracleUnavailable { reason }
    }
}
