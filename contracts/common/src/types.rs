//! Core Types for FundMe
//!
//! Defines the data structures shared by the FundMe ledger and the price
//! feed contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// ============ Basic Types ============

/// Type alias for account and contract addresses
pub type Address = [u8; 32];

/// The zero address, never a valid owner or feed
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Left-pad a 20-byte EVM address into an [`Address`]
pub const fn evm_address(bytes: [u8; 20]) -> Address {
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 20 {
        out[12 + i] = bytes[i];
        i += 1;
    }
    out
}

// ============ Price Feed Types ============

/// One published price round (AggregatorV3 `latestRoundData` layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoundData {
    /// Round identifier, starts at 1
    pub round_id: u64,
    /// Price with the feed's own decimals
    pub answer: i128,
    /// Block height when the round started
    pub started_at: u64,
    /// Block height when the answer was written (0 = not answered)
    pub updated_at: u64,
    /// Round in which the answer was computed
    pub answered_in_round: u64,
}

impl RoundData {
    /// A round answered at the block it was started
    pub fn answered(round_id: u64, answer: i128, block: u64) -> Self {
        Self {
            round_id,
            answer,
            started_at: block,
            updated_at: block,
            answered_in_round: round_id,
        }
    }

    /// Checks the round was answered and not carried over
    pub fn is_complete(&self) -> bool {
        self.updated_at != 0 && self.answered_in_round >= self.round_id
    }
}

/// Actions for the price feed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PriceFeedAction {
    /// Create the feed with an initial answer
    Initialize {
        operator: Address,
        decimals: u8,
        initial_answer: i128,
    },
    /// Publish a new answer in a fresh round
    UpdateAnswer { answer: i128 },
    /// Overwrite a round with explicit data
    UpdateRoundData {
        round_id: u64,
        answer: i128,
        updated_at: u64,
        started_at: u64,
    },
    /// Hand publishing rights to another operator
    SetOperator { operator: Address },
}

// ============ Ledger Types ============

/// How the funder roster treats repeat contributors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum RosterPolicy {
    /// An address is listed once, at its first contribution
    #[default]
    AppendOnce,
    /// Every contribution appends, so addresses may repeat
    AppendAlways,
}

/// Actions for the FundMe contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum FundMeAction {
    /// Contribute native currency
    Fund { amount: u128 },
    /// Owner withdraws everything
    Withdraw,
    /// Same as `Withdraw`, iterating a cached roster
    CheaperWithdraw,
}
