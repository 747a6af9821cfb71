//! Price Feed Contract
//!
//! ETH/USD price source for FundMe. Two pieces live here:
//!
//! - The [`PriceFeed`] trait, the only view the ledger has of an oracle,
//!   and the [`price_converter`] that turns a feed reading into a USD value.
//! - [`AggregatorState`], an AggregatorV3-compatible mock used on
//!   development networks. An operator publishes answers; every answer
//!   opens a new round that stays queryable.
//!
//! ## Reference Input Pattern
//!
//! The feed charm is used as a **reference input** by FundMe:
//! - Not consumed when read
//! - Only the operator can spend and update it

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// Charms SDK integration (conditional compilation)
#[cfg(feature = "charms")]
pub mod charms;
pub mod price_converter;

use fundme_common::{
    constants::price_feed::{DECIMALS, DESCRIPTION, INITIAL_ANSWER, VERSION},
    errors::{FundMeError, FundMeResult, OracleFailure},
    events::{EventLog, FundMeEvent},
    types::{Address, PriceFeedAction, RoundData, ZERO_ADDRESS},
};

pub use price_converter::{get_conversion_rate, get_price};

// ============ Feed Interface ============

/// Read-only view of an external price oracle
pub trait PriceFeed {
    /// Address the feed is deployed at
    fn address(&self) -> Address;

    /// Decimals of the answers this feed reports
    fn decimals(&self) -> u8;

    /// Latest published round
    fn latest_round_data(&self) -> FundMeResult<RoundData>;
}

// ============ Aggregator State ============

/// Mock aggregator contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AggregatorState {
    /// Address of this feed
    pub address: Address,
    /// Authorized operator (can publish answers)
    pub operator: Address,
    /// Decimals of every answer
    pub decimals: u8,
    /// Interface version
    pub version: u64,
    /// Feed description
    pub description: String,
    /// Id of the latest round (0 = nothing published)
    pub latest_round: u64,
    /// Every published round by id
    pub rounds: BTreeMap<u64, RoundData>,
}

impl AggregatorState {
    /// Create a feed and publish `initial_answer` as round 1
    pub fn new(
        address: Address,
        operator: Address,
        decimals: u8,
        initial_answer: i128,
        block_height: u64,
    ) -> Self {
        let mut state = Self {
            address,
            operator,
            decimals,
            version: VERSION,
            description: DESCRIPTION.to_string(),
            latest_round: 0,
            rounds: BTreeMap::new(),
        };
        state.update_answer(initial_answer, block_height);
        state
    }

    /// ETH/USD mock with the default decimals and a $2,000 answer
    pub fn eth_usd_mock(address: Address, operator: Address, block_height: u64) -> Self {
        Self::new(address, operator, DECIMALS, INITIAL_ANSWER, block_height)
    }

    /// Publish an answer in a new round
    pub fn update_answer(&mut self, answer: i128, block_height: u64) -> RoundData {
        self.latest_round += 1;
        let round = RoundData::answered(self.latest_round, answer, block_height);
        self.rounds.insert(round.round_id, round);
        round
    }

    /// Overwrite a round and make it the latest
    pub fn update_round_data(
        &mut self,
        round_id: u64,
        answer: i128,
        updated_at: u64,
        started_at: u64,
    ) -> RoundData {
        let round = RoundData {
            round_id,
            answer,
            started_at,
            updated_at,
            answered_in_round: round_id,
        };
        self.latest_round = round_id;
        self.rounds.insert(round_id, round);
        round
    }

    /// Data of a specific round
    pub fn get_round_data(&self, round_id: u64) -> FundMeResult<RoundData> {
        self.rounds
            .get(&round_id)
            .copied()
            .ok_or(FundMeError::OracleUnavailable {
                reason: OracleFailure::RoundNotFound,
            })
    }

    /// Latest answer, if any round was published
    pub fn latest_answer(&self) -> Option<i128> {
        self.rounds.get(&self.latest_round).map(|r| r.answer)
    }
}

impl PriceFeed for AggregatorState {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn latest_round_data(&self) -> FundMeResult<RoundData> {
        if self.latest_round == 0 {
            return Err(FundMeError::OracleUnavailable {
                reason: OracleFailure::NoRoundData,
            });
        }
        self.get_round_data(self.latest_round)
    }
}

// ============ Validation Context ============

/// Context for validating price feed operations
pub struct PriceFeedContext {
    /// Current feed state
    pub state: AggregatorState,
    /// Updated feed state
    pub new_state: AggregatorState,
    /// Signer address
    pub signer: Address,
    /// Current block height
    pub block_height: u64,
    /// Event log
    pub events: EventLog,
}

// ============ Validation Functions ============

/// Main validation entry point
pub fn validate(ctx: &mut PriceFeedContext, action: &PriceFeedAction) -> FundMeResult<()> {
    match action {
        PriceFeedAction::Initialize { .. } => {
            // Initialize is handled directly in charms.rs validate_price_feed_operation
            // as it doesn't require an input state context
            Ok(())
        }
        PriceFeedAction::UpdateAnswer { answer } => validate_update_answer(ctx, *answer),
        PriceFeedAction::UpdateRoundData {
            round_id,
            answer,
            updated_at,
            started_at,
        } => validate_update_round_data(ctx, *round_id, *answer, *updated_at, *started_at),
        PriceFeedAction::SetOperator { operator } => validate_set_operator(ctx, operator),
    }
}

/// Validate publishing a new answer
fn validate_update_answer(ctx: &mut PriceFeedContext, answer: i128) -> FundMeResult<()> {
    // 1. Only operator can publish
    ensure_operator(ctx)?;

    // 2. Answer must be positive
    if answer <= 0 {
        return Err(FundMeError::InvalidInput {
            param: "answer",
            reason: "must be positive",
        });
    }

    // 3. Verify new state
    let mut expected = ctx.state.clone();
    let round = expected.update_answer(answer, ctx.block_height);
    if ctx.new_state != expected {
        return Err(FundMeError::InvalidStateTransition);
    }

    // 4. Emit events
    emit_round(ctx, &round);

    Ok(())
}

/// Validate overwriting a round
fn validate_update_round_data(
    ctx: &mut PriceFeedContext,
    round_id: u64,
    answer: i128,
    updated_at: u64,
    started_at: u64,
) -> FundMeResult<()> {
    ensure_operator(ctx)?;

    if round_id == 0 {
        return Err(FundMeError::InvalidInput {
            param: "round_id",
            reason: "rounds start at 1",
        });
    }
    if updated_at != 0 && started_at > updated_at {
        return Err(FundMeError::InvalidInput {
            param: "started_at",
            reason: "after updated_at",
        });
    }

    let mut expected = ctx.state.clone();
    let round = expected.update_round_data(round_id, answer, updated_at, started_at);
    if ctx.new_state != expected {
        return Err(FundMeError::InvalidStateTransition);
    }

    emit_round(ctx, &round);

    Ok(())
}

/// Validate operator change
fn validate_set_operator(ctx: &mut PriceFeedContext, new_operator: &Address) -> FundMeResult<()> {
    // 1. Only the current operator can hand over
    ensure_operator(ctx)?;

    // 2. New operator must be a real, different address
    if *new_operator == ZERO_ADDRESS {
        return Err(FundMeError::InvalidAddress {
            reason: "operator cannot be zero address",
        });
    }
    if *new_operator == ctx.state.operator {
        return Err(FundMeError::InvalidInput {
            param: "operator",
            reason: "same as current",
        });
    }

    // 3. Verify new state
    let expected = AggregatorState {
        operator: *new_operator,
        ..ctx.state.clone()
    };
    if ctx.new_state != expected {
        return Err(FundMeError::InvalidStateTransition);
    }

    // 4. Emit event
    ctx.events.emit(FundMeEvent::FeedOperatorChanged {
        old_operator: ctx.state.operator,
        new_operator: *new_operator,
    });

    Ok(())
}

fn ensure_operator(ctx: &PriceFeedContext) -> FundMeResult<()> {
    if ctx.signer != ctx.state.operator {
        return Err(FundMeError::Unauthorized {
            expected: ctx.state.operator,
            actual: ctx.signer,
        });
    }
    Ok(())
}

fn emit_round(ctx: &mut PriceFeedContext, round: &RoundData) {
    ctx.events.emit(FundMeEvent::NewRound {
        round_id: round.round_id,
        started_by: ctx.signer,
        started_at: round.started_at,
    });
    ctx.events.emit(FundMeEvent::AnswerUpdated {
        current: round.answer,
        round_id: round.round_id,
        updated_at: round.updated_at,
    });
}

// ============ Tests ============
