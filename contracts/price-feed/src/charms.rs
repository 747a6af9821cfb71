//! Charms SDK Integration for the FundMe Price Feed
//!
//! Bridges Charms transactions to the aggregator validation logic.
//!
//! ```text
//! UpdateAnswer (by operator):
//!   IN:  [Feed state charm]
//!   OUT: [Feed state charm (new round)]
//!
//! FundMe reading the price:
//!   REFS: [Feed state charm]  <- Not consumed, just referenced
//!   IN:   [FundMe state charm]
//!   OUT:  [FundMe state charm]
//! ```

use charms_data::{App, Data, Transaction};
use crate::{validate, AggregatorState, PriceFeedContext};
use fundme_common::{
    events::EventLog,
    types::{Address, PriceFeedAction},
};

// ============ Operation Codes ============

/// Operation codes for feed actions (encoded in witness)
pub mod op {
    /// Initialize feed (first-time creation)
    pub const INITIALIZE: u8 = 0x00;
    /// Publish a new answer (operator only)
    pub const UPDATE_ANSWER: u8 = 0x30;
    /// Overwrite round data (operator only)
    pub const UPDATE_ROUND_DATA: u8 = 0x31;
    /// Set new operator (operator only)
    pub const SET_OPERATOR: u8 = 0x32;
}

// ============ Witness Structures ============

/// Witness data for feed operations
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PriceFeedWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Signer of the transaction
    pub signer: Address,
    /// Operator address (for Initialize or SetOperator)
    pub operator: Option<Address>,
    /// Answer decimals (for Initialize)
    pub decimals: Option<u8>,
    /// Answer value with the feed's decimals
    pub answer: Option<i128>,
    /// Round id (for UpdateRoundData)
    pub round_id: Option<u64>,
    /// Round timestamps `(started_at, updated_at)` (for UpdateRoundData)
    pub timestamps: Option<(u64, u64)>,
    /// Current block height
    pub block_height: u64,
}

impl PriceFeedWitness {
    fn empty(op: u8, signer: Address, block_height: u64) -> Self {
        Self {
            op,
            signer,
            operator: None,
            decimals: None,
            answer: None,
            round_id: None,
            timestamps: None,
            block_height,
        }
    }

    /// Create witness for feed initialization
    pub fn initialize(signer: Address, operator: Address, decimals: u8, answer: i128, block_height: u64) -> Self {
        Self {
            operator: Some(operator),
            decimals: Some(decimals),
            answer: Some(answer),
            ..Self::empty(op::INITIALIZE, signer, block_height)
        }
    }

    /// Create witness for publishing an answer
    pub fn update_answer(signer: Address, answer: i128, block_height: u64) -> Self {
        Self {
            answer: Some(answer),
            ..Self::empty(op::UPDATE_ANSWER, signer, block_height)
        }
    }

    /// Create witness for overwriting a round
    pub fn update_round_data(
        signer: Address,
        round_id: u64,
        answer: i128,
        started_at: u64,
        updated_at: u64,
        block_height: u64,
    ) -> Self {
        Self {
            answer: Some(answer),
            round_id: Some(round_id),
            timestamps: Some((started_at, updated_at)),
            ..Self::empty(op::UPDATE_ROUND_DATA, signer, block_height)
        }
    }

    /// Create witness for setting new operator
    pub fn set_operator(signer: Address, operator: Address, block_height: u64) -> Self {
        Self {
            operator: Some(operator),
            ..Self::empty(op::SET_OPERATOR, signer, block_height)
        }
    }
}

// ============ Main Validation Function ============

/// Validates a price feed operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The price feed app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (feed exports data, doesn't read)
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn validate_price_feed_operation(
    app: &App,
    tx: &Transaction,
    _x: &Data,
    w: &Data,
) -> bool {
    // 1. Parse witness to get operation
    let witness = match parse_witness(w) {
        Some(w) => w,
        None => return false,
    };

    // 2. Convert to internal action type
    let action = match witness_to_action(&witness) {
        Some(a) => a,
        None => return false,
    };

    // 3. Handle Initialize specially (no input state required)
    if let PriceFeedAction::Initialize { operator, decimals, initial_answer } = &action {
        let output_state = match extract_output_state(app, tx) {
            Some(s) => s,
            None => return false,
        };

        return validate_initialize(
            &output_state,
            operator,
            *decimals,
            *initial_answer,
            witness.block_height,
        );
    }

    // 4. For other operations, extract both input and output states
    let (state, new_state) = match extract_feed_states(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 5. Build validation context
    let mut ctx = PriceFeedContext {
        state,
        new_state,
        signer: witness.signer,
        block_height: witness.block_height,
        events: EventLog::new(),
    };

    // 6. Run validation
    validate(&mut ctx, &action).is_ok()
}

/// Validate initialization of the feed
fn validate_initialize(
    output: &AggregatorState,
    operator: &Address,
    decimals: u8,
    initial_answer: i128,
    block_height: u64,
) -> bool {
    if initial_answer <= 0 {
        return false;
    }

    let expected = AggregatorState::new(output.address, *operator, decimals, initial_answer, block_height);
    *output == expected
}

/// Extract only the output feed state (for Initialize)
fn extract_output_state(app: &App, tx: &Transaction) -> Option<AggregatorState> {
    tx.outs.iter()
        .find_map(|charms| {
            charms.get(app).and_then(|data| {
                data.value::<AggregatorState>().ok()
            })
        })
}

// ============ Parsing Functions ============

/// Parse witness data into PriceFeedWitness
fn parse_witness(w: &Data) -> Option<PriceFeedWitness> {
    w.value::<PriceFeedWitness>().ok()
}

/// Convert witness to internal action type
fn witness_to_action(w: &PriceFeedWitness) -> Option<PriceFeedAction> {
    match w.op {
        op::INITIALIZE => Some(PriceFeedAction::Initialize {
            operator: w.operator?,
            decimals: w.decimals?,
            initial_answer: w.answer?,
        }),
        op::UPDATE_ANSWER => Some(PriceFeedAction::UpdateAnswer {
            answer: w.answer?,
        }),
        op::UPDATE_ROUND_DATA => {
            let (started_at, updated_at) = w.timestamps?;
            Some(PriceFeedAction::UpdateRoundData {
                round_id: w.round_id?,
                answer: w.answer?,
                updated_at,
                started_at,
            })
        }
        op::SET_OPERATOR => Some(PriceFeedAction::SetOperator {
            operator: w.operator?,
        }),
        _ => None,
    }
}

// ============ State Extraction ============

/// Extract feed states from transaction inputs and outputs
fn extract_feed_states(
    app: &App,
    tx: &Transaction,
) -> Option<(AggregatorState, AggregatorState)> {
    // Input state (being updated)
    let input_state = tx.ins.iter()
        .find_map(|(_, charms)| {
            charms.get(app).and_then(|data| {
                data.value::<AggregatorState>().ok()
            })
        })?;

    // Output state (updated)
    let output_state = extract_output_state(app, tx)?;

    Some((input_state, output_state))
}

// ============ Feed Reading (for FundMe) ============

/// Read the feed deployed at `feed` from the transaction's reference inputs
///
/// FundMe does not know the feed's app identity, only its address, so
/// every referenced charm is inspected.
pub fn read_feed_from_refs(tx: &Transaction, feed: &Address) -> Option<AggregatorState> {
    for (_, charms) in tx.refs.iter() {
        for (_, data) in charms.iter() {
            if let Ok(state) = data.value::<AggregatorState>() {
                if state.address == *feed {
                    return Some(state);
                }
            }
        }
    }
    None
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    const ETH_PRICE_2000: i128 = 2_000_00000000;

    #[test]
    fn test_witness_serialization() {
        let witness = PriceFeedWitness::update_answer([1u8; 32], ETH_PRICE_2000, 10);
        let data = Data::from(&witness);
        let parsed = parse_witness(&data).unwrap();

        assert_eq!(parsed.op, op::UPDATE_ANSWER);
        assert_eq!(parsed.answer, Some(ETH_PRICE_2000));
    }

    #[test]
    fn test_witness_to_action() {
        let witness = PriceFeedWitness::update_round_data([1u8; 32], 4, ETH_PRICE_2000, 8, 9, 10);
        let action = witness_to_action(&witness).unwrap();

        assert_eq!(
            action,
            PriceFeedAction::UpdateRoundData {
                round_id: 4,
                answer: ETH_PRICE_2000,
                updated_at: 9,
                started_at: 8,
            }
        );
    }

    #[test]
    fn test_incomplete_witness_rejected() {
        let mut witness = PriceFeedWitness::set_operator([1u8; 32], [2u8; 32], 10);
        witness.operator = None;
        assert!(witness_to_action(&witness).is_none());
    }

    #[test]
    fn test_validate_initialize() {
        let state = AggregatorState::new([7u8; 32], [1u8; 32], 8, ETH_PRICE_2000, 5);
        assert!(validate_initialize(&state, &[1u8; 32], 8, ETH_PRICE_2000, 5));
        assert!(!validate_initialize(&state, &[2u8; 32], 8, ETH_PRICE_2000, 5));
        assert!(!validate_initialize(&state, &[1u8; 32], 8, 0, 5));
    }
}
