//! Charms SDK Integration for FundMe
//!
//! Bridges Charms transactions to the FundMe ledger.
//!
//! ```text
//! Fund:
//!   REFS: [Price feed charm]
//!   IN:   [FundMe state charm]
//!   OUT:  [FundMe state charm (funder recorded)]
//!
//! Withdraw (by owner):
//!   IN:   [FundMe state charm]
//!   OUT:  [FundMe state charm (emptied)], [owner payout]
//! ```
//!
//! Validation replays the witnessed action on the input state and accepts
//! the transaction only if the result equals the output state. The caller
//! is never taken from the witness: it is the account whose [`AccountCharm`]
//! the transaction spends. Contributions must be covered by coins spent
//! into the transaction, and payouts by coins it pays out.

use charms_data::{App, Data, Transaction};
use serde::{Deserialize, Serialize};
use fundme_common::types::{Address, FundMeAction};
use fundme_price_feed::{charms::read_feed_from_refs, PriceFeed};

use crate::{FundMe, FundMeConfig, FundMeState, ValueTransfer};

// ============ Operation Codes ============

/// Operation codes for FundMe actions (encoded in witness)
pub mod op {
    /// Deploy the contract (first-time creation)
    pub const INITIALIZE: u8 = 0x00;
    /// Contribute native currency
    pub const FUND: u8 = 0x10;
    /// Owner withdrawal
    pub const WITHDRAW: u8 = 0x11;
    /// Owner withdrawal over a cached roster
    pub const CHEAPER_WITHDRAW: u8 = 0x12;
}

// ============ Witness Structures ============

/// Witness data for FundMe operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundMeWitness {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Contributed wei (for Fund)
    pub amount: Option<u128>,
    /// Price feed address (for Initialize)
    pub price_feed: Option<Address>,
}

impl FundMeWitness {
    /// Create witness for deployment
    pub fn initialize(price_feed: Address) -> Self {
        Self {
            op: op::INITIALIZE,
            amount: None,
            price_feed: Some(price_feed),
        }
    }

    /// Create witness for a contribution
    pub fn fund(amount: u128) -> Self {
        Self {
            op: op::FUND,
            amount: Some(amount),
            price_feed: None,
        }
    }

    /// Create witness for a withdrawal
    pub fn withdraw(cheaper: bool) -> Self {
        Self {
            op: if cheaper { op::CHEAPER_WITHDRAW } else { op::WITHDRAW },
            amount: None,
            price_feed: None,
        }
    }
}

// ============ Settlement ============

/// Charm naming the account that controls the UTXO carrying it
///
/// Spending it is what authorizes the account as the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCharm {
    pub account: Address,
}

/// What the transaction itself proves about the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Account whose [`AccountCharm`] is spent
    pub signer: Address,
    /// Native value spent into the transaction
    pub coin_in: u128,
    /// Native value paid out by the transaction
    pub coin_out: u128,
}

impl Settlement {
    /// Read signer and coin flows from `tx`
    pub fn from_transaction(app: &App, tx: &Transaction) -> Option<Self> {
        let signer = extract_signer(app, tx)?;
        let (coin_in, coin_out) = calculate_coin_flows(tx);
        Some(Self {
            signer,
            coin_in,
            coin_out,
        })
    }
}

/// Transfer primitive for UTXO settlement
///
/// Payouts are outputs of the same transaction. A payout succeeds only
/// while the transaction still pays out enough coin to cover it.
#[derive(Debug, Default)]
pub struct SettledTransfer {
    /// Coin paid out by the transaction and not yet claimed
    pub available: u128,
    /// Every payout made during validation
    pub payouts: Vec<(Address, u128)>,
}

impl SettledTransfer {
    pub fn new(available: u128) -> Self {
        Self {
            available,
            payouts: Vec::new(),
        }
    }
}

impl ValueTransfer for SettledTransfer {
    fn transfer(&mut self, _ledger: &mut FundMe, to: &Address, amount: u128) -> bool {
        match self.available.checked_sub(amount) {
            Some(rest) => {
                self.available = rest;
                self.payouts.push((*to, amount));
                true
            }
            None => false,
        }
    }
}

// ============ Main Validation Function ============

/// Validates a FundMe operation within a Charms transaction.
///
/// # Arguments
/// * `app` - The FundMe app definition
/// * `tx` - The transaction being validated
/// * `_x` - Public inputs (unused)
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn validate_fund_me_operation(
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

    // 2. Caller and coin flows come from the transaction
    let settlement = match Settlement::from_transaction(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 3. Deployment has no input state
    if witness.op == op::INITIALIZE {
        let output_state = match extract_output_state(app, tx) {
            Some(s) => s,
            None => return false,
        };
        return validate_initialize(&output_state, &witness, &settlement);
    }

    // 4. Convert to internal action type
    let action = match witness_to_action(&witness) {
        Some(a) => a,
        None => return false,
    };

    // 5. Extract both input and output states
    let (state, new_state) = match extract_fund_me_states(app, tx) {
        Some(s) => s,
        None => return false,
    };

    // 6. Read the configured feed from reference inputs
    let feed = read_feed_from_refs(tx, &state.price_feed);

    // 7. Replay and compare
    replay(state, &new_state, &settlement, &action, feed.as_ref().map(|f| f as &dyn PriceFeed))
}

/// Apply `action` to `state` as `settlement.signer` and check the result
/// equals `expected`
pub fn replay(
    state: FundMeState,
    expected: &FundMeState,
    settlement: &Settlement,
    action: &FundMeAction,
    feed: Option<&dyn PriceFeed>,
) -> bool {
    // A contribution must be backed by coin spent into the transaction
    if let FundMeAction::Fund { amount } = action {
        if settlement.coin_in < *amount {
            return false;
        }
    }

    let mut ledger = FundMe::from_state(state);
    let mut transfer = SettledTransfer::new(settlement.coin_out);

    if ledger.execute(settlement.signer, action, feed, &mut transfer).is_err() {
        return false;
    }

    ledger.state() == expected
}

/// Validate deployment of the contract
fn validate_initialize(output: &FundMeState, witness: &FundMeWitness, settlement: &Settlement) -> bool {
    let price_feed = match witness.price_feed {
        Some(feed) => feed,
        None => return false,
    };

    match FundMe::with_config(settlement.signer, price_feed, FundMeConfig::default()) {
        Ok(fund_me) => fund_me.state() == output,
        Err(_) => false,
    }
}

// ============ Parsing Functions ============

/// Parse witness data into FundMeWitness
fn parse_witness(w: &Data) -> Option<FundMeWitness> {
    w.value::<FundMeWitness>().ok()
}

/// Convert witness to internal action type
fn witness_to_action(w: &FundMeWitness) -> Option<FundMeAction> {
    match w.op {
        op::FUND => Some(FundMeAction::Fund { amount: w.amount? }),
        op::WITHDRAW => Some(FundMeAction::Withdraw),
        op::CHEAPER_WITHDRAW => Some(FundMeAction::CheaperWithdraw),
        _ => None,
    }
}

// ============ State Extraction ============

/// Extract only the output state (for Initialize)
fn extract_output_state(app: &App, tx: &Transaction) -> Option<FundMeState> {
    tx.outs.iter()
        .find_map(|charms| {
            charms.get(app).and_then(|data| {
                data.value::<FundMeState>().ok()
            })
        })
}

/// Extract FundMe states from transaction inputs and outputs
fn extract_fund_me_states(
    app: &App,
    tx: &Transaction,
) -> Option<(FundMeState, FundMeState)> {
    let input_state = tx.ins.iter()
        .find_map(|(_, charms)| {
            charms.get(app).and_then(|data| {
                data.value::<FundMeState>().ok()
            })
        })?;

    let output_state = extract_output_state(app, tx)?;

    Some((input_state, output_state))
}

/// Account of the first foreign [`AccountCharm`] spent by the transaction
fn extract_signer(app: &App, tx: &Transaction) -> Option<Address> {
    tx.ins.iter().find_map(|(_, charms)| {
        charms.iter().find_map(|(charm_app, data)| {
            if charm_app == app {
                return None;
            }
            data.value::<AccountCharm>().ok().map(|charm| charm.account)
        })
    })
}

// ============ Flow Calculations ============

/// Calculate total native coin flowing in and out of the transaction
fn calculate_coin_flows(tx: &Transaction) -> (u128, u128) {
    let inputs = tx.coin_ins
        .as_ref()
        .map(|ins| ins.iter().map(|o| o.amount as u128).sum())
        .unwrap_or(0);

    let outputs = tx.coin_outs
        .as_ref()
        .map(|outs| outs.iter().map(|o| o.amount as u128).sum())
        .unwrap_or(0);

    (inputs, outputs)
}

// ============ Tests ============
