//! FundMe Contract
//!
//! Crowdfunding ledger. Anyone may fund it with native currency as long as
//! the contribution is worth at least the configured USD minimum at the
//! current feed price. Only the owner (the deployer) may withdraw, and a
//! withdrawal empties the contract and forgets every funder.
//!
//! ## Withdrawal Ordering
//!
//! Withdrawal follows checks-effects-interactions and this ordering is part
//! of the contract's interface:
//!
//! 1. check the caller is the owner
//! 2. clear every funder record, the roster and the balance
//! 3. only then hand control to the [`ValueTransfer`] primitive
//!
//! The transfer callee receives the ledger mutably and may call back into
//! it; it always observes the already-emptied ledger, and an event log
//! holding only the events it raises itself. If the transfer fails, the
//! ledger and its event log are restored to exactly what they were before
//! the withdrawal, discarding anything the callee did in between.

use std::collections::BTreeMap;
use std::vec::Vec;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// Charms SDK integration (conditional compilation)
#[cfg(feature = "charms")]
pub mod charms;
pub mod deploy;


use fundme_common::{
    constants::funding::MINIMUM_USD,
    errors::{FundMeError, FundMeResult, OracleFailure},
    events::{EventLog, FundMeEvent},
    math::checked_total,
    types::{Address, FundMeAction, RosterPolicy, ZERO_ADDRESS},
};
use fundme_price_feed::{get_conversion_rate, PriceFeed};

// ============ FundMe Config ============

/// Parameters fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FundMeConfig {
    /// Minimum contribution in USD (18 decimals)
    pub minimum_usd: u128,
    /// Roster duplication policy
    pub roster_policy: RosterPolicy,
}

impl Default for FundMeConfig {
    fn default() -> Self {
        Self {
            minimum_usd: MINIMUM_USD,
            roster_policy: RosterPolicy::default(),
        }
    }
}

// ============ FundMe State ============

/// FundMe contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FundMeState {
    /// Deployer, the only account allowed to withdraw
    pub owner: Address,
    /// Address of the ETH/USD feed
    pub price_feed: Address,
    /// Construction parameters
    pub config: FundMeConfig,
    /// Funders in order of contribution
    pub funders: Vec<Address>,
    /// Cumulative wei per funder (absent = 0)
    pub address_to_amount_funded: BTreeMap<Address, u128>,
    /// Wei held by the contract
    pub balance: u128,
}

impl FundMeState {
    /// Fresh state with no funders
    pub fn new(owner: Address, price_feed: Address, config: FundMeConfig) -> Self {
        Self {
            owner,
            price_feed,
            config,
            funders: Vec::new(),
            address_to_amount_funded: BTreeMap::new(),
            balance: 0,
        }
    }

    /// Sum of every recorded contribution
    pub fn total_recorded(&self) -> FundMeResult<u128> {
        checked_total(self.address_to_amount_funded.values())
    }

    /// Balance matches the records and every record has a roster entry
    pub fn is_consistent(&self) -> bool {
        let balanced = self.total_recorded().map_or(false, |total| total == self.balance);
        let listed = self
            .address_to_amount_funded
            .keys()
            .all(|funder| self.funders.contains(funder));
        balanced && listed
    }
}

// ============ Transfer Primitive ============

/// Moves native currency out of the contract
pub trait ValueTransfer {
    /// Send `amount` to `to`, returning whether it arrived
    ///
    /// `ledger` is the contract performing the transfer. Implementations
    /// may call back into it.
    fn transfer(&mut self, ledger: &mut FundMe, to: &Address, amount: u128) -> bool;
}

// ============ Ledger ============

/// FundMe contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundMe {
    state: FundMeState,
    events: EventLog,
}

impl FundMe {
    /// Deploy with default configuration
    pub fn new(deployer: Address, price_feed: Address) -> FundMeResult<Self> {
        Self::with_config(deployer, price_feed, FundMeConfig::default())
    }

    /// Deploy with explicit configuration
    pub fn with_config(deployer: Address, price_feed: Address, config: FundMeConfig) -> FundMeResult<Self> {
        if deployer == ZERO_ADDRESS {
            return Err(FundMeError::InvalidAddress {
                reason: "owner cannot be zero address",
            });
        }
        if price_feed == ZERO_ADDRESS {
            return Err(FundMeError::InvalidAddress {
                reason: "price feed cannot be zero address",
            });
        }
        if config.minimum_usd == 0 {
            return Err(FundMeError::InvalidInput {
                param: "minimum_usd",
                reason: "must be positive",
            });
        }

        Ok(Self::from_state(FundMeState::new(deployer, price_feed, config)))
    }

    /// Resume from persisted state
    pub fn from_state(state: FundMeState) -> Self {
        Self {
            state,
            events: EventLog::new(),
        }
    }

    // ============ Operations ============

    /// Contribute `amount` wei from `caller`
    ///
    /// # Errors
    /// - `InsufficientContribution` if the amount is worth less than the minimum
    /// - `OracleUnavailable` if `feed` is not the configured feed or cannot be read
    /// - `Overflow` if the balance would exceed `u128`
    pub fn fund(&mut self, caller: Address, amount: u128, feed: &dyn PriceFeed) -> FundMeResult<()> {
        let minimum = self.state.config.minimum_usd;

        // 1. Nothing sent, nothing to price
        if amount == 0 {
            return Err(FundMeError::InsufficientContribution {
                usd_value: 0,
                minimum,
            });
        }

        // 2. Only the configured feed may price contributions
        if feed.address() != self.state.price_feed {
            return Err(OracleFailure::UnknownFeed.into());
        }

        // 3. Convert and enforce the minimum
        let usd_value = get_conversion_rate(amount, feed)?;
        if usd_value < minimum {
            return Err(FundMeError::InsufficientContribution { usd_value, minimum });
        }

        // 4. Compute new totals before touching state
        let balance = self
            .state
            .balance
            .checked_add(amount)
            .ok_or(FundMeError::Overflow)?;
        let total_funded = self
            .get_address_to_amount_funded(&caller)
            .checked_add(amount)
            .ok_or(FundMeError::Overflow)?;

        // 5. Commit
        let first_contribution = !self.state.address_to_amount_funded.contains_key(&caller);
        self.state.address_to_amount_funded.insert(caller, total_funded);
        if first_contribution || self.state.config.roster_policy == RosterPolicy::AppendAlways {
            self.state.funders.push(caller);
        }
        self.state.balance = balance;

        self.events.emit(FundMeEvent::Funded {
            funder: caller,
            amount,
            usd_value,
            total_funded,
            balance,
        });

        Ok(())
    }

    /// Plain value transfer with no call data
    pub fn receive(&mut self, caller: Address, amount: u128, feed: &dyn PriceFeed) -> FundMeResult<()> {
        self.fund(caller, amount, feed)
    }

    /// Value transfer with call data that matches no operation
    pub fn fallback(
        &mut self,
        caller: Address,
        amount: u128,
        _data: &[u8],
        feed: &dyn PriceFeed,
    ) -> FundMeResult<()> {
        self.fund(caller, amount, feed)
    }

    /// Send the whole balance to the owner and reset every funder
    ///
    /// Returns the amount transferred.
    pub fn withdraw(&mut self, caller: Address, transfer: &mut dyn ValueTransfer) -> FundMeResult<u128> {
        self.withdraw_with(caller, transfer, false)
    }

    /// Same contract as [`FundMe::withdraw`], iterating a local copy of the
    /// roster instead of reading it from state on every step
    pub fn cheaper_withdraw(&mut self, caller: Address, transfer: &mut dyn ValueTransfer) -> FundMeResult<u128> {
        self.withdraw_with(caller, transfer, true)
    }

    /// Apply an action on behalf of `caller`
    ///
    /// A missing feed means the oracle could not be reached.
    pub fn execute(
        &mut self,
        caller: Address,
        action: &FundMeAction,
        feed: Option<&dyn PriceFeed>,
        transfer: &mut dyn ValueTransfer,
    ) -> FundMeResult<()> {
        match action {
            FundMeAction::Fund { amount } => {
                let feed = feed.ok_or(FundMeError::from(OracleFailure::Unreachable))?;
                self.fund(caller, *amount, feed)
            }
            FundMeAction::Withdraw => self.withdraw(caller, transfer).map(|_| ()),
            FundMeAction::CheaperWithdraw => self.cheaper_withdraw(caller, transfer).map(|_| ()),
        }
    }

    fn withdraw_with(
        &mut self,
        caller: Address,
        transfer: &mut dyn ValueTransfer,
        cached_roster: bool,
    ) -> FundMeResult<u128> {
        // 1. Checks
        self.only_owner(&caller)?;

        let amount = self.state.balance;

        // 2. Effects
        let (roster, mut removed) = if cached_roster {
            self.reset_funders_cached()
        } else {
            self.reset_funders()
        };
        self.state.balance = 0;

        // Records without a roster entry survive the reset; empty for any
        // state this type built itself
        let unlisted = self.state.address_to_amount_funded.clone();

        // The callee only sees the events it raises
        let mut history = std::mem::take(&mut self.events);

        // 3. Interaction
        if !transfer.transfer(self, &caller, amount) {
            removed.extend(unlisted);
            self.state.funders = roster;
            self.state.address_to_amount_funded = removed;
            self.state.balance = amount;
            self.events = history;
            return Err(FundMeError::TransferFailed { to: caller, amount });
        }

        history.emit(FundMeEvent::Withdrawn {
            owner: caller,
            amount,
            funders_cleared: roster.len() as u64,
            cached_roster,
        });
        history.append(&mut self.events);
        self.events = history;

        Ok(amount)
    }

    /// Reads the roster from state on every iteration
    ///
    /// Returns the detached roster and the records it removed.
    fn reset_funders(&mut self) -> (Vec<Address>, BTreeMap<Address, u128>) {
        let mut removed = BTreeMap::new();
        let mut index = 0;
        while index < self.state.funders.len() {
            let funder = self.state.funders[index];
            if let Some(amount) = self.state.address_to_amount_funded.remove(&funder) {
                removed.insert(funder, amount);
            }
            index += 1;
        }
        (std::mem::take(&mut self.state.funders), removed)
    }

    /// Moves the roster out of state once, then iterates the local copy
    fn reset_funders_cached(&mut self) -> (Vec<Address>, BTreeMap<Address, u128>) {
        let funders = std::mem::take(&mut self.state.funders);
        let mut removed = BTreeMap::new();
        for funder in &funders {
            if let Some(amount) = self.state.address_to_amount_funded.remove(funder) {
                removed.insert(*funder, amount);
            }
        }
        (funders, removed)
    }

    fn only_owner(&self, caller: &Address) -> FundMeResult<()> {
        if *caller != self.state.owner {
            return Err(FundMeError::NotOwner {
                owner: self.state.owner,
                caller: *caller,
            });
        }
        Ok(())
    }

    // ============ Query Functions ============

    /// Deployer of the contract
    pub fn get_owner(&self) -> Address {
        self.state.owner
    }

    /// Address of the configured feed
    pub fn get_price_feed(&self) -> Address {
        self.state.price_feed
    }

    /// Funder at roster position `index`
    pub fn get_funder(&self, index: usize) -> FundMeResult<Address> {
        self.state
            .funders
            .get(index)
            .copied()
            .ok_or(FundMeError::IndexOutOfRange {
                index,
                len: self.state.funders.len(),
            })
    }

    /// Cumulative wei contributed by `funder` since the last withdrawal
    pub fn get_address_to_amount_funded(&self, funder: &Address) -> u128 {
        self.state
            .address_to_amount_funded
            .get(funder)
            .copied()
            .unwrap_or(0)
    }

    /// Number of roster entries
    pub fn funders_len(&self) -> usize {
        self.state.funders.len()
    }

    /// Wei held by the contract
    pub fn balance(&self) -> u128 {
        self.state.balance
    }

    /// Minimum contribution in USD (18 decimals)
    pub fn minimum_usd(&self) -> u128 {
        self.state.config.minimum_usd
    }

    /// Roster duplication policy
    pub fn roster_policy(&self) -> RosterPolicy {
        self.state.config.roster_policy
    }

    /// Current state
    pub fn state(&self) -> &FundMeState {
        &self.state
    }

    /// Consume the contract, keeping its state
    pub fn into_state(self) -> FundMeState {
        self.state
    }

    /// Events emitted so far
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take the events emitted so far, leaving the log empty
    pub fn take_events(&mut self) -> EventLog {
        std::mem::take(&mut self.events)
    }
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use fundme_common::{
        constants::currency::{ONE_ETHER, ONE_USD},
        events::EventType,
    };
    use fundme_price_feed::AggregatorState;

    const OWNER: Address = [1u8; 32];
    const FUNDER: Address = [2u8; 32];
    const FEED: Address = [7u8; 32];

    // 0.05 ETH = $100 at $2,000
    const SEND_VALUE: u128 = ONE_ETHER / 20;

    /// Always succeeds and remembers what it sent
    #[derive(Default)]
    struct RecordingTransfer {
        sent: Vec<(Address, u128)>,
    }

    impl ValueTransfer for RecordingTransfer {
        fn transfer(&mut self, _ledger: &mut FundMe, to: &Address, amount: u128) -> bool {
            self.sent.push((*to, amount));
            true
        }
    }

    /// Always fails
    struct RejectingTransfer;

    impl ValueTransfer for RejectingTransfer {
        fn transfer(&mut self, _ledger: &mut FundMe, _to: &Address, _amount: u128) -> bool {
            false
        }
    }

    fn setup() -> (FundMe, AggregatorState) {
        let feed = AggregatorState::eth_usd_mock(FEED, OWNER, 1);
        (FundMe::new(OWNER, FEED).unwrap(), feed)
    }

    #[test]
    fn test_constructor_sets_owner_and_feed() {
        let (fund_me, _) = setup();

        assert_eq!(fund_me.get_owner(), OWNER);
        assert_eq!(fund_me.get_price_feed(), FEED);
        assert_eq!(fund_me.minimum_usd(), MINIMUM_USD);
        assert_eq!(fund_me.roster_policy(), RosterPolicy::AppendOnce);
        assert_eq!(fund_me.balance(), 0);
    }

    #[test]
    fn test_constructor_rejects_zero_addresses() {
        assert!(matches!(
            FundMe::new(OWNER, ZERO_ADDRESS),
            Err(FundMeError::InvalidAddress { .. })
        ));
        assert!(matches!(
            FundMe::new(ZERO_ADDRESS, FEED),
            Err(FundMeError::InvalidAddress { .. })
        ));

        let config = FundMeConfig { minimum_usd: 0, ..FundMeConfig::default() };
        assert!(matches!(
            FundMe::with_config(OWNER, FEED, config),
            Err(FundMeError::InvalidInput { param: "minimum_usd", .. })
        ));
    }

    #[test]
    fn test_fund_without_value_fails() {
        let (mut fund_me, feed) = setup();

        let result = fund_me.fund(FUNDER, 0, &feed);

        assert_eq!(
            result,
            Err(FundMeError::InsufficientContribution { usd_value: 0, minimum: MINIMUM_USD })
        );
        assert!(fund_me.events().is_empty());
    }

    #[test]
    fn test_receive_routes_to_fund() {
        let (mut fund_me, feed) = setup();

        assert!(matches!(
            fund_me.receive(FUNDER, 0, &feed),
            Err(FundMeError::InsufficientContribution { .. })
        ));

        fund_me.receive(FUNDER, SEND_VALUE, &feed).unwrap();
        fund_me.fallback(FUNDER, SEND_VALUE, &[0xde, 0xad], &feed).unwrap();
        assert_eq!(fund_me.get_address_to_amount_funded(&FUNDER), 2 * SEND_VALUE);
    }

    #[test]
    fn test_fund_updates_amount_funded() {
        let (mut fund_me, feed) = setup();

        fund_me.fund(FUNDER, SEND_VALUE, &feed).unwrap();

        assert_eq!(fund_me.get_address_to_amount_funded(&FUNDER), SEND_VALUE);
        assert_eq!(fund_me.get_funder(0), Ok(FUNDER));
        assert_eq!(fund_me.balance(), SEND_VALUE);
        assert!(fund_me.state().is_consistent());

        match fund_me.events().last() {
            Some(FundMeEvent::Funded { usd_value, total_funded, .. }) => {
                assert_eq!(*usd_value, 100 * ONE_USD);
                assert_eq!(*total_funded, SEND_VALUE);
            }
            other => panic!("Expected Funded event, got {:?}", other),
        }
    }

    #[test]
    fn test_fund_rejects_unknown_feed() {
        let (mut fund_me, _) = setup();
        let other_feed = AggregatorState::eth_usd_mock([8u8; 32], OWNER, 1);

        assert_eq!(
            fund_me.fund(FUNDER, SEND_VALUE, &other_feed),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::UnknownFeed })
        );
        assert_eq!(fund_me.balance(), 0);
    }

    #[test]
    fn test_fund_with_broken_feed_leaves_state() {
        let (mut fund_me, mut feed) = setup();
        feed.update_answer(-1, 2);
        let before = fund_me.state().clone();

        let result = fund_me.fund(FUNDER, SEND_VALUE, &feed);

        assert!(matches!(result, Err(FundMeError::OracleUnavailable { .. })));
        assert_eq!(fund_me.state(), &before);
    }

    #[test]
    fn test_fund_balance_overflow() {
        let (mut fund_me, feed) = setup();
        fund_me.state.balance = u128::MAX;

        assert_eq!(fund_me.fund(FUNDER, SEND_VALUE, &feed), Err(FundMeError::Overflow));
        assert_eq!(fund_me.get_address_to_amount_funded(&FUNDER), 0);
    }

    #[test]
    fn test_get_funder_out_of_range() {
        let (fund_me, _) = setup();

        assert_eq!(
            fund_me.get_funder(0),
            Err(FundMeError::IndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_withdraw_single_funder() {
        let (mut fund_me, feed) = setup();
        fund_me.fund(FUNDER, SEND_VALUE, &feed).unwrap();
        let mut transfer = RecordingTransfer::default();

        let withdrawn = fund_me.withdraw(OWNER, &mut transfer).unwrap();

        assert_eq!(withdrawn, SEND_VALUE);
        assert_eq!(transfer.sent, vec![(OWNER, SEND_VALUE)]);
        assert_eq!(fund_me.balance(), 0);
        assert_eq!(fund_me.get_address_to_amount_funded(&FUNDER), 0);
        assert!(fund_me.get_funder(0).is_err());
        assert_eq!(fund_me.events().filter_by_type(EventType::Withdrawn).len(), 1);
    }

    #[test]
    fn test_withdraw_only_owner() {
        let (mut fund_me, feed) = setup();
        fund_me.fund(FUNDER, SEND_VALUE, &feed).unwrap();
        let before = fund_me.clone();
        let mut transfer = RecordingTransfer::default();

        assert_eq!(
            fund_me.withdraw(FUNDER, &mut transfer),
            Err(FundMeError::NotOwner { owner: OWNER, caller: FUNDER })
        );
        assert_eq!(
            fund_me.cheaper_withdraw(FUNDER, &mut transfer),
            Err(FundMeError::NotOwner { owner: OWNER, caller: FUNDER })
        );
        assert_eq!(fund_me, before);
        assert!(transfer.sent.is_empty());
    }

    #[test]
    fn test_failed_transfer_rolls_back() {
        let (mut fund_me, feed) = setup();
        fund_me.fund(FUNDER, SEND_VALUE, &feed).unwrap();
        let before = fund_me.clone();

        let result = fund_me.cheaper_withdraw(OWNER, &mut RejectingTransfer);

        assert_eq!(result, Err(FundMeError::TransferFailed { to: OWNER, amount: SEND_VALUE }));
        assert_eq!(fund_me, before);
        assert_eq!(fund_me.get_funder(0), Ok(FUNDER));
    }

    #[test]
    fn test_withdraw_empty_contract() {
        let (mut fund_me, _) = setup();
        let mut transfer = RecordingTransfer::default();

        assert_eq!(fund_me.withdraw(OWNER, &mut transfer), Ok(0));
        assert_eq!(transfer.sent, vec![(OWNER, 0)]);
    }

    #[test]
    fn test_execute_dispatch() {
        let (mut fund_me, feed) = setup();
        let mut transfer = RecordingTransfer::default();

        assert_eq!(
            fund_me.execute(FUNDER, &FundMeAction::Fund { amount: SEND_VALUE }, None, &mut transfer),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::Unreachable })
        );

        fund_me
            .execute(FUNDER, &FundMeAction::Fund { amount: SEND_VALUE }, Some(&feed as &dyn PriceFeed), &mut transfer)
            .unwrap();
        fund_me
            .execute(OWNER, &FundMeAction::CheaperWithdraw, None, &mut transfer)
            .unwrap();

        assert_eq!(transfer.sent, vec![(OWNER, SEND_VALUE)]);
        assert_eq!(fund_me.balance(), 0);
    }

    #[test]
    fn test_state_persistence() {
        let (mut fund_me, feed) = setup();
        fund_me.fund(FUNDER, SEND_VALUE, &feed).unwrap();

        let bytes = borsh::to_vec(fund_me.state()).unwrap();
        let restored = FundMe::from_state(borsh::from_slice(&bytes).unwrap());

        assert_eq!(restored.state(), fund_me.state());
        assert_eq!(restored.get_funder(0), Ok(FUNDER));
        assert!(restored.events().is_empty());
    }
}
