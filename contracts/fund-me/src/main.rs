//! FundMe - Charms App Entry Point
//!
//! This app validates FundMe ledger operations on Bitcoin using
//! client-side validation.
//!
//! ## What This App Validates
//!
//! - **Initialize**: Deployer creates the ledger bound to a price feed
//! - **Fund**: Contribution worth at least the USD minimum
//! - **Withdraw / CheaperWithdraw**: Owner empties the ledger

use charms_sdk::data::{App, Data, Transaction};

/// Main validation function for FundMe operations.
///
/// # Arguments
/// * `app` - The FundMe app definition
/// * `tx` - The transaction being validated
/// * `x` - Public inputs
/// * `w` - Witness data (operation details)
///
/// # Returns
/// `true` if the operation is valid, `false` otherwise
pub fn app_contract(app: &App, tx: &Transaction, x: &Data, w: &Data) -> bool {
    fundme_contract::charms::validate_fund_me_operation(app, tx, x, w)
}

// Use the Charms SDK main macro to generate the entry point
charms_sdk::main!(app_contract);
