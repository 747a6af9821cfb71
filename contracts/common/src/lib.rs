//! FundMe Common Library
//!
//! Shared types, constants, and utilities for the FundMe contracts.
//!
//! ## Components
//!
//! - **Constants**: Currency precision, funding minimum, mock feed defaults
//! - **Errors**: Typed error taxonomy with stable error codes
//! - **Types**: Addresses, round data, contract actions
//! - **Events**: Typed events collected in an [`EventLog`]
//! - **Math**: Integer-only price scaling and USD conversion
//! - **Network**: Chain id to price feed mapping for deployments
//!
//! This crate is `no_std` compatible for WASM compilation when built
//! without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod network;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use network::*;
