//! Core business logic for Stockledger.
//!
//! This crate contains pure business logic with ZERO storage, locking or
//! async dependencies. Every rule that decides an amount, a rate, a layer
//! draw or a permission lives here.
//!
//! # Modules
//!
//! - `currency` - Rounding, day-keyed exchange rates and pivot resolution
//! - `costing` - FIFO cost layers and consumption planning
//! - `fiscal` - Posting lock date and fiscal period guard
//! - `ledger` - Journal entries, validation, reversal and balances
//! - `numbering` - Document sequence keys and number formatting

pub mod costing;
pub mod currency;
pub mod fiscal;
pub mod ledger;
pub mod numbering;
