//! Error types for the Strata protocol.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow")] Overflow,
    #[error("division by zero")] DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("supply overflow on mint of {amount}")] SupplyOverflow { amount: u128 },
    #[error("burn of {amount} exceeds supply {supply}")] BurnExceedsSupply { amount: u128, supply: u128 },
    #[error("mint to the zero address")] MintToZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardsError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error("caller is not authorized")] NotAuthorized,
    #[error("issuance rate {rate} below 1.0")] RateBelowOne { rate: u128 },
    #[error("unknown allocation: {0}")] UnknownAllocation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservoirError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Rewards(#[from] RewardsError),
    #[error("drip nonce mismatch: expected {expected}, got {got}")] NonceMismatch { expected: u64, got: u64 },
    #[error("supply {actual} below keeper expectation {expected}")] SupplyBelowExpected { expected: u128, actual: u128 },
    #[error("issuance rate {actual} below keeper expectation {expected}")] RateBelowExpected { expected: u128, actual: u128 },
    #[error("drip too soon: next allowed at block {next_allowed}")] DripTooSoon { next_allowed: u64 },
    #[error("beneficiary is the zero address")] ZeroBeneficiary,
    #[error("keeper reward fraction {fraction} exceeds 1.0")] FractionAboveOne { fraction: u128 },
    #[error("caller is not authorized")] NotAuthorized,
    #[error("wire codec: {0}")] Codec(String),
}

#[derive(Error, Debug)]
pub enum StrataError {
    #[error(transparent)] Math(#[from] MathError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Rewards(#[from] RewardsError),
    #[error(transparent)] Reservoir(#[from] ReservoirError),
}
