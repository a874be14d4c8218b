//! # strata-reservoir — Cross-domain drip synchronizer.
//!
//! A second, independent deployment of the protocol cannot observe the
//! primary ledger's supply or issuance rate directly. Instead the primary
//! side periodically "drips": it locks in the current supply and rate,
//! stamps them into an ordered wire message, and hands the message to an
//! external delivery channel. The secondary side consumes drips strictly
//! in nonce order, exactly once, rebasing its local accrual from each one
//! and paying the relaying keeper out of the newly minted amount.
//!
//! Between drips the secondary ledger is merely stale, never wrong: its
//! accumulator keeps advancing under the last delivered supply and rate.

pub mod message;
pub mod primary;
pub mod secondary;

pub use message::DripMessage;
pub use primary::PrimaryReservoir;
pub use secondary::{DripReceipt, SecondaryReservoir};
