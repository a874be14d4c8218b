//! Drip wire format.
//!
//! The one bit-exact surface between the two ledger instances: magic
//! prefix + bincode payload. The delivery channel authenticates and
//! deduplicates; ordering is enforced by the nonce check on receipt,
//! never by the transport.

use serde::{Deserialize, Serialize};

use strata_core::constants::{DRIP_MAGIC, MAX_DRIP_MESSAGE_SIZE};
use strata_core::error::ReservoirError;
use strata_core::types::Address;

/// One issuance snapshot pushed from the primary ledger to a secondary.
///
/// Field order is the wire order; changing it breaks every deployed
/// secondary.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct DripMessage {
    /// Strictly increasing delivery sequence number, starting at 0.
    pub nonce: u64,
    /// Total supply on the primary ledger at drip time, in grains.
    pub normalized_supply: u128,
    /// Per-block issuance rate in force at drip time, fixed-point.
    pub issuance_rate: u128,
    /// Tokens minted on the secondary side for whoever relayed this drip.
    pub keeper_reward: u128,
    /// The keeper that originated the drip on the primary side.
    pub beneficiary: Address,
}

impl DripMessage {
    /// Structural checks shared by encode and decode.
    pub fn validate(&self) -> Result<(), ReservoirError> {
        if self.beneficiary.is_zero() {
            return Err(ReservoirError::ZeroBeneficiary);
        }
        Ok(())
    }

    /// Encode as magic prefix + bincode payload.
    pub fn encode(&self) -> Result<Vec<u8>, ReservoirError> {
        self.validate()?;
        let payload = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ReservoirError::Codec(format!("encode error: {e}")))?;
        let mut buf = Vec::with_capacity(DRIP_MAGIC.len() + payload.len());
        buf.extend_from_slice(&DRIP_MAGIC);
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode from magic prefix + bincode payload.
    ///
    /// Rejects oversized input, wrong magic, trailing bytes, and messages
    /// that fail [`validate`](Self::validate). A failed decode must be
    /// reported to the delivery channel as a failed delivery.
    pub fn decode(data: &[u8]) -> Result<Self, ReservoirError> {
        if data.len() > MAX_DRIP_MESSAGE_SIZE {
            return Err(ReservoirError::Codec(format!(
                "message too large: {} bytes",
                data.len()
            )));
        }
        if data.len() < DRIP_MAGIC.len() || data[..DRIP_MAGIC.len()] != DRIP_MAGIC {
            return Err(ReservoirError::Codec("bad magic".into()));
        }
        let payload = &data[DRIP_MAGIC.len()..];
        let (msg, read): (Self, usize) =
            bincode::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| ReservoirError::Codec(format!("decode error: {e}")))?;
        if read != payload.len() {
            return Err(ReservoirError::Codec("trailing bytes".into()));
        }
        msg.validate()?;
        Ok(msg)
    }
}
