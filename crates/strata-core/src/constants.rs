//! Protocol constants. All monetary values in grains (1 STRATA = 10^18 grains).

/// Base units per whole token.
pub const GRAIN: u128 = 1_000_000_000_000_000_000;

/// Fixed-point scale: `FIXED_POINT_SCALE` represents 1.0.
///
/// Issuance rates, accumulator indexes, delegation cuts, and keeper-reward
/// fractions are all expressed at this scale.
pub const FIXED_POINT_SCALE: u128 = 1_000_000_000_000_000_000;

/// Minimum legal per-block issuance rate: exactly 1.0 (no issuance).
///
/// A rate below 1.0 would make the global accumulator decrease, which the
/// engine never permits. 1.0 itself is a valid idle state — the secondary
/// ledger starts there until its first drip arrives.
pub const MIN_ISSUANCE_RATE: u128 = FIXED_POINT_SCALE;

/// Maximum keeper-reward split fraction: exactly 1.0.
pub const MAX_KEEPER_REWARD_FRACTION: u128 = FIXED_POINT_SCALE;

/// Blocks per year at the primary ledger's ~13s cadence.
///
/// Used only for rate conversions in tooling; the engine itself never
/// assumes a wall-clock block time.
pub const BLOCKS_PER_YEAR: u64 = 2_354_250;

/// Default minimum number of blocks between drips on the primary reservoir.
pub const DEFAULT_MIN_DRIP_INTERVAL: u64 = 5_000;

/// Magic bytes prefixing every encoded drip message ("SDRP").
pub const DRIP_MAGIC: [u8; 4] = [0x53, 0x44, 0x52, 0x50];

/// Maximum encoded drip message size (magic + bincode payload).
///
/// The payload is a fixed-shape tuple; anything larger is garbage.
pub const MAX_DRIP_MESSAGE_SIZE: usize = 128;
