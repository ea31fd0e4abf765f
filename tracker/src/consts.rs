//! Tracking constants. Overridable via [`crate::TrackerConfig`].

/// Pending-bucket polling interval (ms). Pending transactions progress
/// fastest, so they are checked most often.
pub const DEFAULT_POLLING_PENDING_INTERVAL_MS: u64 = 5_000;

/// Executed-bucket polling interval (ms).
pub const DEFAULT_POLLING_EXECUTED_INTERVAL_MS: u64 = 3_000;

/// Confirmed-bucket polling interval (ms). Also used for the
/// temp-replaced bucket; finality moves slowly.
pub const DEFAULT_POLLING_CONFIRMED_INTERVAL_MS: u64 = 10_000;

/// Resend attempts before replacement detection kicks in: a transaction
/// that keeps missing a receipt after this many resends is suspiciously
/// likely to have lost its nonce slot.
pub const CHECK_REPLACED_BEFORE_RESEND_COUNT: u32 = 3;

/// Hard resend cap. Past it the record stays pending but is never resent
/// again (surfaced via logs only).
pub const TX_RESEND_LIMIT: u32 = 10;

/// Blocks/epochs past inclusion before an executed transaction counts as
/// confirmed.
pub const CONFIRMATION_THRESHOLD: u64 = 5;

/// Conflux Core validity window: epochs past the payload's `epoch_height`
/// before the transaction can no longer be included.
pub const CFX_EPOCH_HEIGHT_BOUND: u64 = 100_000;

/// Per-RPC-call timeout (ms).
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 15_000;
