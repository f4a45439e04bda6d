//! System-wide constants for VaultGuard.

/// Reward points accrued per elapsed second (default).
pub const DEFAULT_REWARD_RATE_PER_SEC: u64 = 100;

/// Longest validity window accepted for an authorization token (seconds).
pub const DEFAULT_MAX_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Default tracing filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Namespace for vault account keys.
pub const VAULT_NAMESPACE: &[u8] = b"vault";

/// Namespace for reward ledger keys.
pub const REWARDS_NAMESPACE: &[u8] = b"rewards";

/// Domain separation tag for derived account keys.
pub const ACCOUNT_KEY_DOMAIN: &[u8] = b"vaultguard:account:v1:";

/// Domain separation tag for named program ids.
pub const PROGRAM_ID_DOMAIN: &[u8] = b"vaultguard:program:v1:";

/// Domain separation tag for token signing payloads.
pub const TOKEN_DOMAIN: &[u8] = b"vaultguard:token:v1:";
