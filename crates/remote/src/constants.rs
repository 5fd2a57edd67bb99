//! Remote API paths and fixed header values
//!
//! Paths are relative to the configured `base_url`.

/// Identity / session check. Returns the user name and current balance.
pub const IDENTITY_PATH: &str = "/api/user/me";

/// Reward task listing
pub const TASKS_PATH: &str = "/api/tasks";

/// Game token creation
pub const TOKENS_PATH: &str = "/api/tokens";

/// Purchasable lootbox catalogue
pub const LOOTBOXES_PATH: &str = "/api/lootboxes";

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("questbot/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt carried in a `Failure` message
pub const SNIPPET_LEN: usize = 200;
