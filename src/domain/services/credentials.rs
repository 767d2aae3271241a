use rand::{distributions::Alphanumeric, Rng};

/// Operator-recognizable tag for tenant keys in logs. Not a security
/// boundary.
pub const API_KEY_PREFIX: &str = "tnt_";

// 43 alphanumeric chars carry just over 256 bits of entropy.
const TOKEN_LEN: usize = 43;

/// Issues a fresh opaque tenant api key. Uniqueness is ultimately enforced
/// by the store's unique index; a collision there makes the orchestrator
/// call this again.
pub fn issue_api_key() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", API_KEY_PREFIX, token)
}
