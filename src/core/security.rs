// ---------------------------------------------------------------------------
// Input validation limits
// ---------------------------------------------------------------------------

/// Maximum `maxKeys` value for the listing endpoint.
pub const MAX_LIST_KEYS: u32 = 1000;

/// Default `maxKeys` value for the listing endpoint.
pub const DEFAULT_LIST_KEYS: u32 = 100;

/// Presigned URL TTL bounds in seconds.
pub const PRESIGN_MIN_TTL_SECS: u64 = 60;
pub const PRESIGN_MAX_TTL_SECS: u64 = 3600;
pub const PRESIGN_DEFAULT_TTL_SECS: u64 = 900;

/// Maximum metadata title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum metadata description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Maximum comment author name length in characters.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum comment body length in characters.
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Maximum `limit` value for the comment listing endpoint.
pub const MAX_COMMENT_PAGE_LIMIT: usize = 100;

// -- Brute-force protection for admin login --

/// Maximum failed login attempts from one IP before temporary block.
pub const BRUTE_FORCE_MAX_ATTEMPTS: u32 = 5;

/// Time window (seconds) for counting failed login attempts.
pub const BRUTE_FORCE_WINDOW_SECS: u64 = 60;

/// Duration (seconds) an IP is blocked after exceeding max attempts.
pub const BRUTE_FORCE_BLOCK_SECS: u64 = 300;

// -- Session token format --

/// Admin session token prefix.
pub const SESSION_TOKEN_PREFIX: &str = "as_";

/// Session token random part length (32 alphanumeric characters).
pub const SESSION_TOKEN_RANDOM_LENGTH: usize = 32;

/// Validate a presign TTL request against the allowed bounds.
pub fn validate_presign_ttl(ttl_secs: u64) -> Result<(), String> {
    if !(PRESIGN_MIN_TTL_SECS..=PRESIGN_MAX_TTL_SECS).contains(&ttl_secs) {
        return Err(format!(
            "expires {} is outside allowed range [{}, {}]",
            ttl_secs, PRESIGN_MIN_TTL_SECS, PRESIGN_MAX_TTL_SECS
        ));
    }
    Ok(())
}

/// Validate an admin metadata edit.
///
/// Title must be non-empty after trimming and within length bounds;
/// description may be empty but is length-bounded.
pub fn validate_metadata_patch(title: &str, description: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title must not be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!("title exceeds max length {} chars", MAX_TITLE_LENGTH));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "description exceeds max length {} chars",
            MAX_DESCRIPTION_LENGTH
        ));
    }
    Ok(())
}

/// Validate a new comment submission.
pub fn validate_comment(username: Option<&str>, content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("content must not be empty".to_string());
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(format!(
            "content exceeds max length {} chars",
            MAX_COMMENT_LENGTH
        ));
    }
    if let Some(name) = username {
        if name.chars().count() > MAX_USERNAME_LENGTH {
            return Err(format!(
                "username exceeds max length {} chars",
                MAX_USERNAME_LENGTH
            ));
        }
    }
    Ok(())
}
