pub mod memory;

use async_trait::async_trait;

use crate::core::types::{CommentRecord, LikeState};

/// Author name used when a comment is submitted without one.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

// ---------------------------------------------------------------------------
// Repository traits
// ---------------------------------------------------------------------------

/// Per-video like sets keyed by pseudo-user identifier.
///
/// Handlers hold the repository as `Arc<dyn LikeRepository>`; the in-memory
/// implementation is process-local and lost on restart, and a persistent
/// backend can be substituted without touching the HTTP layer. The user
/// identifier is an opaque string; its derivation is the caller's concern.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Flip membership of `user_id` in the video's like set and return the
    /// post-toggle state. Atomic per `(video_key, user_id)` pair.
    async fn toggle(&self, video_key: &str, user_id: &str) -> LikeState;

    async fn count(&self, video_key: &str) -> usize;

    async fn has_liked(&self, video_key: &str, user_id: &str) -> bool;
}

/// Per-video append-only comment logs.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Append a comment. A blank `username` (after trimming) becomes
    /// [`ANONYMOUS_USERNAME`]; content validation belongs to the caller.
    async fn add(
        &self,
        video_key: &str,
        user_id: &str,
        username: &str,
        content: &str,
    ) -> CommentRecord;

    /// Comments newest-first, with `offset`/`limit` applied after sorting.
    async fn list(
        &self,
        video_key: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Vec<CommentRecord>;

    async fn count(&self, video_key: &str) -> usize;
}
