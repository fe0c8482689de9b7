use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::core::types::{CommentRecord, LikeState};
use crate::observability::metrics as obs;

use super::{CommentRepository, LikeRepository, ANONYMOUS_USERNAME};

// ---------------------------------------------------------------------------
// In-memory like store
// ---------------------------------------------------------------------------

/// Process-local like sets. The `DashMap` entry lock makes each toggle
/// atomic per video, which covers the required per-(video, user) atomicity.
pub struct InMemoryLikeStore {
    likes: DashMap<String, HashSet<String>>,
}

impl InMemoryLikeStore {
    pub fn new() -> Self {
        Self {
            likes: DashMap::new(),
        }
    }
}

impl Default for InMemoryLikeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LikeRepository for InMemoryLikeStore {
    async fn toggle(&self, video_key: &str, user_id: &str) -> LikeState {
        let mut entry = self.likes.entry(video_key.to_string()).or_default();
        let liked = if entry.contains(user_id) {
            entry.remove(user_id);
            false
        } else {
            entry.insert(user_id.to_string());
            true
        };
        obs::inc_like_toggle(liked);
        LikeState {
            liked,
            count: entry.len(),
        }
    }

    async fn count(&self, video_key: &str) -> usize {
        self.likes.get(video_key).map(|set| set.len()).unwrap_or(0)
    }

    async fn has_liked(&self, video_key: &str, user_id: &str) -> bool {
        self.likes
            .get(video_key)
            .map(|set| set.contains(user_id))
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// In-memory comment store
// ---------------------------------------------------------------------------

/// Process-local comment logs, append-only per video.
pub struct InMemoryCommentStore {
    comments: DashMap<String, Vec<CommentRecord>>,
}

impl InMemoryCommentStore {
    pub fn new() -> Self {
        Self {
            comments: DashMap::new(),
        }
    }
}

impl Default for InMemoryCommentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentStore {
    async fn add(
        &self,
        video_key: &str,
        user_id: &str,
        username: &str,
        content: &str,
    ) -> CommentRecord {
        let username = username.trim();
        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            video_key: video_key.to_string(),
            user_id: user_id.to_string(),
            username: if username.is_empty() {
                ANONYMOUS_USERNAME.to_string()
            } else {
                username.to_string()
            },
            content: content.trim().to_string(),
            timestamp: Utc::now(),
        };

        self.comments
            .entry(video_key.to_string())
            .or_default()
            .push(record.clone());
        obs::inc_comment_added();
        record
    }

    async fn list(
        &self,
        video_key: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Vec<CommentRecord> {
        let mut comments = self
            .comments
            .get(video_key)
            .map(|log| log.clone())
            .unwrap_or_default();

        // Appends are chronological; reversing before the stable sort keeps
        // newest-first even for identical timestamps.
        comments.reverse();
        comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        comments
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    async fn count(&self, video_key: &str) -> usize {
        self.comments.get(video_key).map(|log| log.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let store = InMemoryLikeStore::new();
        assert_eq!(store.count("a.mp4").await, 0);

        let state = store.toggle("a.mp4", "user-1").await;
        assert!(state.liked);
        assert_eq!(state.count, 1);
        assert!(store.has_liked("a.mp4", "user-1").await);

        let state = store.toggle("a.mp4", "user-1").await;
        assert!(!state.liked);
        assert_eq!(state.count, 0);
        assert!(!store.has_liked("a.mp4", "user-1").await);
    }

    #[tokio::test]
    async fn test_likes_are_scoped_per_video_and_user() {
        let store = InMemoryLikeStore::new();
        store.toggle("a.mp4", "user-1").await;
        store.toggle("a.mp4", "user-2").await;
        store.toggle("b.mp4", "user-1").await;

        assert_eq!(store.count("a.mp4").await, 2);
        assert_eq!(store.count("b.mp4").await, 1);
        assert!(!store.has_liked("b.mp4", "user-2").await);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_of_same_pair_balance_out() {
        let store = Arc::new(InMemoryLikeStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.toggle("a.mp4", "user-1").await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // An even number of flips always lands back on "not liked".
        assert_eq!(store.count("a.mp4").await, 0);
    }

    #[tokio::test]
    async fn test_comments_newest_first() {
        let store = InMemoryCommentStore::new();
        let c1 = store.add("a.mp4", "u1", "Alice", "first").await;
        let c2 = store.add("a.mp4", "u2", "Bob", "second").await;

        let listed = store.list("a.mp4", None, None).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, c2.id);
        assert_eq!(listed[1].id, c1.id);
    }

    #[tokio::test]
    async fn test_comment_pagination_after_sorting() {
        let store = InMemoryCommentStore::new();
        for i in 0..5 {
            store
                .add("a.mp4", "u", "name", &format!("comment {}", i))
                .await;
        }

        let page = store.list("a.mp4", Some(2), Some(1)).await;
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "comment 3");
        assert_eq!(page[1].content, "comment 2");
        assert_eq!(store.count("a.mp4").await, 5);
    }

    #[tokio::test]
    async fn test_blank_username_defaults_to_anonymous() {
        let store = InMemoryCommentStore::new();
        let comment = store.add("a.mp4", "u", "   ", "  hello  ").await;
        assert_eq!(comment.username, ANONYMOUS_USERNAME);
        assert_eq!(comment.content, "hello");
        assert!(!comment.id.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_video_has_no_comments() {
        let store = InMemoryCommentStore::new();
        assert!(store.list("nope.mp4", None, None).await.is_empty());
        assert_eq!(store.count("nope.mp4").await, 0);
    }
}
