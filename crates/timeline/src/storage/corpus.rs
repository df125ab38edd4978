//! In-memory id-keyed corpus.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::twitter::{MediaKind, Post};

/// Posts keyed by ID. The first post stored under an ID is kept.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    posts: HashMap<String, Post>,
}

impl Corpus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a post unless its ID is already present.
    ///
    /// Returns `false` for a duplicate, leaving the stored post untouched.
    pub fn insert(&mut self, post: Post) -> bool {
        if self.posts.contains_key(&post.id) {
            return false;
        }
        self.posts.insert(post.id.clone(), post);
        true
    }

    /// Insert every post, returning how many were duplicates.
    pub fn extend(&mut self, posts: impl IntoIterator<Item = Post>) -> usize {
        let mut duplicates = 0;
        for post in posts {
            if !self.insert(post) {
                duplicates += 1;
            }
        }
        duplicates
    }

    /// Look up a post by ID.
    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    /// Number of unique posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts in corpus order, truncated to `limit` when given.
    #[must_use]
    pub fn into_sorted(self, limit: Option<usize>) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.into_values().collect();
        posts.sort_by(Post::corpus_order);
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        posts
    }
}

/// Number of top authors kept in [`CorpusStats::top_users`].
pub const TOP_USERS: usize = 5;

/// Attachment counts per media kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTypeCounts {
    pub photo: usize,
    pub video: usize,
    pub animated_gif: usize,
}

/// An author and how many posts they contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    pub screen_name: String,
    pub posts: usize,
}

/// Content mix of a set of posts.
///
/// Each post is classified once: reshare, else quote, else original.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total: usize,
    pub original: usize,
    pub reshares: usize,
    pub quoted: usize,
    /// Posts with at least one attachment.
    pub with_media: usize,
    /// Attachments across all posts.
    pub total_media_files: usize,
    pub media_types: MediaTypeCounts,
    /// Mean text length in characters.
    pub avg_text_length: f64,
    /// Most active authors, busiest first.
    pub top_users: Vec<UserCount>,
}

impl CorpusStats {
    #[must_use]
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut stats = Self {
            total: posts.len(),
            ..Self::default()
        };
        let mut text_chars = 0;
        let mut authors: HashMap<&str, usize> = HashMap::new();

        for post in posts {
            if post.is_reshare() {
                stats.reshares += 1;
            } else if post.quoted.is_some() {
                stats.quoted += 1;
            } else {
                stats.original += 1;
            }

            if !post.media.is_empty() {
                stats.with_media += 1;
                stats.total_media_files += post.media.len();
            }
            for asset in &post.media {
                match asset.kind {
                    MediaKind::Photo => stats.media_types.photo += 1,
                    MediaKind::Video => stats.media_types.video += 1,
                    MediaKind::AnimatedGif => stats.media_types.animated_gif += 1,
                }
            }

            text_chars += post.text.chars().count();
            let handle = post
                .user
                .as_ref()
                .and_then(|u| u.screen_name.as_deref())
                .unwrap_or("unknown");
            *authors.entry(handle).or_default() += 1;
        }

        if !posts.is_empty() {
            stats.avg_text_length = text_chars as f64 / posts.len() as f64;
        }

        let mut authors: Vec<(&str, usize)> = authors.into_iter().collect();
        authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        stats.top_users = authors
            .into_iter()
            .take(TOP_USERS)
            .map(|(screen_name, posts)| UserCount {
                screen_name: screen_name.to_string(),
                posts,
            })
            .collect();

        stats
    }

    /// Share of `count` in the total, as a percentage.
    #[must_use]
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }

    /// Emit the stats as a structured log line.
    pub fn log(&self, scope: &str) {
        tracing::info!(
            scope,
            total = self.total,
            original = self.original,
            reshares = self.reshares,
            quoted = self.quoted,
            with_media = self.with_media,
            photos = self.media_types.photo,
            videos = self.media_types.video,
            gifs = self.media_types.animated_gif,
            avg_text_length = self.avg_text_length,
            "Corpus content mix"
        );
    }
}
