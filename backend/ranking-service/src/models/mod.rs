use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use transparency::TransparencyRecord;

use crate::services::boost::BoostTransparencyRecord;

/// A candidate post. Immutable for the duration of a ranking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub dislikes: u32,
    pub replies: u32,
}

impl Post {
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            content: content.into(),
            created_at,
            likes: 0,
            dislikes: 0,
            replies: 0,
        }
    }

    pub fn with_engagement(mut self, likes: u32, dislikes: u32, replies: u32) -> Self {
        self.likes = likes;
        self.dislikes = dislikes;
        self.replies = replies;
        self
    }
}

/// Author metadata, read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    /// Reputation in [0,1].
    pub reputation_score: f32,
    pub follower_count: u32,
    /// Viewpoint tags; empty defaults to a neutral tag at read time.
    pub viewpoint_tags: Vec<String>,
    pub locale: Option<String>,
}

impl Author {
    pub fn new(id: impl Into<String>, reputation_score: f32) -> Self {
        Self {
            id: id.into(),
            reputation_score,
            follower_count: 0,
            viewpoint_tags: Vec::new(),
            locale: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.viewpoint_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Fallback author for ids the store does not know.
    pub fn unknown(id: impl Into<String>) -> Self {
        Self::new(id, 0.5)
    }
}

/// Read-only author lookup for a ranking pass. Unknown authors resolve to a
/// neutral default (reputation 0.5, no tags, no locale) so a missing profile
/// never fails a pass.
#[derive(Debug, Clone, Default)]
pub struct AuthorDirectory {
    authors: HashMap<String, Author>,
}

impl AuthorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, author: Author) {
        self.authors.insert(author.id.clone(), author);
    }

    pub fn get(&self, author_id: &str) -> Author {
        self.authors
            .get(author_id)
            .cloned()
            .unwrap_or_else(|| Author::unknown(author_id))
    }
}

impl FromIterator<Author> for AuthorDirectory {
    fn from_iter<I: IntoIterator<Item = Author>>(iter: I) -> Self {
        let mut directory = Self::new();
        for author in iter {
            directory.insert(author);
        }
        directory
    }
}

/// Per-viewer weight overrides. Each bundle supplies its own defaults for
/// anything left unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub recency_weight: Option<f32>,
    pub follow_weight: Option<f32>,
    pub reputation_weight: Option<f32>,
    pub locality_weight: Option<f32>,
    pub preferred_locales: Option<Vec<String>>,
    /// Score granted on a language-only locale match (e.g. en-US vs en-GB).
    pub partial_locale_score: Option<f32>,
    pub dissent_weight: Option<f32>,
    pub diversity_weight: Option<f32>,
    pub controversy_threshold: Option<f32>,
    /// Per-cluster penalty used by the multipolar diversity re-ranking pass.
    pub diversity_penalty: Option<f32>,
}

/// Caller-constructed context, scoped to one ranking pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerContext {
    pub user_id: Option<String>,
    pub preferences: Preferences,
    pub language: Option<String>,
    pub location: Option<String>,
    pub interests: Vec<String>,
    /// Author ids the viewer follows (slice of the follow graph, supplied by
    /// the caller's social store).
    pub followed_authors: HashSet<String>,
}

impl ViewerContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }
}

/// Output of a ranking pass: an ordering plus one transparency record per
/// post, and any boost records the pass generated.
#[derive(Debug, Clone, Default)]
pub struct RankingResult {
    /// Permutation of the input post ids, best first.
    pub ordered_ids: Vec<String>,
    /// One record per input post, in input order.
    pub records: Vec<TransparencyRecord>,
    /// Empty unless the pass went through the boost-enhanced adapter.
    pub boost_records: Vec<BoostTransparencyRecord>,
}
