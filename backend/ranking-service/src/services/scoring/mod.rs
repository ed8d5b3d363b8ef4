//! Scoring primitives shared by every ranking bundle.
//!
//! Each function is pure and returns a value in [0,1] unless stated otherwise.
//! Bundles must go through these so identical feature names carry identical
//! semantics in every transparency record.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Viewpoints considered mainstream; authors outside this set contribute to
/// the dissent score.
pub const COMMON_VIEWPOINTS: [&str; 3] = ["centrist", "mainstream", "neutral"];

/// Keyword list for the controversial-topic component of the dissent score.
pub const CONTROVERSIAL_TOPICS: [&str; 4] = ["censorship", "corruption", "conspiracy", "revolution"];

const DECAY_WINDOW_SECS: f32 = 24.0 * 60.0 * 60.0;

/// Linear decay from 1 at `now` to 0 at 24 hours old, clamped for older (and
/// future-dated) posts.
pub fn recency(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_secs = (now - created_at).num_seconds() as f32;
    (1.0 - age_secs / DECAY_WINDOW_SECS).clamp(0.0, 1.0)
}

/// `min(1, distinct_tags / 2)`.
pub fn viewpoint_diversity(tags: &[String]) -> f32 {
    if tags.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = tags.iter().map(|t| t.as_str()).collect();
    (distinct.len() as f32 / 2.0).min(1.0)
}

/// How far a post sits from the mainstream: 0.5 base, +0.3 for viewpoints
/// outside the common set, +0.2 for controversial-topic keywords, capped at 1.
pub fn dissent_score(content: &str, tags: &[String]) -> f32 {
    let mut score: f32 = 0.5;

    let has_uncommon = tags
        .iter()
        .any(|tag| !COMMON_VIEWPOINTS.contains(&tag.as_str()));
    if has_uncommon {
        score += 0.3;
    }

    let lowered = content.to_lowercase();
    if CONTROVERSIAL_TOPICS
        .iter()
        .any(|topic| lowered.contains(topic))
    {
        score += 0.2;
    }

    score.min(1.0)
}

/// High when votes are balanced and replies are plentiful; 0 when there is no
/// vote engagement at all.
pub fn controversy_level(likes: u32, dislikes: u32, replies: u32) -> f32 {
    let votes = likes + dislikes;
    if votes == 0 {
        return 0.0;
    }

    let vote_skew = (likes as f32 - dislikes as f32).abs() / votes as f32;
    let reply_ratio = (replies as f32 / (votes + 1) as f32).min(1.0);

    (1.0 - vote_skew) * 0.6 + reply_ratio * 0.4
}

/// `|likes - dislikes| / (likes + dislikes)`, 0 with no engagement.
pub fn engagement_polarization(likes: u32, dislikes: u32) -> f32 {
    let votes = likes + dislikes;
    if votes == 0 {
        return 0.0;
    }
    (likes as f32 - dislikes as f32).abs() / votes as f32
}

/// Locale match: 1 on exact match with a preferred locale, `partial_score` on
/// a language-only match (en-US vs en-GB), else 0.
pub fn locality_match(author_locale: Option<&str>, preferred: &[String], partial_score: f32) -> f32 {
    let Some(locale) = author_locale else {
        return 0.0;
    };

    if preferred.iter().any(|p| p == locale) {
        return 1.0;
    }

    let author_language = locale.split('-').next().unwrap_or(locale);
    let language_match = preferred
        .iter()
        .any(|p| p.split('-').next().unwrap_or(p) == author_language);

    if language_match {
        partial_score
    } else {
        0.0
    }
}

/// Log-scaled engagement volume; replies weigh double.
pub fn engagement_score(likes: u32, replies: u32) -> f32 {
    let total = likes as f32 + replies as f32 * 2.0;
    ((total + 1.0).log10() / 2.0).min(1.0)
}

/// Linear in content length, saturating at 500 characters.
pub fn content_length_score(length: usize) -> f32 {
    (length as f32 / 500.0).min(1.0)
}

/// Follow-relationship strength: 1.0 for the viewer's own posts, 0.8 for a
/// followed author, 0.5 otherwise (including anonymous passes).
pub fn follow_edge(
    user_id: Option<&str>,
    followed_authors: &HashSet<String>,
    author_id: &str,
) -> f32 {
    match user_id {
        Some(user) if user == author_id => 1.0,
        Some(_) if followed_authors.contains(author_id) => 0.8,
        _ => 0.5,
    }
}
