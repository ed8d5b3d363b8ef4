use super::{order_descending, RankingBundle};
use crate::models::{AuthorDirectory, Post, RankingResult, ViewerContext};
use crate::services::scoring;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Recency & Follow: recent content from followed, reputable authors.
pub struct RecencyFollowBundle {
    recency_weight: f32,
    follow_weight: f32,
    reputation_weight: f32,
}

impl RecencyFollowBundle {
    pub fn new() -> Self {
        Self {
            recency_weight: 0.4,
            follow_weight: 0.3,
            reputation_weight: 0.3,
        }
    }
}

impl Default for RecencyFollowBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingBundle for RecencyFollowBundle {
    fn id(&self) -> &str {
        "recency_follow"
    }

    fn name(&self) -> &str {
        "Recency & Follow"
    }

    fn description(&self) -> &str {
        "Prioritizes recent content from authors you follow with good reputation"
    }

    fn rank(
        &self,
        posts: &[Post],
        authors: &AuthorDirectory,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> RankingResult {
        let prefs = &context.preferences;
        let recency_weight = prefs.recency_weight.unwrap_or(self.recency_weight);
        let follow_weight = prefs.follow_weight.unwrap_or(self.follow_weight);
        let reputation_weight = prefs.reputation_weight.unwrap_or(self.reputation_weight);

        let mut scored = Vec::with_capacity(posts.len());
        let mut records = Vec::with_capacity(posts.len());

        for post in posts {
            let author = authors.get(&post.author_id);

            let recency = scoring::recency(post.created_at, now);
            let follow_edge = scoring::follow_edge(
                context.user_id.as_deref(),
                &context.followed_authors,
                &post.author_id,
            );
            let reputation = author.reputation_score;
            let engagement = scoring::engagement_score(post.likes, post.replies);
            let content_length = post.content.chars().count();
            let length_score = scoring::content_length_score(content_length);

            let score = recency * recency_weight
                + follow_edge * follow_weight
                + reputation * reputation_weight
                + engagement * 0.1
                + length_score * 0.1;

            let mut explanation = Vec::new();
            if recency > 0.7 {
                explanation.push("Recent post".to_string());
            }
            if follow_edge > 0.7 {
                explanation.push("Followed author".to_string());
            }
            if reputation > 0.7 {
                explanation.push("Credible author".to_string());
            }
            if engagement > 0.7 {
                explanation.push("High engagement".to_string());
            }
            if content_length > 200 && content_length < 1000 {
                explanation.push("Optimal content length".to_string());
            }

            records.push(
                transparency::TransparencyRecord::new(&post.id, self.id(), score)
                    .with_feature("recency", recency)
                    .with_feature("follow_edge", follow_edge)
                    .with_feature("author_reputation", reputation)
                    .with_feature("engagement_score", engagement)
                    .with_feature("content_length", content_length as f32)
                    .with_explanation(explanation),
            );

            scored.push((post.id.clone(), score));
        }

        order_descending(&mut scored);
        debug!(
            bundle_id = self.id(),
            post_count = posts.len(),
            "ranking pass scored"
        );

        RankingResult {
            ordered_ids: scored.into_iter().map(|(id, _)| id).collect(),
            records,
            boost_records: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;

    fn directory() -> AuthorDirectory {
        [
            Author::new("alice", 0.9),
            Author::new("bob", 0.3),
            Author::new("carol", 0.5),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn output_is_a_permutation_with_one_record_per_post() {
        let now = Utc::now();
        let posts = vec![
            Post::new("p1", "alice", "hello", now),
            Post::new("p2", "bob", "world", now - chrono::Duration::hours(30)),
            Post::new("p3", "carol", "again", now - chrono::Duration::hours(2)),
        ];

        let result =
            RecencyFollowBundle::new().rank(&posts, &directory(), &ViewerContext::default(), now);

        assert_eq!(result.records.len(), posts.len());
        let mut ids = result.ordered_ids.clone();
        ids.sort();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn fresh_reputable_post_dominates() {
        // Scenario: post at `now`, zero engagement, reputation 0.9, no follow
        // relation. Score is dominated by recency and reputation; explanation
        // names both.
        let now = Utc::now();
        let posts = vec![
            Post::new("fresh", "alice", "hello", now),
            Post::new("stale", "bob", "old news", now - chrono::Duration::hours(23)),
        ];

        let result =
            RecencyFollowBundle::new().rank(&posts, &directory(), &ViewerContext::default(), now);

        assert_eq!(result.ordered_ids[0], "fresh");

        let record = &result.records[0];
        assert_eq!(record.subject_id, "fresh");
        // recency(~1)*0.4 + follow(0.5)*0.3 + 0.9*0.3 = ~0.82
        assert!((record.score - 0.82).abs() < 0.02, "score {}", record.score);
        assert!(record.explanation.contains(&"Recent post".to_string()));
        assert!(record.explanation.contains(&"Credible author".to_string()));
    }

    #[test]
    fn followed_author_outranks_stranger_of_equal_reputation() {
        let now = Utc::now();
        let posts = vec![
            Post::new("p1", "carol", "same text", now),
            Post::new("p2", "dave", "same text", now),
        ];

        let mut context = ViewerContext::for_user("viewer");
        context.followed_authors.insert("dave".to_string());

        let result = RecencyFollowBundle::new().rank(&posts, &directory(), &context, now);

        assert_eq!(result.ordered_ids[0], "p2");
        let followed = result.records.iter().find(|r| r.subject_id == "p2").unwrap();
        assert!(followed.explanation.contains(&"Followed author".to_string()));
    }

    #[test]
    fn identical_posts_keep_input_order() {
        let now = Utc::now();
        let posts = vec![
            Post::new("first", "carol", "same", now),
            Post::new("second", "carol", "same", now),
        ];

        let result =
            RecencyFollowBundle::new().rank(&posts, &directory(), &ViewerContext::default(), now);

        assert_eq!(result.ordered_ids, vec!["first", "second"]);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let now = Utc::now();
        let posts = vec![
            Post::new("p1", "alice", "one", now - chrono::Duration::hours(1))
                .with_engagement(10, 2, 4),
            Post::new("p2", "bob", "two", now - chrono::Duration::hours(3)),
        ];
        let context = ViewerContext::for_user("viewer");
        let bundle = RecencyFollowBundle::new();

        let a = bundle.rank(&posts, &directory(), &context, now);
        let b = bundle.rank(&posts, &directory(), &context, now);

        assert_eq!(a.ordered_ids, b.ordered_ids);
        for (ra, rb) in a.records.iter().zip(b.records.iter()) {
            assert_eq!(ra.score, rb.score);
            assert_eq!(ra.explanation, rb.explanation);
        }
    }
}
