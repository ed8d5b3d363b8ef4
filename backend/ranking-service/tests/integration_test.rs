use async_trait::async_trait;
use chrono::{Duration, Utc};
use ranking_service::{
    Author, AuthorDirectory, BoostCampaign, BoostEngine, BundleRegistry, CampaignStatus, Post,
    RankingEngine, RankingError, TagViewpointProvider, ViewerContext,
};
use std::sync::Arc;
use transparency::{MemorySink, NoopSigner, Signer, TransparencyRecord, TransparencySink};

fn engine_with_sink() -> (RankingEngine, Arc<MemorySink>) {
    let registry = BundleRegistry::with_defaults(Arc::new(TagViewpointProvider));
    let sink = Arc::new(MemorySink::new());
    let engine = RankingEngine::new(registry, Arc::new(NoopSigner), sink.clone());
    (engine, sink)
}

fn fixture() -> (Vec<Post>, AuthorDirectory) {
    let now = Utc::now();
    let posts = vec![
        Post::new("p1", "alice", "breaking news on corruption", now).with_engagement(30, 28, 50),
        Post::new("p2", "bob", "lunch photos", now - Duration::hours(4)).with_engagement(12, 1, 2),
        Post::new("p3", "carol", "local meetup tonight", now - Duration::hours(1)),
        Post::new("p4", "dave", "thoughts on censorship", now - Duration::hours(8))
            .with_engagement(5, 5, 20),
    ];
    let authors = [
        Author::new("alice", 0.9)
            .with_tags(&["investigative", "media"])
            .with_locale("en-US"),
        Author::new("bob", 0.4).with_locale("en-GB"),
        Author::new("carol", 0.6)
            .with_tags(&["centrist"])
            .with_locale("en-US"),
        Author::new("dave", 0.7)
            .with_tags(&["libertarian", "tech"])
            .with_locale("de-DE"),
    ]
    .into_iter()
    .collect();
    (posts, authors)
}

#[tokio::test]
async fn every_bundle_returns_a_signed_permutation() {
    let (engine, sink) = engine_with_sink();
    let (posts, authors) = fixture();
    let context = ViewerContext::for_user("viewer");

    for bundle in engine.registry().list_all() {
        let result = engine
            .rank(bundle.id(), &posts, &authors, &context)
            .await
            .unwrap();

        let mut ids = result.ordered_ids.clone();
        ids.sort();
        assert_eq!(ids, vec!["p1", "p2", "p3", "p4"], "bundle {}", bundle.id());
        assert_eq!(result.records.len(), posts.len());
        assert!(
            result.records.iter().all(|r| !r.signature.is_empty()),
            "records from {} must be sealed",
            bundle.id()
        );
    }

    // Four bundles, four posts each, all persisted.
    assert_eq!(sink.len().await, 16);
}

#[tokio::test]
async fn unknown_bundle_is_an_error() {
    let (engine, _sink) = engine_with_sink();
    let (posts, authors) = fixture();

    let err = engine
        .rank("chronological", &posts, &authors, &ViewerContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RankingError::UnknownBundle(id) if id == "chronological"));
}

#[tokio::test]
async fn boosted_rank_merges_record_streams() {
    let (engine, sink) = engine_with_sink();
    let (posts, authors) = fixture();
    let context = ViewerContext::for_user("viewer");

    let boost_engine = Arc::new(BoostEngine::new());
    let now = Utc::now();
    boost_engine.add_campaign(
        BoostCampaign::new(
            "camp-1",
            "bob",
            "p2",
            1000.0,
            50.0,
            now - Duration::days(1),
            now + Duration::days(1),
        )
        .with_status(CampaignStatus::Active),
    );

    let result = engine
        .rank_boosted("recency_follow", &posts, &authors, &context, boost_engine.clone())
        .await
        .unwrap();

    let mut ids = result.ordered_ids.clone();
    ids.sort();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4"]);

    assert_eq!(result.boost_records.len(), 1);
    assert_eq!(result.boost_records[0].content_id, "p2");
    let p2 = result.records.iter().find(|r| r.subject_id == "p2").unwrap();
    assert!(p2.is_boosted);

    // The boost engine kept its own ledger and charged the campaign.
    assert_eq!(boost_engine.get_transparency_records("p2").len(), 1);
    let campaign = boost_engine.get_campaign("camp-1").unwrap();
    assert_eq!(campaign.impressions, 1);
    assert!(campaign.spent_budget > 0.0);

    // Base records still flow to the transparency sink.
    assert_eq!(sink.len().await, posts.len());
}

#[tokio::test]
async fn boosted_rank_without_campaigns_matches_plain_rank() {
    let (engine, _sink) = engine_with_sink();
    let (posts, authors) = fixture();
    let context = ViewerContext::for_user("viewer");

    let plain = engine
        .rank("diversity_dissent", &posts, &authors, &context)
        .await
        .unwrap();
    let boosted = engine
        .rank_boosted(
            "diversity_dissent",
            &posts,
            &authors,
            &context,
            Arc::new(BoostEngine::new()),
        )
        .await
        .unwrap();

    assert_eq!(plain.ordered_ids, boosted.ordered_ids);
    assert!(boosted.boost_records.is_empty());
}

struct FailingSink;

#[async_trait]
impl TransparencySink for FailingSink {
    async fn append(&self, _record: &TransparencyRecord) -> transparency::Result<()> {
        Err(transparency::TransparencyError::Sink(
            "store unavailable".to_string(),
        ))
    }
}

struct FailingSigner;

#[async_trait]
impl Signer for FailingSigner {
    async fn sign(&self, _payload: &[u8]) -> transparency::Result<String> {
        Err(transparency::TransparencyError::Signing(
            "signer unavailable".to_string(),
        ))
    }

    async fn verify(&self, _payload: &[u8], _signature: &str) -> transparency::Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn audit_failures_never_fail_the_pass() {
    let registry = BundleRegistry::with_defaults(Arc::new(TagViewpointProvider));
    let engine = RankingEngine::new(registry, Arc::new(FailingSigner), Arc::new(FailingSink));
    let (posts, authors) = fixture();

    let result = engine
        .rank("recency_follow", &posts, &authors, &ViewerContext::default())
        .await
        .unwrap();

    assert_eq!(result.ordered_ids.len(), posts.len());
    // Signing failed, so records remain unsigned but are still returned.
    assert!(result.records.iter().all(|r| r.signature.is_empty()));
}
