//! Paid-boost overlay: capped score uplift under a budget-paced campaign
//! model, with a transparency record for every applied boost.

pub mod enhanced;

pub use enhanced::BoostEnhancedBundle;

use crate::error::{RankingError, Result};
use crate::models::ViewerContext;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Hard ceiling on any campaign's uplift cap: at most 15% score uplift.
pub const MAX_UPLIFT_CAP: f32 = 0.15;

const PACING_WARN_RATIO: f32 = 0.7;
const PACING_PAUSE_RATIO: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Posts,
    Shorts,
    Vod,
    Truth,
}

/// Audience constraints for a campaign. Empty lists match everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoostTargeting {
    pub topics: Vec<String>,
    pub languages: Vec<String>,
    pub regions: Vec<String>,
    // Follower bounds are carried for the external admin surface; the engine
    // has no viewer follower count to evaluate them against.
    pub min_follower_count: Option<u32>,
    pub max_follower_count: Option<u32>,
    pub interests: Vec<String>,
    pub surfaces: Vec<Surface>,
}

/// A paid distribution campaign. Budgets and bids are in USD cents; spend
/// accrues at `max_bid / 100` per impression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostCampaign {
    pub id: String,
    pub creator_id: String,
    pub content_id: String,
    pub total_budget: f32,
    pub daily_budget: Option<f32>,
    pub max_bid: f32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub targeting: BoostTargeting,
    pub status: CampaignStatus,
    /// Monotonically non-decreasing; never exceeds `total_budget`.
    pub spent_budget: f32,
    pub impressions: u64,
    /// Fraction of the base score this campaign may add, at most
    /// [`MAX_UPLIFT_CAP`] regardless of bid size.
    pub uplift_cap: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoostCampaign {
    pub fn new(
        id: impl Into<String>,
        creator_id: impl Into<String>,
        content_id: impl Into<String>,
        total_budget: f32,
        max_bid: f32,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            creator_id: creator_id.into(),
            content_id: content_id.into(),
            total_budget,
            daily_budget: None,
            max_bid,
            start_date,
            end_date,
            targeting: BoostTargeting::default(),
            status: CampaignStatus::Draft,
            spent_budget: 0.0,
            impressions: 0,
            uplift_cap: MAX_UPLIFT_CAP,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: CampaignStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_targeting(mut self, targeting: BoostTargeting) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_daily_budget(mut self, daily_budget: f32) -> Self {
        self.daily_budget = Some(daily_budget);
        self
    }

    pub fn with_uplift_cap(mut self, uplift_cap: f32) -> Self {
        self.uplift_cap = uplift_cap;
        self
    }

    fn budget_exhausted(&self) -> bool {
        self.spent_budget >= self.total_budget
    }

    fn in_flight_window(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    WithinBudget,
    ApproachingLimit,
    Paused,
}

impl PacingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacingStatus::WithinBudget => "within_budget",
            PacingStatus::ApproachingLimit => "approaching_limit",
            PacingStatus::Paused => "paused",
        }
    }
}

/// Viewer targeting context snapshot stored in the boost record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub interests: Vec<String>,
    pub location: Option<String>,
    pub language: Option<String>,
}

impl From<&ViewerContext> for ViewerSnapshot {
    fn from(context: &ViewerContext) -> Self {
        Self {
            interests: context.interests.clone(),
            location: context.location.clone(),
            language: context.language.clone(),
        }
    }
}

/// Auditable record of one applied boost. Also the pacing ledger: daily spend
/// is computed from the day's records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostTransparencyRecord {
    pub id: Uuid,
    pub campaign_id: String,
    pub content_id: String,
    pub ranking_session_id: Uuid,
    pub base_score: f32,
    pub boost_uplift: f32,
    pub final_score: f32,
    /// Applied uplift fraction; never exceeds the campaign's `uplift_cap`.
    pub uplift_fraction: f32,
    pub ranking_algorithm: String,
    pub viewer: ViewerSnapshot,
    pub bid_amount: f32,
    pub pacing_status: PacingStatus,
    pub timestamp: DateTime<Utc>,
}

/// Result of a boost lookup: the (possibly unchanged) score and the record,
/// if a campaign applied.
#[derive(Debug, Clone)]
pub struct BoostOutcome {
    pub final_score: f32,
    pub record: Option<BoostTransparencyRecord>,
}

impl BoostOutcome {
    fn unboosted(base_score: f32) -> Self {
        Self {
            final_score: base_score,
            record: None,
        }
    }
}

/// Campaign store plus the append-only boost record log.
///
/// Campaigns live in a `DashMap`; the `get_mut` entry guard serializes the
/// read-check-spend-update sequence per campaign, so concurrent calls against
/// one campaign cannot jointly overspend while unrelated campaigns proceed in
/// parallel.
#[derive(Debug, Default)]
pub struct BoostEngine {
    campaigns: DashMap<String, BoostCampaign>,
    records: RwLock<Vec<BoostTransparencyRecord>>,
}

impl BoostEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a campaign. An out-of-range uplift cap is clamped to the hard
    /// ceiling rather than rejected.
    pub fn add_campaign(&self, mut campaign: BoostCampaign) {
        if campaign.uplift_cap > MAX_UPLIFT_CAP || campaign.uplift_cap < 0.0 {
            warn!(
                campaign_id = %campaign.id,
                uplift_cap = campaign.uplift_cap,
                "uplift cap out of range, clamping"
            );
            campaign.uplift_cap = campaign.uplift_cap.clamp(0.0, MAX_UPLIFT_CAP);
        }
        self.campaigns.insert(campaign.id.clone(), campaign);
    }

    pub fn get_campaign(&self, campaign_id: &str) -> Option<BoostCampaign> {
        self.campaigns.get(campaign_id).map(|c| c.clone())
    }

    /// Admin status transition. Terminal campaigns stay terminal.
    pub fn set_status(&self, campaign_id: &str, status: CampaignStatus) -> Result<()> {
        let mut campaign = self
            .campaigns
            .get_mut(campaign_id)
            .ok_or_else(|| RankingError::CampaignNotFound(campaign_id.to_string()))?;

        if campaign.status.is_terminal() {
            return Err(RankingError::InvalidCampaignState {
                from: campaign.status.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        campaign.status = status;
        campaign.updated_at = Utc::now();
        Ok(())
    }

    pub fn get_active_campaigns(&self, now: DateTime<Utc>) -> Vec<BoostCampaign> {
        self.campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Active && c.in_flight_window(now))
            .map(|c| c.clone())
            .collect()
    }

    pub fn get_transparency_records(&self, content_id: &str) -> Vec<BoostTransparencyRecord> {
        self.records_read()
            .iter()
            .filter(|r| r.content_id == content_id)
            .cloned()
            .collect()
    }

    /// Bid total (cents) already committed today for a campaign.
    pub fn daily_spend(&self, campaign_id: &str, now: DateTime<Utc>) -> f32 {
        let today = now.date_naive();
        self.records_read()
            .iter()
            .filter(|r| r.campaign_id == campaign_id && r.timestamp.date_naive() == today)
            .map(|r| r.bid_amount)
            .sum()
    }

    /// Apply the best-matching active campaign's uplift to a base score.
    ///
    /// Boost is best-effort: an ineligible or missing campaign returns the
    /// base score untouched rather than an error. When a campaign applies,
    /// the budget check, spend increment, and record append happen under one
    /// per-campaign guard.
    pub fn apply_boost(
        &self,
        content_id: &str,
        base_score: f32,
        ranking_algorithm: &str,
        context: &ViewerContext,
        now: DateTime<Utc>,
    ) -> BoostOutcome {
        let candidate_ids: Vec<String> = self
            .campaigns
            .iter()
            .filter(|c| c.content_id == content_id)
            .map(|c| c.id.clone())
            .collect();

        for campaign_id in candidate_ids {
            let Some(mut campaign) = self.campaigns.get_mut(&campaign_id) else {
                continue;
            };

            // Re-checked under the entry guard: another request may have
            // exhausted the budget since the scan above.
            if campaign.status != CampaignStatus::Active
                || !campaign.in_flight_window(now)
                || campaign.budget_exhausted()
                || !matches_targeting(&campaign.targeting, context)
            {
                continue;
            }

            let uplift_fraction = campaign.uplift_cap.min((campaign.max_bid / 100.0) * 0.1);
            let boost_uplift = base_score * uplift_fraction;
            let final_score = base_score + boost_uplift;

            let pacing_status = pacing_status(
                campaign.daily_budget,
                self.daily_spend(&campaign.id, now),
            );

            campaign.spent_budget += campaign.max_bid / 100.0;
            campaign.impressions += 1;
            campaign.updated_at = now;

            let record = BoostTransparencyRecord {
                id: Uuid::new_v4(),
                campaign_id: campaign.id.clone(),
                content_id: content_id.to_string(),
                ranking_session_id: Uuid::new_v4(),
                base_score,
                boost_uplift,
                final_score,
                uplift_fraction,
                ranking_algorithm: ranking_algorithm.to_string(),
                viewer: ViewerSnapshot::from(context),
                bid_amount: campaign.max_bid,
                pacing_status,
                timestamp: now,
            };

            // Same critical section as the spend update: spend never moves
            // without its record.
            self.records_write().push(record.clone());

            debug!(
                campaign_id = %record.campaign_id,
                content_id,
                uplift_fraction,
                pacing_status = pacing_status.as_str(),
                "boost applied"
            );

            return BoostOutcome {
                final_score,
                record: Some(record),
            };
        }

        BoostOutcome::unboosted(base_score)
    }

    fn records_read(&self) -> std::sync::RwLockReadGuard<'_, Vec<BoostTransparencyRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn records_write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<BoostTransparencyRecord>> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Language and region must intersect when specified; interests need at least
/// one overlap when specified.
fn matches_targeting(targeting: &BoostTargeting, context: &ViewerContext) -> bool {
    if !targeting.languages.is_empty() {
        match &context.language {
            Some(language) if targeting.languages.contains(language) => {}
            _ => return false,
        }
    }

    if !targeting.regions.is_empty() {
        match &context.location {
            Some(location) if targeting.regions.contains(location) => {}
            _ => return false,
        }
    }

    if !targeting.interests.is_empty() {
        let overlaps = targeting
            .interests
            .iter()
            .any(|interest| context.interests.contains(interest));
        if !overlaps {
            return false;
        }
    }

    true
}

fn pacing_status(daily_budget: Option<f32>, daily_spend: f32) -> PacingStatus {
    let Some(daily_budget) = daily_budget else {
        return PacingStatus::WithinBudget;
    };

    let utilization = daily_spend / daily_budget;
    if utilization >= PACING_PAUSE_RATIO {
        PacingStatus::Paused
    } else if utilization >= PACING_WARN_RATIO {
        PacingStatus::ApproachingLimit
    } else {
        PacingStatus::WithinBudget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn active_campaign(id: &str, content_id: &str, total_budget: f32, max_bid: f32) -> BoostCampaign {
        let now = Utc::now();
        BoostCampaign::new(
            id,
            "creator-1",
            content_id,
            total_budget,
            max_bid,
            now - Duration::days(1),
            now + Duration::days(1),
        )
        .with_status(CampaignStatus::Active)
    }

    #[test]
    fn uplift_follows_bid_under_the_cap() {
        // totalBudget=1000, upliftCap=0.15, maxBid=50, baseScore=0.5:
        // fraction = min(0.15, 0.5*0.1) = 0.05, final = 0.525.
        let engine = BoostEngine::new();
        engine.add_campaign(active_campaign("c1", "post-1", 1000.0, 50.0));

        let outcome =
            engine.apply_boost("post-1", 0.5, "recency_follow", &ViewerContext::default(), Utc::now());

        assert!((outcome.final_score - 0.525).abs() < 1e-6);
        let record = outcome.record.unwrap();
        assert!((record.uplift_fraction - 0.05).abs() < 1e-6);
        assert_eq!(record.bid_amount, 50.0);
        assert_eq!(record.pacing_status, PacingStatus::WithinBudget);
    }

    #[test]
    fn uplift_never_exceeds_cap_regardless_of_bid() {
        let engine = BoostEngine::new();
        let campaign = active_campaign("c1", "post-1", 100_000.0, 10_000.0).with_uplift_cap(0.15);
        engine.add_campaign(campaign);

        for base_score in [0.1_f32, 0.5, 0.9] {
            let outcome = engine.apply_boost(
                "post-1",
                base_score,
                "recency_follow",
                &ViewerContext::default(),
                Utc::now(),
            );
            assert!(
                outcome.final_score - base_score <= base_score * 0.15 + 1e-6,
                "uplift exceeded cap at base {}",
                base_score
            );
        }
    }

    #[test]
    fn out_of_range_cap_is_clamped_on_registration() {
        let engine = BoostEngine::new();
        engine.add_campaign(active_campaign("c1", "post-1", 1000.0, 50.0).with_uplift_cap(0.5));

        assert_eq!(engine.get_campaign("c1").unwrap().uplift_cap, MAX_UPLIFT_CAP);
    }

    #[test]
    fn no_campaign_returns_base_score() {
        let engine = BoostEngine::new();

        let outcome =
            engine.apply_boost("post-1", 0.4, "recency_follow", &ViewerContext::default(), Utc::now());

        assert_eq!(outcome.final_score, 0.4);
        assert!(outcome.record.is_none());
    }

    #[test]
    fn inactive_or_out_of_window_campaigns_never_boost() {
        let engine = BoostEngine::new();
        let now = Utc::now();

        engine.add_campaign(active_campaign("draft", "post-1", 1000.0, 50.0).with_status(CampaignStatus::Draft));

        let mut expired = active_campaign("expired", "post-2", 1000.0, 50.0);
        expired.start_date = now - Duration::days(10);
        expired.end_date = now - Duration::days(5);
        engine.add_campaign(expired);

        for content_id in ["post-1", "post-2"] {
            let outcome =
                engine.apply_boost(content_id, 0.5, "recency_follow", &ViewerContext::default(), now);
            assert!(outcome.record.is_none());
        }
    }

    #[test]
    fn exhausted_budget_stops_boosting() {
        // spend accrues at max_bid/100 = 0.5 per call; total 1.0 allows two.
        let engine = BoostEngine::new();
        engine.add_campaign(active_campaign("c1", "post-1", 1.0, 50.0));
        let context = ViewerContext::default();

        for _ in 0..2 {
            let outcome = engine.apply_boost("post-1", 0.5, "recency_follow", &context, Utc::now());
            assert!(outcome.record.is_some());
        }

        let third = engine.apply_boost("post-1", 0.5, "recency_follow", &context, Utc::now());
        assert!(third.record.is_none());

        let campaign = engine.get_campaign("c1").unwrap();
        assert!(campaign.spent_budget <= campaign.total_budget);
        assert_eq!(campaign.impressions, 2);
    }

    #[test]
    fn targeting_requires_language_region_and_interest_overlap() {
        let engine = BoostEngine::new();
        let campaign = active_campaign("c1", "post-1", 1000.0, 50.0).with_targeting(BoostTargeting {
            languages: vec!["en".to_string()],
            regions: vec!["us".to_string()],
            interests: vec!["tech".to_string(), "music".to_string()],
            ..Default::default()
        });
        engine.add_campaign(campaign);

        let matching = ViewerContext {
            language: Some("en".to_string()),
            location: Some("us".to_string()),
            interests: vec!["music".to_string()],
            ..Default::default()
        };
        assert!(engine
            .apply_boost("post-1", 0.5, "recency_follow", &matching, Utc::now())
            .record
            .is_some());

        let wrong_language = ViewerContext {
            language: Some("fr".to_string()),
            location: Some("us".to_string()),
            interests: vec!["music".to_string()],
            ..Default::default()
        };
        assert!(engine
            .apply_boost("post-1", 0.5, "recency_follow", &wrong_language, Utc::now())
            .record
            .is_none());

        let no_shared_interest = ViewerContext {
            language: Some("en".to_string()),
            location: Some("us".to_string()),
            interests: vec!["cooking".to_string()],
            ..Default::default()
        };
        assert!(engine
            .apply_boost("post-1", 0.5, "recency_follow", &no_shared_interest, Utc::now())
            .record
            .is_none());
    }

    #[test]
    fn pacing_escalates_against_daily_budget() {
        // daily budget 100 cents, bid 40: recorded spend before each call is
        // 0, 40, 80, 120 -> within, within, approaching, paused.
        let engine = BoostEngine::new();
        engine.add_campaign(
            active_campaign("c1", "post-1", 10_000.0, 40.0).with_daily_budget(100.0),
        );
        let context = ViewerContext::default();
        let now = Utc::now();

        let statuses: Vec<PacingStatus> = (0..4)
            .map(|_| {
                engine
                    .apply_boost("post-1", 0.5, "recency_follow", &context, now)
                    .record
                    .unwrap()
                    .pacing_status
            })
            .collect();

        assert_eq!(
            statuses,
            vec![
                PacingStatus::WithinBudget,
                PacingStatus::WithinBudget,
                PacingStatus::ApproachingLimit,
                PacingStatus::Paused,
            ]
        );

        // Pacing is informational: the paused status did not block the spend.
        assert_eq!(engine.get_campaign("c1").unwrap().impressions, 4);
    }

    #[test]
    fn every_spend_has_a_record() {
        let engine = BoostEngine::new();
        engine.add_campaign(active_campaign("c1", "post-1", 1000.0, 50.0));
        let context = ViewerContext::default();

        for _ in 0..5 {
            engine.apply_boost("post-1", 0.5, "recency_follow", &context, Utc::now());
        }

        let campaign = engine.get_campaign("c1").unwrap();
        assert_eq!(campaign.impressions as usize, engine.get_transparency_records("post-1").len());
    }

    #[test]
    fn status_transitions_reject_terminal_exits() {
        let engine = BoostEngine::new();
        engine.add_campaign(active_campaign("c1", "post-1", 1000.0, 50.0));

        engine.set_status("c1", CampaignStatus::Completed).unwrap();
        let err = engine.set_status("c1", CampaignStatus::Active).unwrap_err();
        assert!(matches!(
            err,
            crate::error::RankingError::InvalidCampaignState { .. }
        ));

        assert!(matches!(
            engine.set_status("missing", CampaignStatus::Active),
            Err(crate::error::RankingError::CampaignNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_boosts_never_overspend() {
        // total budget admits exactly 4 spends of 0.5; 32 concurrent calls
        // race for them.
        let engine = Arc::new(BoostEngine::new());
        engine.add_campaign(active_campaign("c1", "post-1", 2.0, 50.0));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .apply_boost(
                            "post-1",
                            0.5,
                            "recency_follow",
                            &ViewerContext::default(),
                            Utc::now(),
                        )
                        .record
                        .is_some()
                })
            })
            .collect();

        let mut boosted = 0;
        for task in tasks {
            if task.await.unwrap() {
                boosted += 1;
            }
        }

        let campaign = engine.get_campaign("c1").unwrap();
        assert!(campaign.spent_budget <= campaign.total_budget + 1e-6);
        assert_eq!(boosted, 4);
        assert_eq!(campaign.impressions, 4);
    }

    #[test]
    fn active_campaign_listing_respects_window_and_status() {
        let engine = BoostEngine::new();
        let now = Utc::now();
        engine.add_campaign(active_campaign("live", "post-1", 1000.0, 50.0));
        engine.add_campaign(active_campaign("paused", "post-2", 1000.0, 50.0).with_status(CampaignStatus::Paused));

        let active = engine.get_active_campaigns(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "live");
    }
}
