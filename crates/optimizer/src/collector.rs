//! Metric collection: fetch one campaign's raw counters from the ad
//! platform, merge in internally attributed revenue and conversions,
//! derive the rate metrics, and persist the snapshot on the campaign.

use adpilot_core::types::{Campaign, CampaignUpdate, MetricsSnapshot};
use adpilot_core::{OptimizeError, OptimizeResult};
use adpilot_platform::traits::ReportingWindow;
use adpilot_platform::{AdPlatform, CampaignStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

pub struct MetricCollector {
    platform: Arc<dyn AdPlatform>,
    store: Arc<dyn CampaignStore>,
    window: ReportingWindow,
}

impl MetricCollector {
    pub fn new(
        platform: Arc<dyn AdPlatform>,
        store: Arc<dyn CampaignStore>,
        window: ReportingWindow,
    ) -> Self {
        Self {
            platform,
            store,
            window,
        }
    }

    /// Build this cycle's snapshot for one campaign. Divide-by-zero guards
    /// keep every derived rate at 0.0 rather than NaN; the snapshot is
    /// persisted before it is returned.
    pub fn collect(&self, campaign: &Campaign) -> OptimizeResult<MetricsSnapshot> {
        let row = self
            .platform
            .get_insights(&campaign.external_id, self.window)
            .map_err(|e| {
                OptimizeError::Collection(format!(
                    "insights for campaign {}: {}",
                    campaign.external_id, e
                ))
            })?;

        let now = Utc::now();
        let days_running = campaign.days_running(now);

        let roas = if row.spend > 0.0 && campaign.revenue > 0.0 {
            round2(campaign.revenue / row.spend)
        } else {
            0.0
        };
        let conversion_rate = if campaign.conversions > 0 && row.clicks > 0 {
            round2(campaign.conversions as f64 / row.clicks as f64 * 100.0)
        } else {
            0.0
        };
        let cost_per_conversion = if campaign.conversions > 0 {
            round2(row.spend / campaign.conversions as f64)
        } else {
            0.0
        };
        let daily_spend = round2(row.spend / f64::from(days_running));

        let snapshot = MetricsSnapshot {
            impressions: row.impressions,
            reach: row.reach,
            frequency: row.frequency,
            clicks: row.clicks,
            ctr: row.ctr,
            cpc: row.cpc,
            spend: row.spend,
            conversions: campaign.conversions,
            revenue: campaign.revenue,
            roas,
            conversion_rate,
            cost_per_conversion,
            daily_spend,
            days_running,
            collected_at: now,
        };

        self.store.apply(
            campaign.id,
            CampaignUpdate {
                latest_metrics: Some(snapshot.clone()),
                ..CampaignUpdate::default()
            },
        )?;

        debug!(
            campaign_id = %campaign.id,
            spend = row.spend,
            roas,
            conversions = campaign.conversions,
            "Metrics collected"
        );
        Ok(snapshot)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use adpilot_core::types::{Audience, CampaignStatus};
    use adpilot_platform::traits::InsightsRow;
    use adpilot_platform::{InMemoryCampaignStore, SandboxPlatform};
    use uuid::Uuid;

    fn seeded(revenue: f64, conversions: u64, insights: InsightsRow) -> (MetricCollector, Campaign) {
        let platform = Arc::new(SandboxPlatform::new(30));
        let store = Arc::new(InMemoryCampaignStore::new());
        platform.seed_campaign("ext-1", "Test", "adset-1", 40.0);
        platform.set_insights("ext-1", insights);

        let created = Utc::now() - chrono::Duration::days(4);
        let campaign = Campaign {
            id: Uuid::new_v4(),
            external_id: "ext-1".to_string(),
            adset_id: Some("adset-1".to_string()),
            product_id: Uuid::new_v4(),
            name: "Test".to_string(),
            objective: "conversions".to_string(),
            status: CampaignStatus::Active,
            budget: 40.0,
            audience: Audience::default(),
            headline: None,
            ad_copy: None,
            cta: None,
            creative_ids: Vec::new(),
            revenue,
            conversions,
            latest_metrics: None,
            created_at: created,
            updated_at: created,
        };
        store.insert(campaign.clone()).unwrap();

        let collector = MetricCollector::new(platform, store, ReportingWindow::Today);
        (collector, campaign)
    }

    #[test]
    fn test_derived_metrics() {
        let (collector, campaign) = seeded(
            120.0,
            4,
            InsightsRow {
                impressions: 5000,
                clicks: 100,
                spend: 40.0,
                ctr: 2.0,
                cpc: 0.4,
                ..InsightsRow::default()
            },
        );

        let snapshot = collector.collect(&campaign).unwrap();
        assert!((snapshot.roas - 3.0).abs() < f64::EPSILON);
        assert!((snapshot.conversion_rate - 4.0).abs() < f64::EPSILON);
        assert!((snapshot.cost_per_conversion - 10.0).abs() < f64::EPSILON);
        assert!((snapshot.daily_spend - 10.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.days_running, 4);
    }

    #[test]
    fn test_zero_guards() {
        let (collector, campaign) = seeded(0.0, 0, InsightsRow::default());

        let snapshot = collector.collect(&campaign).unwrap();
        assert_eq!(snapshot.roas, 0.0);
        assert_eq!(snapshot.conversion_rate, 0.0);
        assert_eq!(snapshot.cost_per_conversion, 0.0);
        assert_eq!(snapshot.daily_spend, 0.0);
    }

    #[test]
    fn test_timeout_surfaces_as_collection_error() {
        let platform = Arc::new(SandboxPlatform::new(30));
        let store = Arc::new(InMemoryCampaignStore::new());
        platform.seed_campaign("ext-1", "Test", "adset-1", 40.0);
        platform.inject_timeout("ext-1");

        let (_, campaign) = seeded(0.0, 0, InsightsRow::default());
        let collector = MetricCollector::new(platform, store.clone(), ReportingWindow::Today);
        // Campaign is not in this store, but collection fails first.
        let err = collector.collect(&campaign).unwrap_err();
        assert!(matches!(err, OptimizeError::Collection(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_snapshot_is_persisted() {
        let (collector, campaign) = seeded(
            50.0,
            2,
            InsightsRow {
                clicks: 40,
                spend: 25.0,
                ..InsightsRow::default()
            },
        );

        let snapshot = collector.collect(&campaign).unwrap();
        let stored = collector.store.get(campaign.id).unwrap();
        assert_eq!(stored.latest_metrics, Some(snapshot));
    }
}
