//! In-memory stand-ins for the external collaborators: a sandbox ad
//! platform with fault injection, a deterministic template content
//! generator, and notifier doubles. Used by tests and the demo daemon.

use crate::traits::{
    AdPlatform, AudienceSuggestion, ContentGenerator, CopyContext, CopySuggestion, CreativeSpec,
    ExternalStatus, InsightsRow, Notifier, PlatformTargeting, ReportingWindow,
};
use adpilot_core::error::PlatformError;
use adpilot_core::types::{Audience, Gender, InterestId, Product};
use adpilot_core::OptimizeResult;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::info;

// ---------------------------------------------------------------------------
// Sandbox ad platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ExternalAd {
    id: String,
    status: ExternalStatus,
}

#[derive(Debug, Clone)]
struct ExternalCampaign {
    name: String,
    status: ExternalStatus,
    adset_id: String,
    daily_budget: f64,
    ads: Vec<ExternalAd>,
    insights: InsightsRow,
    last_targeting: Option<PlatformTargeting>,
}

/// Simulated ad platform holding external campaign state in memory.
/// Supports per-campaign fault injection so the failure paths the real
/// platform produces (timeouts, rate limits) can be exercised in tests.
pub struct SandboxPlatform {
    campaigns: DashMap<String, ExternalCampaign>,
    timeout_faults: DashSet<String>,
    rate_limit_faults: DashSet<String>,
    request_timeout_secs: u64,
    id_counter: AtomicU64,
}

impl SandboxPlatform {
    pub fn new(request_timeout_secs: u64) -> Self {
        Self {
            campaigns: DashMap::new(),
            timeout_faults: DashSet::new(),
            rate_limit_faults: DashSet::new(),
            request_timeout_secs,
            id_counter: AtomicU64::new(1),
        }
    }

    /// Register an external campaign with one ad set and one active ad.
    pub fn seed_campaign(&self, external_id: &str, name: &str, adset_id: &str, daily_budget: f64) {
        let ad_id = self.next_id("ad");
        self.campaigns.insert(
            external_id.to_string(),
            ExternalCampaign {
                name: name.to_string(),
                status: ExternalStatus::Active,
                adset_id: adset_id.to_string(),
                daily_budget,
                ads: vec![ExternalAd {
                    id: ad_id,
                    status: ExternalStatus::Active,
                }],
                insights: InsightsRow {
                    campaign_name: name.to_string(),
                    ..InsightsRow::default()
                },
                last_targeting: None,
            },
        );
    }

    /// Overwrite the counters the next insights query returns.
    pub fn set_insights(&self, external_id: &str, insights: InsightsRow) {
        if let Some(mut campaign) = self.campaigns.get_mut(external_id) {
            campaign.insights = insights;
        }
    }

    /// Make the next insights call for this campaign time out.
    pub fn inject_timeout(&self, external_id: &str) {
        self.timeout_faults.insert(external_id.to_string());
    }

    /// Make every call for this campaign fail with a rate-limit error.
    pub fn inject_rate_limit(&self, external_id: &str) {
        self.rate_limit_faults.insert(external_id.to_string());
    }

    pub fn external_status(&self, external_id: &str) -> Option<ExternalStatus> {
        self.campaigns.get(external_id).map(|c| c.status)
    }

    pub fn adset_budget(&self, external_id: &str) -> Option<f64> {
        self.campaigns.get(external_id).map(|c| c.daily_budget)
    }

    pub fn last_targeting(&self, external_id: &str) -> Option<PlatformTargeting> {
        self.campaigns
            .get(external_id)
            .and_then(|c| c.last_targeting.clone())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.id_counter.fetch_add(1, Ordering::Relaxed))
    }

    fn check_faults(&self, external_id: &str) -> Result<(), PlatformError> {
        if self.rate_limit_faults.contains(external_id) {
            return Err(PlatformError::RateLimited(format!(
                "too many requests for {}",
                external_id
            )));
        }
        Ok(())
    }

    fn find_by_adset(
        &self,
        adset_id: &str,
    ) -> Result<dashmap::mapref::multiple::RefMutMulti<'_, String, ExternalCampaign>, PlatformError>
    {
        self.campaigns
            .iter_mut()
            .find(|c| c.adset_id == adset_id)
            .ok_or_else(|| PlatformError::NotFound(format!("ad set {}", adset_id)))
    }
}

impl AdPlatform for SandboxPlatform {
    fn get_insights(
        &self,
        external_id: &str,
        _window: ReportingWindow,
    ) -> Result<InsightsRow, PlatformError> {
        if self.timeout_faults.remove(external_id).is_some() {
            return Err(PlatformError::Timeout(self.request_timeout_secs));
        }
        self.check_faults(external_id)?;
        self.campaigns
            .get(external_id)
            .map(|c| c.insights.clone())
            .ok_or_else(|| PlatformError::NotFound(format!("campaign {}", external_id)))
    }

    fn primary_adset(&self, external_id: &str) -> Result<crate::traits::AdSet, PlatformError> {
        self.check_faults(external_id)?;
        self.campaigns
            .get(external_id)
            .map(|c| crate::traits::AdSet {
                id: c.adset_id.clone(),
                daily_budget: c.daily_budget,
            })
            .ok_or_else(|| PlatformError::NotFound(format!("campaign {}", external_id)))
    }

    fn update_budget(&self, adset_id: &str, daily_budget: f64) -> Result<(), PlatformError> {
        if daily_budget <= 0.0 {
            return Err(PlatformError::Validation(format!(
                "daily_budget must be positive, got {}",
                daily_budget
            )));
        }
        let mut campaign = self.find_by_adset(adset_id)?;
        campaign.daily_budget = daily_budget;
        Ok(())
    }

    fn update_targeting(
        &self,
        adset_id: &str,
        targeting: &PlatformTargeting,
    ) -> Result<(), PlatformError> {
        if targeting.interests.is_empty() {
            return Err(PlatformError::Validation(
                "targeting requires at least one interest".to_string(),
            ));
        }
        if targeting.age_min < 13 {
            return Err(PlatformError::Validation(format!(
                "age_min {} below platform minimum",
                targeting.age_min
            )));
        }
        let mut campaign = self.find_by_adset(adset_id)?;
        campaign.last_targeting = Some(targeting.clone());
        Ok(())
    }

    fn set_status(&self, external_id: &str, status: ExternalStatus) -> Result<(), PlatformError> {
        self.check_faults(external_id)?;
        let mut campaign = self
            .campaigns
            .get_mut(external_id)
            .ok_or_else(|| PlatformError::NotFound(format!("campaign {}", external_id)))?;
        campaign.status = status;
        Ok(())
    }

    fn copy_campaign(&self, external_id: &str, suffix: &str) -> Result<String, PlatformError> {
        self.check_faults(external_id)?;
        let original = self
            .campaigns
            .get(external_id)
            .map(|c| c.clone())
            .ok_or_else(|| PlatformError::NotFound(format!("campaign {}", external_id)))?;

        let new_id = self.next_id("camp");
        let new_adset_id = self.next_id("adset");
        self.campaigns.insert(
            new_id.clone(),
            ExternalCampaign {
                name: format!("{} {}", original.name, suffix),
                status: original.status,
                adset_id: new_adset_id,
                daily_budget: original.daily_budget,
                ads: Vec::new(),
                insights: InsightsRow::default(),
                last_targeting: original.last_targeting,
            },
        );
        Ok(new_id)
    }

    fn create_creative(&self, spec: &CreativeSpec) -> Result<String, PlatformError> {
        if spec.headline.is_empty() {
            return Err(PlatformError::Validation(
                "creative headline must not be empty".to_string(),
            ));
        }
        Ok(self.next_id("cr"))
    }

    fn pause_active_ad(&self, adset_id: &str) -> Result<Option<String>, PlatformError> {
        let mut campaign = self.find_by_adset(adset_id)?;
        for ad in campaign.ads.iter_mut() {
            if ad.status == ExternalStatus::Active {
                ad.status = ExternalStatus::Paused;
                return Ok(Some(ad.id.clone()));
            }
        }
        Ok(None)
    }

    fn create_ad(
        &self,
        adset_id: &str,
        _creative_id: &str,
        _name: &str,
    ) -> Result<String, PlatformError> {
        let ad_id = self.next_id("ad");
        let mut campaign = self.find_by_adset(adset_id)?;
        campaign.ads.push(ExternalAd {
            id: ad_id.clone(),
            status: ExternalStatus::Active,
        });
        Ok(ad_id)
    }

    fn resolve_interests(&self, names: &[String]) -> Result<Vec<InterestId>, PlatformError> {
        Ok(names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| InterestId {
                id: format!("cat-{}", n.to_lowercase().replace(' ', "-")),
                name: n.clone(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Template content generator
// ---------------------------------------------------------------------------

/// Deterministic content generator that fills templates from product
/// context. Stands in for the LLM-backed collaborator; its output shape is
/// identical.
#[derive(Default)]
pub struct TemplateContentGenerator;

impl TemplateContentGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ContentGenerator for TemplateContentGenerator {
    fn generate_copy(
        &self,
        product: &Product,
        prior: &CopyContext,
    ) -> OptimizeResult<CopySuggestion> {
        // Vary the hook when refreshing so the new copy is not a repeat.
        let headline = match &prior.previous_headline {
            Some(_) => format!("{} — built for {}", product.name, product.use_cases),
            None => format!("{}: {}", product.name, product.benefits),
        };
        Ok(CopySuggestion {
            headline,
            ad_copy: format!(
                "{} {} Try {} today.",
                product.description, product.benefits, product.name
            ),
            cta: "Shop Now".to_string(),
        })
    }

    fn generate_audience(
        &self,
        product: &Product,
        previous: &Audience,
        _reason: &str,
    ) -> OptimizeResult<AudienceSuggestion> {
        // Widen the age band one step and pivot interests to product terms.
        let mut interests: Vec<String> = product
            .use_cases
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        interests.push(product.name.clone());

        Ok(AudienceSuggestion {
            interests,
            age_min: previous.age_min.max(18),
            age_max: (previous.age_max + 5).min(65),
            gender: Gender::All,
        })
    }
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

/// Production default: alerts land in the structured log stream.
#[derive(Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send_alert(&self, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(subject = %subject, body = %body, "Campaign alert");
        Ok(())
    }
}

/// Test double that counts deliveries.
#[derive(Default)]
pub struct CountingNotifier {
    sent: AtomicUsize,
}

impl CountingNotifier {
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Notifier for CountingNotifier {
    fn send_alert(&self, _subject: &str, _body: &str) -> anyhow::Result<()> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Test double whose failures must be swallowed by callers.
#[derive(Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send_alert(&self, _subject: &str, _body: &str) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("smtp connection refused"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_and_query_insights() {
        let platform = SandboxPlatform::new(30);
        platform.seed_campaign("ext-1", "Sneaker Launch", "adset-1", 40.0);
        platform.set_insights(
            "ext-1",
            InsightsRow {
                campaign_name: "Sneaker Launch".to_string(),
                impressions: 5000,
                reach: 4200,
                frequency: 1.19,
                clicks: 90,
                ctr: 1.8,
                cpc: 0.4,
                spend: 36.0,
            },
        );

        let row = platform.get_insights("ext-1", ReportingWindow::Today).unwrap();
        assert_eq!(row.impressions, 5000);
        assert!((row.spend - 36.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_timeout_fault_fires_once() {
        let platform = SandboxPlatform::new(30);
        platform.seed_campaign("ext-1", "A", "adset-1", 40.0);
        platform.inject_timeout("ext-1");

        let err = platform
            .get_insights("ext-1", ReportingWindow::Today)
            .unwrap_err();
        assert!(matches!(err, PlatformError::Timeout(30)));

        // Fault is consumed; the next call succeeds.
        assert!(platform.get_insights("ext-1", ReportingWindow::Today).is_ok());
    }

    #[test]
    fn test_update_budget_rejects_non_positive() {
        let platform = SandboxPlatform::new(30);
        platform.seed_campaign("ext-1", "A", "adset-1", 40.0);
        let err = platform.update_budget("adset-1", 0.0).unwrap_err();
        assert!(matches!(err, PlatformError::Validation(_)));
    }

    #[test]
    fn test_copy_campaign_creates_new_entry() {
        let platform = SandboxPlatform::new(30);
        platform.seed_campaign("ext-1", "Original", "adset-1", 40.0);
        let new_id = platform.copy_campaign("ext-1", "Clone_ext-1_0815").unwrap();
        assert_ne!(new_id, "ext-1");
        assert_eq!(
            platform.external_status(&new_id),
            Some(ExternalStatus::Active)
        );
    }

    #[test]
    fn test_pause_active_ad_then_none_left() {
        let platform = SandboxPlatform::new(30);
        platform.seed_campaign("ext-1", "A", "adset-1", 40.0);
        let paused = platform.pause_active_ad("adset-1").unwrap();
        assert!(paused.is_some());
        assert!(platform.pause_active_ad("adset-1").unwrap().is_none());
    }

    #[test]
    fn test_resolve_interests_drops_blank_names() {
        let platform = SandboxPlatform::new(30);
        let resolved = platform
            .resolve_interests(&[
                "Running".to_string(),
                "  ".to_string(),
                "Trail Hiking".to_string(),
            ])
            .unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].id, "cat-trail-hiking");
    }
}
