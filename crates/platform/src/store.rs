//! Campaign store boundary and the concurrent in-memory implementation
//! backing tests and the demo daemon.

use adpilot_core::types::{
    Campaign, CampaignStatus, CampaignUpdate, Creative, OptimizationLog, Product,
};
use adpilot_core::{OptimizeError, OptimizeResult};
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// Read/update contract the optimizer holds against campaign persistence.
/// Campaign mutation goes exclusively through [`CampaignStore::apply`] with
/// a narrow [`CampaignUpdate`]; the optimization log is append-only.
pub trait CampaignStore: Send + Sync {
    fn get(&self, id: Uuid) -> OptimizeResult<Campaign>;

    /// Insert a new campaign record (used when cloning).
    fn insert(&self, campaign: Campaign) -> OptimizeResult<()>;

    /// Merge the non-`None` fields of `update` into the stored record and
    /// return the updated campaign.
    fn apply(&self, id: Uuid, update: CampaignUpdate) -> OptimizeResult<Campaign>;

    /// All campaigns currently in `active` status.
    fn active(&self) -> Vec<Campaign>;

    fn product(&self, id: Uuid) -> OptimizeResult<Product>;

    /// The creative currently live for this campaign, if any.
    fn active_creative(&self, campaign: &Campaign) -> Option<Creative>;

    /// The next active creative for a product, excluding the one given.
    fn next_creative(&self, product_id: Uuid, exclude: Option<Uuid>) -> Option<Creative>;

    fn set_creative_active(&self, id: Uuid, active: bool) -> OptimizeResult<()>;

    /// Append an audit record. Logs are never mutated after creation.
    fn append_log(&self, log: OptimizationLog);

    fn logs_for(&self, campaign_id: Uuid) -> Vec<OptimizationLog>;
}

/// Concurrent in-memory store backed by `DashMap`.
#[derive(Default)]
pub struct InMemoryCampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
    products: DashMap<Uuid, Product>,
    creatives: DashMap<Uuid, Creative>,
    logs: DashMap<Uuid, Vec<OptimizationLog>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn insert_creative(&self, creative: Creative) {
        self.creatives.insert(creative.id, creative);
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

impl CampaignStore for InMemoryCampaignStore {
    fn get(&self, id: Uuid) -> OptimizeResult<Campaign> {
        self.campaigns
            .get(&id)
            .map(|c| c.clone())
            .ok_or_else(|| OptimizeError::Store(format!("campaign {} not found", id)))
    }

    fn insert(&self, campaign: Campaign) -> OptimizeResult<()> {
        if self.campaigns.contains_key(&campaign.id) {
            return Err(OptimizeError::Store(format!(
                "campaign {} already exists",
                campaign.id
            )));
        }
        self.campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    fn apply(&self, id: Uuid, update: CampaignUpdate) -> OptimizeResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| OptimizeError::Store(format!("campaign {} not found", id)))?;

        let campaign = entry.value_mut();
        if let Some(status) = update.status {
            campaign.status = status;
        }
        if let Some(budget) = update.budget {
            campaign.budget = budget;
        }
        if let Some(audience) = update.audience {
            campaign.audience = audience;
        }
        if let Some(headline) = update.headline {
            campaign.headline = Some(headline);
        }
        if let Some(ad_copy) = update.ad_copy {
            campaign.ad_copy = Some(ad_copy);
        }
        if let Some(cta) = update.cta {
            campaign.cta = Some(cta);
        }
        if let Some(creative_ids) = update.creative_ids {
            campaign.creative_ids = creative_ids;
        }
        if let Some(metrics) = update.latest_metrics {
            campaign.latest_metrics = Some(metrics);
        }
        if let Some(external_id) = update.external_id {
            campaign.external_id = external_id;
        }
        if let Some(adset_id) = update.adset_id {
            campaign.adset_id = Some(adset_id);
        }
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    fn active(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Active)
            .map(|c| c.clone())
            .collect();
        // Stable processing order across cycles.
        campaigns.sort_by_key(|c| c.created_at);
        campaigns
    }

    fn product(&self, id: Uuid) -> OptimizeResult<Product> {
        self.products
            .get(&id)
            .map(|p| p.clone())
            .ok_or_else(|| OptimizeError::Store(format!("product {} not found", id)))
    }

    fn active_creative(&self, campaign: &Campaign) -> Option<Creative> {
        campaign
            .creative_ids
            .iter()
            .filter_map(|id| self.creatives.get(id).map(|c| c.clone()))
            .find(|c| c.is_active)
    }

    fn next_creative(&self, product_id: Uuid, exclude: Option<Uuid>) -> Option<Creative> {
        self.creatives
            .iter()
            .map(|c| c.clone())
            .filter(|c| c.product_id == product_id && c.is_active && Some(c.id) != exclude)
            .min_by_key(|c| c.id)
    }

    fn set_creative_active(&self, id: Uuid, active: bool) -> OptimizeResult<()> {
        let mut creative = self
            .creatives
            .get_mut(&id)
            .ok_or_else(|| OptimizeError::Store(format!("creative {} not found", id)))?;
        creative.is_active = active;
        Ok(())
    }

    fn append_log(&self, log: OptimizationLog) {
        self.logs.entry(log.campaign_id).or_default().push(log);
    }

    fn logs_for(&self, campaign_id: Uuid) -> Vec<OptimizationLog> {
        self.logs
            .get(&campaign_id)
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}
