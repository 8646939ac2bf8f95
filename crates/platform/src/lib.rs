//! Collaborator boundary for the optimizer: the ad-platform, campaign-store,
//! content-generation, and notifier contracts, plus the in-memory
//! implementations used by tests and the demo daemon.

pub mod sandbox;
pub mod store;
pub mod traits;

pub use sandbox::{
    CountingNotifier, FailingNotifier, SandboxPlatform, TemplateContentGenerator, TracingNotifier,
};
pub use store::{CampaignStore, InMemoryCampaignStore};
pub use traits::{AdPlatform, ContentGenerator, Notifier};
