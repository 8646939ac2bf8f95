//! AdPilot daemon — closed-loop ad campaign optimizer.
//!
//! Runs the optimization cycle on a fixed interval against the sandbox ad
//! platform, seeded with demo campaigns. Swap the sandbox for a real
//! platform client by providing another `AdPlatform` implementation.

use adpilot_core::config::OptimizerConfig;
use adpilot_core::types::{Audience, Campaign, CampaignStatus, Creative, Product};
use adpilot_optimizer::Scheduler;
use adpilot_platform::sandbox::{SandboxPlatform, TemplateContentGenerator, TracingNotifier};
use adpilot_platform::traits::InsightsRow;
use adpilot_platform::{CampaignStore, InMemoryCampaignStore};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "adpilot-daemon")]
#[command(about = "Closed-loop ad campaign optimizer")]
#[command(version)]
struct Cli {
    /// Seconds between optimization cycles (overrides config)
    #[arg(long, env = "ADPILOT__SCHEDULER__CYCLE_INTERVAL_SECS")]
    interval_secs: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpilot=info,adpilot_optimizer=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("AdPilot daemon starting up");

    // Load configuration
    let mut config = OptimizerConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        OptimizerConfig::default()
    });
    if let Some(secs) = cli.interval_secs {
        config.scheduler.cycle_interval_secs = secs;
    }

    info!(
        ruleset_version = config.version,
        cycle_interval_secs = config.scheduler.cycle_interval_secs,
        dead_score_floor = config.scheduler.dead_score_floor,
        "Configuration loaded"
    );

    let platform = Arc::new(SandboxPlatform::new(config.platform.request_timeout_secs));
    let store = Arc::new(InMemoryCampaignStore::new());
    seed_demo(&store, &platform);

    let scheduler = Arc::new(Scheduler::new(
        store,
        platform,
        Arc::new(TemplateContentGenerator::new()),
        Arc::new(TracingNotifier::default()),
        config.clone(),
    ));

    // Ctrl-C requests a stop; the cycle finishes its current campaign.
    let cancel = scheduler.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            cancel.cancel();
        }
    });

    let cancel = scheduler.cancel_token();
    let interval = Duration::from_secs(config.scheduler.cycle_interval_secs);
    loop {
        let scheduler_for_cycle = scheduler.clone();
        let report =
            tokio::task::spawn_blocking(move || scheduler_for_cycle.run_cycle()).await?;
        info!(
            optimized = report.optimized.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Cycle report"
        );

        if cli.once || cancel.is_cancelled() {
            break;
        }
        tokio::time::sleep(interval).await;
        if cancel.is_cancelled() {
            break;
        }
    }

    info!("AdPilot daemon stopped");
    Ok(())
}

/// Seed the sandbox with two contrasting demo campaigns: one ready to
/// scale, one burning spend with nothing to show for it.
fn seed_demo(store: &InMemoryCampaignStore, platform: &SandboxPlatform) {
    let product_id = Uuid::new_v4();
    store.insert_product(Product {
        id: product_id,
        name: "Trail Shoes".to_string(),
        description: "Grippy shoes for rough ground.".to_string(),
        benefits: "Lightweight and durable.".to_string(),
        use_cases: "Running, Trail Hiking".to_string(),
        price: 89.0,
    });
    for hash in ["hash-a", "hash-b"] {
        store.insert_creative(Creative {
            id: Uuid::new_v4(),
            product_id,
            creative_type: "image".to_string(),
            file_hash: hash.to_string(),
            file_url: format!("https://cdn.example.com/{}.png", hash),
            headline: None,
            ad_copy: None,
            cta: None,
            is_active: true,
        });
    }

    let seeds = [
        (
            "demo-star",
            4,
            220.0,
            12,
            InsightsRow {
                impressions: 8000,
                reach: 6000,
                clicks: 220,
                ctr: 2.75,
                cpc: 0.18,
                frequency: 1.33,
                spend: 40.0,
                ..InsightsRow::default()
            },
        ),
        (
            "demo-burner",
            3,
            0.0,
            0,
            InsightsRow {
                impressions: 2000,
                reach: 1200,
                clicks: 60,
                ctr: 3.0,
                cpc: 0.33,
                frequency: 1.66,
                spend: 20.0,
                ..InsightsRow::default()
            },
        ),
    ];

    for (external_id, days_ago, revenue, conversions, insights) in seeds {
        let adset_id = format!("{}-adset", external_id);
        platform.seed_campaign(external_id, external_id, &adset_id, 40.0);
        platform.set_insights(external_id, insights);

        let created = Utc::now() - chrono::Duration::days(days_ago);
        let id = Uuid::new_v4();
        store
            .insert(Campaign {
                id,
                external_id: external_id.to_string(),
                adset_id: Some(adset_id),
                product_id,
                name: external_id.to_string(),
                objective: "conversions".to_string(),
                status: CampaignStatus::Active,
                budget: 40.0,
                audience: Audience::default(),
                headline: Some("Launch headline".to_string()),
                ad_copy: Some("Launch copy".to_string()),
                cta: Some("Shop Now".to_string()),
                creative_ids: Vec::new(),
                revenue,
                conversions,
                latest_metrics: None,
                created_at: created,
                updated_at: created,
            })
            .unwrap_or_else(|e| tracing::warn!(error = %e, "Demo seed failed"));
        info!(campaign_id = %id, external_id, "Demo campaign seeded");
    }
}
