//! End-to-end tests of the full optimization loop against the sandbox
//! platform and the in-memory store: collect, analyze, decide, dispatch,
//! and report, with no mocked internals.

use adpilot_core::config::OptimizerConfig;
use adpilot_core::types::{
    Action, ActionOutcome, Audience, Campaign, CampaignStatus, Creative, Product,
};
use adpilot_optimizer::Scheduler;
use adpilot_platform::sandbox::{CountingNotifier, TemplateContentGenerator};
use adpilot_platform::traits::{ExternalStatus, InsightsRow};
use adpilot_platform::{CampaignStore, InMemoryCampaignStore, SandboxPlatform};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

struct World {
    platform: Arc<SandboxPlatform>,
    store: Arc<InMemoryCampaignStore>,
    notifier: Arc<CountingNotifier>,
    scheduler: Scheduler,
    product_id: Uuid,
}

fn world() -> World {
    let platform = Arc::new(SandboxPlatform::new(30));
    let store = Arc::new(InMemoryCampaignStore::new());
    let notifier = Arc::new(CountingNotifier::default());

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

    let scheduler = Scheduler::new(
        store.clone(),
        platform.clone(),
        Arc::new(TemplateContentGenerator::new()),
        notifier.clone(),
        OptimizerConfig::default(),
    );
    World {
        platform,
        store,
        notifier,
        scheduler,
        product_id,
    }
}

fn seed_campaign(
    world: &World,
    external_id: &str,
    days_ago: i64,
    budget: f64,
    revenue: f64,
    conversions: u64,
    insights: InsightsRow,
) -> Campaign {
    let adset_id = format!("{}-adset", external_id);
    world
        .platform
        .seed_campaign(external_id, external_id, &adset_id, budget);
    world.platform.set_insights(external_id, insights);

    let created = Utc::now() - chrono::Duration::days(days_ago);
    let campaign = Campaign {
        id: Uuid::new_v4(),
        external_id: external_id.to_string(),
        adset_id: Some(adset_id),
        product_id: world.product_id,
        name: external_id.to_string(),
        objective: "conversions".to_string(),
        status: CampaignStatus::Active,
        budget,
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
    };
    world.store.insert(campaign.clone()).unwrap();
    campaign
}

#[test]
fn failing_campaign_is_paused_with_audit_trail() {
    let w = world();
    // High engagement that never converts: $20 spent, zero conversions,
    // three days in. Scores 20 (above the dead floor, still critical).
    let doomed = seed_campaign(
        &w,
        "ext-doomed",
        3,
        40.0,
        0.0,
        0,
        InsightsRow {
            impressions: 2000,
            clicks: 60,
            ctr: 3.0,
            cpc: 0.33,
            frequency: 1.6,
            spend: 20.0,
            ..InsightsRow::default()
        },
    );

    let report = w.scheduler.run_cycle();
    assert_eq!(report.optimized.len(), 1);
    assert_eq!(report.optimized[0].action, Action::Pause);

    // Both sides of the boundary agree, and the audit log explains why.
    assert_eq!(
        w.store.get(doomed.id).unwrap().status,
        CampaignStatus::Paused
    );
    assert_eq!(
        w.platform.external_status("ext-doomed"),
        Some(ExternalStatus::Paused)
    );
    let logs = w.store.logs_for(doomed.id);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, Action::Pause);
    assert!(logs[0].reason.contains("CRITICAL"));
    assert_eq!(w.notifier.sent(), 1);
}

#[test]
fn star_campaign_is_cloned() {
    let w = world();
    // Outstanding everywhere but below the scale rule's spend floor, so
    // the clone rule wins: ROAS 5.5, conversion rate 6%, score 100.
    let star = seed_campaign(
        &w,
        "ext-star",
        5,
        40.0,
        99.0,
        6,
        InsightsRow {
            impressions: 3333,
            clicks: 100,
            ctr: 3.0,
            cpc: 0.18,
            frequency: 1.4,
            spend: 18.0,
            ..InsightsRow::default()
        },
    );

    let report = w.scheduler.run_cycle();
    assert_eq!(report.optimized.len(), 1);
    assert_eq!(report.optimized[0].action, Action::Clone);

    let new_campaign_id = match &report.optimized[0].result.outcome {
        Some(ActionOutcome::Cloned {
            new_campaign_id, ..
        }) => *new_campaign_id,
        other => panic!("unexpected outcome: {:?}", other),
    };
    let clone = w.store.get(new_campaign_id).unwrap();
    assert_ne!(clone.external_id, star.external_id);
    assert_eq!(clone.product_id, star.product_id);
    assert_eq!(clone.conversions, 0);
    assert_eq!(w.store.len(), 2);
    // The clone was created mid-cycle and was not itself processed.
    assert_eq!(report.total(), 1);
}

#[test]
fn scale_is_monotonic_in_roas() {
    // Same shape, different ROAS tier: 5.0x scales by 50%, 3.6x by 25%.
    for (external_id, revenue, expected_budget) in
        [("ext-hot", 200.0, 60.0), ("ext-warm", 145.0, 50.0)]
    {
        let w = world();
        seed_campaign(
            &w,
            external_id,
            3,
            40.0,
            revenue,
            6,
            InsightsRow {
                impressions: 8000,
                clicks: 200,
                ctr: 2.6,
                cpc: 0.2,
                frequency: 1.6,
                spend: 40.0,
                ..InsightsRow::default()
            },
        );

        let report = w.scheduler.run_cycle();
        assert_eq!(report.optimized.len(), 1);
        assert_eq!(report.optimized[0].action, Action::Scale);
        assert_eq!(
            w.platform.adset_budget(external_id),
            Some(expected_budget)
        );
    }
}

#[test]
fn budget_adjustment_respects_bounds() {
    let w = world();
    // Cheap winner near the ceiling: ROAS 4.5 on a $450 budget. The x1.3
    // scale-up clamps to the $500 maximum.
    let capped = seed_campaign(
        &w,
        "ext-capped",
        2,
        450.0,
        40.5,
        2,
        InsightsRow {
            impressions: 3000,
            clicks: 50,
            ctr: 1.6,
            cpc: 0.6,
            frequency: 1.3,
            spend: 9.0,
            ..InsightsRow::default()
        },
    );

    let report = w.scheduler.run_cycle();
    assert_eq!(report.optimized.len(), 1);
    assert_eq!(report.optimized[0].action, Action::OptimizeBudget);
    assert_eq!(w.store.get(capped.id).unwrap().budget, 500.0);
    assert_eq!(w.platform.adset_budget("ext-capped"), Some(500.0));
}

#[test]
fn one_broken_campaign_does_not_break_the_cycle() {
    let w = world();
    let healthy = InsightsRow {
        impressions: 500,
        clicks: 10,
        ctr: 2.0,
        cpc: 0.5,
        frequency: 1.0,
        spend: 5.0,
        ..InsightsRow::default()
    };
    seed_campaign(&w, "ext-a", 1, 40.0, 10.0, 1, healthy.clone());
    let broken = seed_campaign(&w, "ext-b", 1, 40.0, 10.0, 1, healthy.clone());
    seed_campaign(&w, "ext-c", 1, 40.0, 10.0, 1, healthy);
    w.platform.inject_timeout("ext-b");

    let report = w.scheduler.run_cycle();
    assert_eq!(report.optimized.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.failed.is_empty());
    assert_eq!(report.skipped[0].campaign_id, broken.id);

    // The fault was one-shot: the skipped campaign recovers next cycle.
    let next = w.scheduler.run_cycle();
    assert_eq!(next.optimized.len(), 3);
}

#[test]
fn creative_refresh_runs_the_full_rotation() {
    let w = world();
    // Weak CTR with plenty of clicks forces an edit_creative decision.
    let tired = seed_campaign(
        &w,
        "ext-tired",
        4,
        40.0,
        60.0,
        5,
        InsightsRow {
            impressions: 9000,
            clicks: 60,
            ctr: 0.7,
            cpc: 0.5,
            frequency: 1.3,
            spend: 30.0,
            ..InsightsRow::default()
        },
    );

    let report = w.scheduler.run_cycle();
    assert_eq!(report.optimized.len(), 1);
    assert_eq!(report.optimized[0].action, Action::EditCreative);

    let updated = w.store.get(tired.id).unwrap();
    assert_ne!(updated.headline.as_deref(), Some("Launch headline"));
    assert_eq!(updated.creative_ids.len(), 1);
    let logs = w.store.logs_for(tired.id);
    assert_eq!(logs.len(), 1);
    assert!(logs[0].creative_used.is_some());
}
