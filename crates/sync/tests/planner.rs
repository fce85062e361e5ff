//! Planner behavior: bootstrap and resume boundaries, catch-up fallback,
//! and the distinction between end-of-data and a failed fetch.

mod common;

use orkl_primitives::EntryId;
use orkl_sync::{PlanError, PlanMode, Planner, PlannerConfig};

use common::{entry, MockCatalog};

fn config() -> PlannerConfig {
    PlannerConfig {
        page_size: 100,
        start_year: 2024,
        resume_from: None,
    }
}

fn ids(plan: &orkl_sync::Plan) -> Vec<u64> {
    plan.entries.iter().map(|entry| entry.id.get()).collect()
}

#[tokio::test]
async fn bootstrap_stops_at_the_first_page_without_qualifying_entries() {
    let catalog = MockCatalog::new(vec![
        vec![entry(3, 2024, &[]), entry(1, 2024, &[]), entry(2, 2024, &[])],
        vec![entry(9, 2023, &[]), entry(8, 2023, &[])],
        vec![entry(7, 2022, &[])],
    ]);

    let plan = Planner::new(&catalog, config())
        .plan(EntryId::ZERO)
        .await
        .unwrap();

    assert_eq!(plan.mode, PlanMode::Bootstrap { start_year: 2024 });
    assert_eq!(ids(&plan), vec![1, 2, 3]);
    // The 2023 page ended the scan; the 2022 page was never requested.
    assert_eq!(catalog.page_fetches(), 2);
}

#[tokio::test]
async fn bootstrap_treats_end_of_data_as_the_boundary() {
    let catalog = MockCatalog::new(vec![vec![entry(2, 2024, &[]), entry(1, 2024, &[])]]);

    let plan = Planner::new(&catalog, config())
        .plan(EntryId::ZERO)
        .await
        .unwrap();

    assert_eq!(ids(&plan), vec![1, 2]);
    assert_eq!(catalog.page_fetches(), 2);
}

#[tokio::test]
async fn empty_catalog_yields_an_empty_plan() {
    let catalog = MockCatalog::new(vec![]);

    let plan = Planner::new(&catalog, config())
        .plan(EntryId::ZERO)
        .await
        .unwrap();

    assert!(plan.is_empty());
}

#[tokio::test]
async fn resume_keeps_only_entries_newer_than_the_checkpoint() {
    let catalog = MockCatalog::new(vec![vec![
        entry(50, 2024, &[]),
        entry(45, 2024, &[]),
        entry(43, 2024, &[]),
        entry(42, 2024, &[]),
        entry(40, 2024, &[]),
    ]]);

    let plan = Planner::new(&catalog, config())
        .plan(EntryId::new(42))
        .await
        .unwrap();

    assert_eq!(plan.mode, PlanMode::Resume { checkpoint: EntryId::new(42) });
    assert_eq!(ids(&plan), vec![43, 45, 50]);
    // The checkpoint was in the first page, so the scan stopped there.
    assert_eq!(catalog.page_fetches(), 1);
}

#[tokio::test]
async fn resume_scans_until_the_checkpoint_is_observed() {
    let catalog = MockCatalog::new(vec![
        vec![entry(50, 2024, &[]), entry(45, 2024, &[])],
        vec![entry(43, 2024, &[]), entry(42, 2024, &[])],
        vec![entry(41, 2024, &[])],
    ]);

    let plan = Planner::new(&catalog, config())
        .plan(EntryId::new(42))
        .await
        .unwrap();

    assert_eq!(ids(&plan), vec![43, 45, 50]);
    assert_eq!(catalog.page_fetches(), 2);
}

#[tokio::test]
async fn resume_catches_up_in_full_when_the_checkpoint_is_gone() {
    let catalog = MockCatalog::new(vec![
        vec![entry(50, 2024, &[]), entry(45, 2024, &[])],
        vec![entry(43, 2024, &[])],
    ]);

    let plan = Planner::new(&catalog, config())
        .plan(EntryId::new(42))
        .await
        .unwrap();

    assert_eq!(ids(&plan), vec![43, 45, 50]);
    assert_eq!(catalog.page_fetches(), 3);
}

#[tokio::test]
async fn a_failed_page_fetch_aborts_planning() {
    let catalog = MockCatalog::new(vec![
        vec![entry(50, 2024, &[]), entry(45, 2024, &[])],
        vec![entry(43, 2024, &[]), entry(42, 2024, &[])],
    ])
    .fail_page_at(100);

    let result = Planner::new(&catalog, config()).plan(EntryId::new(42)).await;

    assert!(matches!(result, Err(PlanError::Fetch(_))));
}

#[tokio::test]
async fn override_ahead_of_the_remote_is_a_configuration_error() {
    let catalog = MockCatalog::new(vec![vec![entry(50, 2024, &[])]]).with_latest(60);

    let planner_config = PlannerConfig {
        resume_from: Some(EntryId::new(100)),
        ..config()
    };

    let result = Planner::new(&catalog, planner_config).plan(EntryId::ZERO).await;

    assert!(matches!(
        result,
        Err(PlanError::StartVersionAhead { requested, latest })
            if requested == EntryId::new(100) && latest == EntryId::new(60)
    ));
}

#[tokio::test]
async fn override_within_range_replaces_the_stored_checkpoint() {
    let catalog = MockCatalog::new(vec![vec![
        entry(50, 2024, &[]),
        entry(45, 2024, &[]),
        entry(42, 2024, &[]),
    ]]);

    let planner_config = PlannerConfig {
        resume_from: Some(EntryId::new(42)),
        ..config()
    };

    // The stored checkpoint says "never synced", but the override wins.
    let plan = Planner::new(&catalog, planner_config)
        .plan(EntryId::ZERO)
        .await
        .unwrap();

    assert_eq!(plan.mode, PlanMode::Resume { checkpoint: EntryId::new(42) });
    assert_eq!(ids(&plan), vec![45, 50]);
}
