use sales_incentive_lib::store::load_record;
use sales_incentive_lib::{bootstrap, Database, KeyValueStorage, KpiPatch, KpiRecord, KpiStore, RevenueTier};
use std::sync::Arc;

const KEY: &str = "sales-incentive-kpis-v1";

#[test]
fn bootstrap_round_trips_edits_across_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");

    {
        let mut store = bootstrap(dir.path()).expect("first session");
        assert_eq!(store.state(), &KpiRecord::default());
        store.apply_patch(KpiPatch {
            period_label: Some("March 2026".to_string()),
            current_revenue: Some(36_500.0),
            ..KpiPatch::default()
        });
        assert_eq!(store.calculations().achieved_tier_index, 2);
    }

    let store = bootstrap(dir.path()).expect("second session");
    assert_eq!(store.state().period_label, "March 2026");
    assert_eq!(store.state().current_revenue, 36_500.0);
    assert_eq!(store.calculations().tier_bonus, 200.0);
    assert!(dir.path().join("tracker.db").is_file());
}

#[test]
fn bootstrap_honours_configured_storage_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("tracker.yaml"), "storageKey: team-b\ndatabaseFile: kpis.db\n")
        .expect("write config");

    let mut store = bootstrap(dir.path()).expect("bootstrap");
    store.apply_patch(KpiPatch {
        team_size: Some(5.0),
        ..KpiPatch::default()
    });

    assert_eq!(store.storage_key(), "team-b");
    assert!(store.storage().read("team-b").expect("read").is_some());
    assert!(dir.path().join("kpis.db").is_file());
}

#[test]
fn reset_then_reload_returns_exact_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Arc::new(Database::new(&dir.path().join("test.db")).expect("db"));

    let mut store = KpiStore::open(Arc::clone(&database), KEY);
    store.apply_patch(KpiPatch {
        current_count: Some(1200.0),
        revenue_tiers: Some(vec![RevenueTier::new(1.0, 1.0)]),
        ..KpiPatch::default()
    });
    store.reset_to_defaults();

    assert_eq!(load_record(&database, KEY), KpiRecord::default());
    assert_eq!(store.load(), KpiRecord::default());
}

#[test]
fn older_records_load_with_defaults_for_new_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Database::new(&dir.path().join("test.db")).expect("db");
    database
        .write(KEY, r#"{"periodLabel":"January 2026","currentCount":900,"targetCount":1000}"#)
        .expect("seed");

    let store = KpiStore::open(&database, KEY);
    assert_eq!(store.state().period_label, "January 2026");
    assert_eq!(store.state().current_count, 900.0);
    assert_eq!(store.state().team_size, 2);
    assert_eq!(store.state().revenue_tiers, KpiRecord::default().revenue_tiers);
    assert!((store.calculations().goal1_pct - 90.0).abs() < 1e-9);
}

#[test]
fn flat_legacy_record_is_upgraded_and_rewritten_canonically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Database::new(&dir.path().join("test.db")).expect("db");
    database
        .write(
            KEY,
            r#"{
                "currentMonth": "Fevereiro 2026",
                "teamSize": 3,
                "currentSales": 1250,
                "targetSales": 1200,
                "bonusValueSales": 150,
                "currentRevenue": 40500,
                "targetRevenueTier1": 35000,
                "targetRevenueTier2": 36000,
                "targetRevenueTier3": 40000,
                "bonusTier1": 100,
                "bonusTier2": 200,
                "bonusTier3": 300
            }"#,
        )
        .expect("seed");

    let mut store = KpiStore::open(&database, KEY);
    assert_eq!(store.state().period_label, "Fevereiro 2026");
    assert!(store.calculations().goal1_achieved);
    assert_eq!(store.calculations().achieved_tier_index, 3);
    assert_eq!(store.calculations().tier_bonus, 300.0);

    store.apply_patch(KpiPatch::default());
    let raw = database.read(KEY).expect("read").expect("stored");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert!(value.get("currentSales").is_none());
    assert_eq!(value["currentCount"], 1250.0);
    assert_eq!(value["revenueTiers"].as_array().map(Vec::len), Some(3));
}

#[test]
fn legacy_calendar_day_leaves_days_remaining_at_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Database::new(&dir.path().join("test.db")).expect("db");
    database
        .write(KEY, r#"{"currentMonthLabel":"X","dayOfMonth":28}"#)
        .expect("seed");

    let record = load_record(&database, KEY);
    assert_eq!(record.period_label, "X");
    assert_eq!(record.days_remaining, KpiRecord::default().days_remaining);
}
