use chrono::{Duration, TimeZone, Utc};
use shelflife_core::{BackendKind, BackendSelector, CoreConfig, CoreRuntime, ItemDraft};

#[test]
fn startup_runs_maintenance_before_the_first_query() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
    let config = CoreConfig {
        data_dir: dir.path().to_path_buf(),
        ..CoreConfig::default()
    };

    {
        let runtime = CoreRuntime::start_at(&BackendSelector::from_config(&config), now);
        assert_eq!(runtime.backend(), BackendKind::Structured);
        runtime
            .repository()
            .add_at(ItemDraft::new("Cream", "2026-10-18"), now)
            .unwrap();
    }

    let next_week = now + Duration::days(7);
    let runtime = CoreRuntime::start_at(&BackendSelector::from_config(&config), next_week);

    assert_eq!(runtime.startup_maintenance().updated, 1);
    assert!(runtime.repository().get_expiring_at(7, next_week).is_empty());
    assert_eq!(runtime.repository().get_expired().len(), 1);
    assert_eq!(runtime.maintenance().run_at(next_week).updated, 0);
}

#[test]
fn items_saved_on_first_launch_survive_a_restart_in_a_fresh_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        data_dir: dir.path().join("fresh"),
        ..CoreConfig::default()
    };

    let id = {
        let runtime = CoreRuntime::start(&BackendSelector::from_config(&config));
        assert_eq!(runtime.backend(), BackendKind::Structured);
        runtime
            .repository()
            .add(ItemDraft::new("Milk", "2099-01-01"))
            .unwrap()
    };

    let runtime = CoreRuntime::start(&BackendSelector::from_config(&config));
    assert_eq!(runtime.backend(), BackendKind::Structured);
    let items = runtime.repository().get_all();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].name, "Milk");
}

#[test]
fn entitlement_flag_persists_for_both_backends() {
    for structured_backend in [true, false] {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig {
            data_dir: dir.path().to_path_buf(),
            structured_backend,
            ..CoreConfig::default()
        };

        {
            let runtime = CoreRuntime::start(&BackendSelector::from_config(&config));
            let entitlements = runtime.entitlements();
            assert!(!entitlements.is_premium());
            assert!(entitlements.set_premium(true));
        }

        let runtime = CoreRuntime::start(&BackendSelector::from_config(&config));
        assert!(runtime.entitlements().is_premium());
        assert!(runtime.entitlements().set_premium(false));
        assert!(!runtime.entitlements().is_premium());
    }
}
