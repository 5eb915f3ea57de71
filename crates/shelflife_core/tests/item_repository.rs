use chrono::{DateTime, Duration, TimeZone, Utc};
use shelflife_core::store::{DocumentItemStore, ItemStore, SqliteItemStore};
use shelflife_core::{
    Category, ExpiryMaintenanceJob, ItemChanges, ItemDraft, ItemRepository,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Backend {
    label: &'static str,
    repo: ItemRepository,
    _dir: TempDir,
}

fn backends() -> Vec<Backend> {
    let sqlite_dir = tempfile::tempdir().unwrap();
    let sqlite: Arc<dyn ItemStore> =
        Arc::new(SqliteItemStore::open(sqlite_dir.path().join("expiry.db")).unwrap());

    let document_dir = tempfile::tempdir().unwrap();
    let document: Arc<dyn ItemStore> = Arc::new(DocumentItemStore::new(document_dir.path()));

    vec![
        Backend {
            label: "sqlite",
            repo: ItemRepository::new(sqlite),
            _dir: sqlite_dir,
        },
        Backend {
            label: "document",
            repo: ItemRepository::new(document),
            _dir: document_dir,
        },
    ]
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
}

fn day_offset(now: DateTime<Utc>, days: i64) -> String {
    (now + Duration::days(days))
        .date_naive()
        .format("%Y-%m-%d")
        .to_string()
}

#[test]
fn add_then_get_all_contains_exactly_one_new_record() {
    let now = fixed_now();
    for backend in backends() {
        let repo = &backend.repo;
        let draft = ItemDraft {
            category: Some(Category::Dairy),
            quantity: Some(2),
            notes: Some("top shelf".to_string()),
            reminder_days: Some(5),
            ..ItemDraft::new("Milk", day_offset(now, 4))
        };

        let id = repo.add_at(draft, now).expect("add should return an id");
        let all = repo.get_all();

        assert_eq!(all.len(), 1, "{}", backend.label);
        let item = &all[0];
        assert_eq!(item.id, id);
        assert_eq!(item.name, "Milk");
        assert_eq!(item.expiry_date, day_offset(now, 4));
        assert_eq!(item.category, Category::Dairy);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.notes.as_deref(), Some("top shelf"));
        assert_eq!(item.reminder_days, 5);
        assert_eq!(item.added_date, now);
        assert!(!item.is_expired);
    }
}

#[test]
fn add_fills_defaults_for_omitted_fields() {
    let now = fixed_now();
    for backend in backends() {
        let id = backend
            .repo
            .add_at(ItemDraft::new("Rice", day_offset(now, 90)), now)
            .unwrap();
        let item = backend.repo.get(id).expect(backend.label);

        assert_eq!(item.category, Category::Other);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.reminder_days, 3);
        assert_eq!(item.notes, None);
    }
}

#[test]
fn add_rejects_invalid_drafts_without_storing_anything() {
    let now = fixed_now();
    for backend in backends() {
        assert_eq!(
            backend.repo.add_at(ItemDraft::new("", day_offset(now, 1)), now),
            None,
            "{}",
            backend.label
        );
        assert_eq!(
            backend
                .repo
                .add_at(ItemDraft::new("Bread", "the day after tomorrow"), now),
            None
        );
        assert!(backend.repo.get_all().is_empty());
    }
}

#[test]
fn generated_ids_are_distinct_and_get_all_uses_insertion_order() {
    let now = fixed_now();
    for backend in backends() {
        let first = backend
            .repo
            .add_at(ItemDraft::new("Late", day_offset(now, 30)), now)
            .unwrap();
        let second = backend
            .repo
            .add_at(ItemDraft::new("Early", day_offset(now, 1)), now)
            .unwrap();
        let third = backend
            .repo
            .add_at(ItemDraft::new("Middle", day_offset(now, 10)), now)
            .unwrap();

        let ids = backend
            .repo
            .get_all()
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![first, second, third], "{}", backend.label);
    }
}

#[test]
fn get_expiring_returns_only_items_inside_the_window() {
    let now = fixed_now();
    for backend in backends() {
        backend
            .repo
            .add_at(ItemDraft::new("A", day_offset(now, 10)), now)
            .unwrap();
        let b = backend
            .repo
            .add_at(ItemDraft::new("B", day_offset(now, 2)), now)
            .unwrap();

        let expiring = backend.repo.get_expiring_at(7, now);
        assert_eq!(expiring.len(), 1, "{}", backend.label);
        assert_eq!(expiring[0].id, b);
    }
}

#[test]
fn get_expiring_is_inclusive_ordered_and_skips_past_or_flagged_items() {
    let now = fixed_now();
    for backend in backends() {
        let repo = &backend.repo;
        let edge = repo
            .add_at(ItemDraft::new("Edge", day_offset(now, 7)), now)
            .unwrap();
        let today = repo
            .add_at(ItemDraft::new("Today", day_offset(now, 0)), now)
            .unwrap();
        repo.add_at(ItemDraft::new("Yesterday", day_offset(now, -1)), now)
            .unwrap();
        let flagged = repo
            .add_at(ItemDraft::new("Flagged", day_offset(now, 3)), now)
            .unwrap();
        let mut changes = ItemChanges::from_item(&repo.get(flagged).unwrap());
        changes.is_expired = true;
        assert_eq!(repo.update(flagged, changes), 1);

        let ids = repo
            .get_expiring_at(7, now)
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![today, edge], "{}", backend.label);

        let zero_window = repo
            .get_expiring_at(0, now)
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(zero_window, vec![today]);
    }
}

#[test]
fn get_expired_lists_flagged_items_most_recent_first() {
    let now = fixed_now();
    for backend in backends() {
        let repo = &backend.repo;
        let older = repo
            .add_at(ItemDraft::new("Older", day_offset(now, -20)), now)
            .unwrap();
        let recent = repo
            .add_at(ItemDraft::new("Recent", day_offset(now, -2)), now)
            .unwrap();
        repo.add_at(ItemDraft::new("Fresh", day_offset(now, 5)), now)
            .unwrap();

        assert!(repo.get_expired().is_empty(), "flags are refreshed by maintenance only");

        let report = ExpiryMaintenanceJob::new(repo.clone()).run_at(now);
        assert_eq!(report.updated, 2, "{}", backend.label);

        let ids = repo
            .get_expired()
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![recent, older]);
        assert_eq!(repo.get_all().len(), 3, "expired items are not purged");
    }
}

#[test]
fn update_overwrites_fields_and_keeps_id_and_added_date() {
    let now = fixed_now();
    for backend in backends() {
        let repo = &backend.repo;
        let id = repo
            .add_at(ItemDraft::new("Yoghurt", day_offset(now, 3)), now)
            .unwrap();

        let changes = ItemChanges {
            name: "Greek yoghurt".to_string(),
            expiry_date: day_offset(now, 6),
            category: Category::Dairy,
            quantity: 4,
            notes: Some("opened".to_string()),
            reminder_days: 1,
            is_expired: false,
        };
        assert_eq!(repo.update(id, changes.clone()), 1, "{}", backend.label);

        let item = repo.get(id).unwrap();
        assert_eq!(item.id, id);
        assert_eq!(item.added_date, now);
        assert_eq!(item.name, changes.name);
        assert_eq!(item.expiry_date, changes.expiry_date);
        assert_eq!(item.category, changes.category);
        assert_eq!(item.quantity, changes.quantity);
        assert_eq!(item.notes, changes.notes);
        assert_eq!(item.reminder_days, changes.reminder_days);
        assert_eq!(item.is_expired, changes.is_expired);
    }
}

#[test]
fn update_rejects_invalid_changes_and_unknown_ids() {
    let now = fixed_now();
    for backend in backends() {
        let repo = &backend.repo;
        let id = repo
            .add_at(ItemDraft::new("Butter", day_offset(now, 12)), now)
            .unwrap();
        let original = repo.get(id).unwrap();

        let mut blank = ItemChanges::from_item(&original);
        blank.name = String::new();
        assert_eq!(repo.update(id, blank), 0, "{}", backend.label);

        let mut bad_date = ItemChanges::from_item(&original);
        bad_date.expiry_date = "someday".to_string();
        assert_eq!(repo.update(id, bad_date), 0);

        assert_eq!(repo.update(id + 999, ItemChanges::from_item(&original)), 0);
        assert_eq!(repo.get(id), Some(original));
    }
}

#[test]
fn delete_reports_whether_a_record_existed() {
    let now = fixed_now();
    for backend in backends() {
        let repo = &backend.repo;
        let id = repo
            .add_at(ItemDraft::new("Ham", day_offset(now, 2)), now)
            .unwrap();

        assert!(!repo.delete(id + 12345), "{}", backend.label);
        assert!(repo.delete(id));
        assert!(!repo.delete(id));
        assert_eq!(repo.get(id), None);
        assert!(repo.get_all().is_empty());
    }
}

#[test]
fn unparsable_stored_expiry_is_excluded_from_date_filters() {
    let now = fixed_now();

    let sqlite_dir = tempfile::tempdir().unwrap();
    let db_path = sqlite_dir.path().join("expiry.db");
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        shelflife_core::db::ensure_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO items (name, expiryDate) VALUES ('Mystery jar', 'sometime');",
            [],
        )
        .unwrap();
    }
    let sqlite: Arc<dyn ItemStore> = Arc::new(SqliteItemStore::open(&db_path).unwrap());

    let document_dir = tempfile::tempdir().unwrap();
    let document_store = DocumentItemStore::new(document_dir.path());
    std::fs::write(
        document_store.blob_path(shelflife_core::store::document_store::ITEMS_STORAGE_KEY),
        r#"[{"id": 1, "name": "Mystery jar", "expiryDate": "sometime",
             "addedDate": "2026-01-01T00:00:00Z", "isExpired": 0}]"#,
    )
    .unwrap();
    let document: Arc<dyn ItemStore> = Arc::new(document_store);

    for store in [sqlite, document] {
        let repo = ItemRepository::new(store);
        assert_eq!(repo.get_all().len(), 1);
        assert!(repo.get_expiring_at(36500, now).is_empty());

        let report = ExpiryMaintenanceJob::new(repo.clone()).run_at(now);
        assert!(report.ok);
        assert_eq!(report.updated, 0);
        assert!(repo.get_expired().is_empty());
    }
}

#[test]
fn one_malformed_sqlite_row_leaves_the_rest_queryable() {
    let now = fixed_now();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("expiry.db");
    let repo = ItemRepository::new(Arc::new(SqliteItemStore::open(&db_path).unwrap()));
    let good = repo
        .add_at(ItemDraft::new("Bagels", day_offset(now, 2)), now)
        .unwrap();
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO items (name, expiryDate, quantity) VALUES ('Broken', ?1, 0);",
            [day_offset(now, 3)],
        )
        .unwrap();
    }

    let all = repo.get_all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, good);
    assert_eq!(all[1].quantity, 1);
    assert_eq!(repo.get_expiring_at(7, now).len(), 2);
}

#[test]
fn storage_failures_become_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentItemStore::new(dir.path());
    std::fs::write(
        store.blob_path(shelflife_core::store::document_store::ITEMS_STORAGE_KEY),
        "not json at all",
    )
    .unwrap();
    let repo = ItemRepository::new(Arc::new(store));
    let now = fixed_now();

    assert_eq!(repo.add_at(ItemDraft::new("Tea", day_offset(now, 40)), now), None);
    assert!(repo.get_all().is_empty());
    assert!(repo.get_expiring_at(7, now).is_empty());
    assert!(repo.get_expired().is_empty());
    assert_eq!(repo.get(1), None);
    assert!(!repo.delete(1));
}
