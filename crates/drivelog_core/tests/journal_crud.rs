use chrono::{DateTime, Duration, TimeZone, Utc};
use drivelog_core::db::migrations::latest_version;
use drivelog_core::db::open_db_in_memory;
use drivelog_core::{
    Address, Coordinates, EntryListQuery, JournalEntry, JournalEntryPatch, JournalRepository,
    JournalService, NewJournalEntry, RepoError, SqliteJournalRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn new_entry(place_name: &str, rating: u8, visited_at: DateTime<Utc>) -> NewJournalEntry {
    NewJournalEntry::new(
        visited_at,
        Address::new("Japan", "Tokyo", "Shibuya"),
        place_name,
        rating,
    )
}

fn stored_entry(id: &str, place_name: &str, visited_at: DateTime<Utc>) -> JournalEntry {
    JournalEntry::create_with_id(
        Uuid::parse_str(id).unwrap(),
        new_entry(place_name, 4, visited_at),
        base_time(),
    )
    .unwrap()
}

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

#[test]
fn create_and_get_roundtrip_preserves_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let mut payload = new_entry("Coffee House", 5, base_time());
    payload.address = payload.address.with_detail("1-2-3 Dogenzaka");
    payload.location = Some(Coordinates::new(35.6595, 139.7005).unwrap());
    payload.notes = Some("Flat white was excellent.".to_string());
    let entry = JournalEntry::create(payload, Utc::now()).unwrap();

    let id = repo.create_entry(&entry).unwrap();
    let loaded = repo.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn get_unknown_entry_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    assert!(repo.get_entry(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn duplicate_id_is_rejected_by_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let entry = stored_entry("00000000-0000-4000-8000-000000000001", "a", base_time());
    repo.create_entry(&entry).unwrap();
    assert!(matches!(repo.create_entry(&entry), Err(RepoError::Db(_))));
}

#[test]
fn repository_write_paths_validate_entries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let mut entry = stored_entry("00000000-0000-4000-8000-000000000001", "a", base_time());
    entry.rating = 0;
    assert!(matches!(
        repo.create_entry(&entry),
        Err(RepoError::Validation(_))
    ));

    entry.rating = 3;
    repo.create_entry(&entry).unwrap();
    entry.place_name = "x".repeat(101);
    assert!(matches!(
        repo.update_entry(&entry),
        Err(RepoError::Validation(_))
    ));
}

#[test]
fn update_and_delete_unknown_entry_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let entry = stored_entry("00000000-0000-4000-8000-000000000009", "ghost", base_time());
    assert!(matches!(
        repo.update_entry(&entry),
        Err(RepoError::NotFound(id)) if id == entry.id
    ));
    assert!(matches!(
        repo.delete_entry(entry.id),
        Err(RepoError::NotFound(id)) if id == entry.id
    ));
}

#[test]
fn delete_removes_entry() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let entry = stored_entry("00000000-0000-4000-8000-000000000001", "a", base_time());
    repo.create_entry(&entry).unwrap();
    repo.delete_entry(entry.id).unwrap();

    assert!(repo.get_entry(entry.id).unwrap().is_none());
}

#[test]
fn mark_synced_transitions_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let entry = stored_entry("00000000-0000-4000-8000-000000000001", "a", base_time());
    repo.create_entry(&entry).unwrap();

    let synced_at = base_time() + Duration::hours(2);
    repo.mark_synced(entry.id, synced_at).unwrap();
    assert_eq!(
        repo.get_entry(entry.id).unwrap().unwrap().synced_at,
        Some(synced_at)
    );

    let err = repo
        .mark_synced(entry.id, synced_at + Duration::hours(1))
        .unwrap_err();
    assert!(matches!(err, RepoError::AlreadySynced(id) if id == entry.id));
    assert_eq!(
        repo.get_entry(entry.id).unwrap().unwrap().synced_at,
        Some(synced_at)
    );

    let missing = repo.mark_synced(Uuid::new_v4(), synced_at).unwrap_err();
    assert!(matches!(missing, RepoError::NotFound(_)));
}

#[test]
fn list_orders_by_visit_and_filters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let oldest = stored_entry("00000000-0000-4000-8000-000000000001", "old", base_time());
    let middle = stored_entry(
        "00000000-0000-4000-8000-000000000002",
        "mid",
        base_time() + Duration::days(1),
    );
    let mut newest = stored_entry(
        "00000000-0000-4000-8000-000000000003",
        "new",
        base_time() + Duration::days(2),
    );
    newest.rating = 2;
    repo.create_entry(&middle).unwrap();
    repo.create_entry(&newest).unwrap();
    repo.create_entry(&oldest).unwrap();
    repo.mark_synced(middle.id, base_time()).unwrap();

    let all = repo.list_entries(&EntryListQuery::default()).unwrap();
    let ids = all.iter().map(|entry| entry.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);

    let unsynced = repo
        .list_entries(&EntryListQuery {
            unsynced_only: true,
            oldest_first: true,
            ..EntryListQuery::default()
        })
        .unwrap();
    let ids = unsynced.iter().map(|entry| entry.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![oldest.id, newest.id]);

    let well_rated = repo
        .list_entries(&EntryListQuery {
            min_rating: Some(4),
            ..EntryListQuery::default()
        })
        .unwrap();
    assert_eq!(well_rated.len(), 2);
    assert!(well_rated.iter().all(|entry| entry.rating >= 4));
}

#[test]
fn list_pagination_with_limit_and_offset_is_stable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let entry_a = stored_entry("00000000-0000-4000-8000-000000000001", "a", base_time());
    let entry_b = stored_entry("00000000-0000-4000-8000-000000000002", "b", base_time());
    let entry_c = stored_entry("00000000-0000-4000-8000-000000000003", "c", base_time());
    repo.create_entry(&entry_c).unwrap();
    repo.create_entry(&entry_a).unwrap();
    repo.create_entry(&entry_b).unwrap();

    let page = repo
        .list_entries(&EntryListQuery {
            limit: Some(2),
            offset: 1,
            ..EntryListQuery::default()
        })
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, entry_b.id);
    assert_eq!(page[1].id, entry_c.id);

    let tail = repo
        .list_entries(&EntryListQuery {
            offset: 2,
            ..EntryListQuery::default()
        })
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id, entry_c.id);
}

#[test]
fn read_path_rejects_corrupt_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();

    let entry = stored_entry("00000000-0000-4000-8000-000000000001", "a", base_time());
    repo.create_entry(&entry).unwrap();
    conn.execute("UPDATE journal_entries SET place_name = '';", [])
        .unwrap();

    assert!(matches!(
        repo.get_entry(entry.id),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteJournalRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_entries_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteJournalRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("journal_entries"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE journal_entries (
            id TEXT PRIMARY KEY NOT NULL,
            visited_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteJournalRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "journal_entries",
            column: "address_country"
        })
    ));
}

#[test]
fn service_create_assigns_id_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let service = JournalService::with_clock(repo, fixed_clock);

    let created = service
        .create_entry(new_entry("Coffee House", 5, base_time()))
        .unwrap();
    assert!(!created.id.is_nil());
    assert_eq!(created.created_at, fixed_clock());
    assert_eq!(created.updated_at, fixed_clock());
    assert_eq!(created.synced_at, None);

    let stored = service.get_entry(created.id).unwrap().unwrap();
    assert_eq!(stored, created);
}

#[test]
fn service_create_rejects_invalid_payload_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let service = JournalService::new(repo);

    let err = service
        .create_entry(new_entry("", 5, base_time()))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(service.list_entries(None, 0, false).unwrap().items.is_empty());
}

#[test]
fn service_update_applies_patch_and_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let creator = JournalService::with_clock(&repo, || base_time());
    let created = creator
        .create_entry(new_entry("Coffee House", 5, base_time()))
        .unwrap();

    let editor = JournalService::with_clock(&repo, fixed_clock);
    let updated = editor
        .update_entry(
            created.id,
            JournalEntryPatch {
                rating: Some(3),
                ..JournalEntryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.rating, 3);
    assert_eq!(updated.created_at, base_time());
    assert_eq!(updated.updated_at, fixed_clock());
    assert_eq!(repo.get_entry(created.id).unwrap().unwrap(), updated);

    let untouched = editor
        .update_entry(created.id, JournalEntryPatch::default())
        .unwrap();
    assert_eq!(untouched, updated);
}

#[test]
fn service_update_unknown_entry_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let service = JournalService::new(repo);

    let err = service
        .update_entry(
            Uuid::new_v4(),
            JournalEntryPatch {
                rating: Some(2),
                ..JournalEntryPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn service_list_limit_defaults_to_20_and_caps_at_100() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let service = JournalService::new(repo);
    for idx in 0..120 {
        service
            .create_entry(new_entry(
                &format!("place {idx}"),
                4,
                base_time() + Duration::minutes(idx),
            ))
            .unwrap();
    }

    let defaulted = service.list_entries(None, 0, false).unwrap();
    assert_eq!(defaulted.applied_limit, 20);
    assert_eq!(defaulted.items.len(), 20);

    let capped = service.list_entries(Some(500), 0, false).unwrap();
    assert_eq!(capped.applied_limit, 100);
    assert_eq!(capped.items.len(), 100);
}

#[test]
fn service_update_cannot_stamp_sync_marker() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJournalRepository::try_new(&conn).unwrap();
    let service = JournalService::with_clock(&repo, fixed_clock);
    let created = service
        .create_entry(new_entry("Coffee House", 5, base_time()))
        .unwrap();

    let forged = JournalEntryPatch {
        synced_at: Some(Some(base_time() + Duration::days(365))),
        ..JournalEntryPatch::default()
    };
    match service.update_entry(created.id, forged.clone()) {
        Err(RepoError::Validation(err)) => assert_eq!(err.violations()[0].field, "synced_at"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(repo.get_entry(created.id).unwrap().unwrap().synced_at, None);

    let synced_at = base_time() + Duration::hours(3);
    repo.mark_synced(created.id, synced_at).unwrap();
    assert!(matches!(
        service.update_entry(created.id, forged),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(
        repo.get_entry(created.id).unwrap().unwrap().synced_at,
        Some(synced_at)
    );

    let cleared = service
        .update_entry(
            created.id,
            JournalEntryPatch {
                synced_at: Some(None),
                ..JournalEntryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.synced_at, None);
}
