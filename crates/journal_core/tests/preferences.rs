use journal_core::db::{open_db, open_db_in_memory};
use journal_core::service::preference_service::DATA_LOSS_WARNING_SEEN_KEY;
use journal_core::{
    PreferenceRepository, PreferenceService, RepoError, SqlitePreferenceRepository,
};

#[test]
fn warning_flag_defaults_to_false_and_persists_once_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    {
        let conn = open_db(&path).unwrap();
        let prefs = PreferenceService::new(SqlitePreferenceRepository::try_new(&conn).unwrap());
        assert!(!prefs.has_seen_data_loss_warning().unwrap());
        prefs.mark_data_loss_warning_seen().unwrap();
        prefs.mark_data_loss_warning_seen().unwrap();
    }

    let conn = open_db(&path).unwrap();
    let prefs = PreferenceService::new(SqlitePreferenceRepository::try_new(&conn).unwrap());
    assert!(prefs.has_seen_data_loss_warning().unwrap());
}

#[test]
fn flags_round_trip_and_do_not_touch_entries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePreferenceRepository::try_new(&conn).unwrap();

    assert_eq!(repo.get_flag("other").unwrap(), None);
    repo.set_flag("other", true).unwrap();
    repo.set_flag("other", false).unwrap();
    assert_eq!(repo.get_flag("other").unwrap(), Some(false));

    let entries: i64 = conn
        .query_row("SELECT COUNT(*) FROM journal_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(entries, 0);
}

#[test]
fn malformed_flag_value_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, 'yes');",
        [DATA_LOSS_WARNING_SEEN_KEY],
    )
    .unwrap();

    let prefs = PreferenceService::new(SqlitePreferenceRepository::try_new(&conn).unwrap());
    let err = prefs.has_seen_data_loss_warning().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
