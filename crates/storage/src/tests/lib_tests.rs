use super::*;

#[tokio::test]
async fn sets_and_reads_back_a_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set("products_db_v1", "[]").await.expect("set");
    let value = storage.get("products_db_v1").await.expect("get");
    assert_eq!(value.as_deref(), Some("[]"));
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.get("inventory_session").await.expect("get"), None);
}

#[tokio::test]
async fn set_overwrites_existing_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set("k", "first").await.expect("set first");
    storage.set("k", "second").await.expect("set second");
    assert_eq!(storage.get("k").await.expect("get").as_deref(), Some("second"));
    assert_eq!(storage.keys().await.expect("keys"), vec!["k".to_string()]);
}

#[tokio::test]
async fn remove_clears_the_slot_and_tolerates_absent_keys() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set("inventory_session", "{}").await.expect("set");
    storage.remove("inventory_session").await.expect("remove");
    assert_eq!(storage.get("inventory_session").await.expect("get"), None);
    storage.remove("inventory_session").await.expect("remove again");
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("inventory.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.set("k", "v").await.expect("set");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn values_survive_reopening_the_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("inventory.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.set("inventory_users", r#"[{"id":1}]"#).await.expect("set");
    storage.pool.close().await;

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get("inventory_users").await.expect("get").as_deref(),
        Some(r#"[{"id":1}]"#)
    );
}

#[tokio::test]
async fn memory_kv_clones_share_entries() {
    let kv = MemoryKv::new();
    let other = kv.clone();
    kv.set("a", "1").await.expect("set");
    assert_eq!(other.get("a").await.expect("get").as_deref(), Some("1"));
    other.remove("a").await.expect("remove");
    assert_eq!(kv.get("a").await.expect("get"), None);
}

#[tokio::test]
async fn arc_wrapped_store_forwards_calls() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
    kv.set("a", "1").await.expect("set");
    assert_eq!(kv.get("a").await.expect("get").as_deref(), Some("1"));
}

#[test]
fn sqlite_path_ignores_memory_and_query_suffix() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/inventory.db?mode=rwc"),
        Some(PathBuf::from("./data/inventory.db"))
    );
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
}
