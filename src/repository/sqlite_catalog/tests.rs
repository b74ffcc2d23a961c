use super::SqliteCatalogStore;
use crate::domain::history::{ImportHistory, MaterialChange};
use crate::domain::material::{MaterialDetails, MaterialRow};
use crate::domain::query::MaterialQuery;
use crate::domain::types::{ChangeType, MaterialSortField, SortOrder};
use crate::repository::catalog_store::{CatalogStore, CatalogTx};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_store() -> SqliteCatalogStore {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    SqliteCatalogStore::new(Arc::new(Mutex::new(conn)))
}

fn make_row(code: &str, name: &str, quantity: f64, price: Option<f64>) -> MaterialRow {
    MaterialRow {
        row_number: 1,
        sequence: None,
        code: code.to_string(),
        name: Some(name.to_string()),
        unit: Some("kg".to_string()),
        lot: None,
        origin: None,
        quality: None,
        quantity,
        unit_price: price,
        total_value: None,
    }
}

fn make_history(id: &str, minutes: i64) -> ImportHistory {
    ImportHistory {
        id: id.to_string(),
        file_name: format!("{}.xlsx", id),
        imported_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes),
        total_items: 1,
        new_items: 1,
        updated_items: 0,
        removed_items: 0,
    }
}

fn make_change(id: &str, import_id: &str, material_id: &str) -> MaterialChange {
    MaterialChange {
        id: id.to_string(),
        import_id: import_id.to_string(),
        material_id: material_id.to_string(),
        change_type: ChangeType::New,
        old_quantity: None,
        new_quantity: Some(1.0),
        quantity_diff: Some(1.0),
        note: Some("Vật tư mới".to_string()),
        created_at: Utc::now(),
    }
}

#[test]
fn test_material_round_trip_preserves_fields() {
    let store = setup_store();
    let now = Utc::now();

    let inserted = store
        .transaction(|tx| tx.upsert_material(&make_row("A01", "Thép", 12.5, Some(1000.0)), now))
        .unwrap();

    let loaded = store.find_material_by_code("A01").unwrap().unwrap();
    assert_eq!(loaded, inserted);
    assert_eq!(loaded.created_at, now);
}

#[test]
fn test_rollback_on_closure_error() {
    let store = setup_store();

    let result: RepositoryResult<()> = store.transaction(|tx| {
        tx.upsert_material(&make_row("A01", "Thép", 1.0, None), Utc::now())?;
        Err(RepositoryError::InternalError("abort".to_string()))
    });

    assert!(result.is_err());
    assert!(store.find_material_by_code("A01").unwrap().is_none());
}

#[test]
fn test_duplicate_code_is_unique_violation() {
    let store = setup_store();
    let now = Utc::now();
    let first = store
        .transaction(|tx| tx.upsert_material(&make_row("A01", "Thép", 1.0, None), now))
        .unwrap();

    let mut clone = first.clone();
    clone.id = "other".to_string();
    let result = store.transaction(|tx| tx.insert_material(&clone));
    assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));
}

#[test]
fn test_update_details_keeps_quantity() {
    let store = setup_store();
    let now = Utc::now();
    store
        .transaction(|tx| tx.upsert_material(&make_row("A01", "Thép", 4.0, None), now))
        .unwrap();

    let details = MaterialDetails {
        name: Some("Thép tấm".to_string()),
        unit_price: Some(50.0),
        ..Default::default()
    };
    let updated = store
        .transaction(|tx| tx.update_material_details("A01", &details, now))
        .unwrap();
    assert_eq!(updated, 1);

    let loaded = store.find_material_by_code("A01").unwrap().unwrap();
    assert_eq!(loaded.name.as_deref(), Some("Thép tấm"));
    assert_eq!(loaded.unit, None);
    assert_eq!(loaded.quantity, 4.0);
}

#[test]
fn test_latest_history_and_cascade_delete() {
    let store = setup_store();
    let now = Utc::now();

    store
        .transaction(|tx| {
            let m = tx.upsert_material(&make_row("A01", "Thép", 1.0, None), now)?;
            tx.insert_history(&make_history("h1", 0))?;
            tx.insert_history(&make_history("h2", 5))?;
            tx.insert_change(&make_change("c1", "h2", &m.id))?;
            tx.insert_change(&make_change("c2", "h2", &m.id))?;
            Ok(())
        })
        .unwrap();

    let latest = store.transaction(|tx| tx.latest_history()).unwrap().unwrap();
    assert_eq!(latest.id, "h2");

    let page = store.list_histories(1, 10).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].history.id, "h2");
    assert_eq!(page.items[0].change_count, 2);
    assert_eq!(page.items[1].change_count, 0);

    store.transaction(|tx| tx.delete_history("h2")).unwrap();
    let remaining = store
        .transaction(|tx| tx.list_changes_for_history("h2"))
        .unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn test_change_requires_existing_history() {
    let store = setup_store();
    let now = Utc::now();

    let result = store.transaction(|tx| {
        let m = tx.upsert_material(&make_row("A01", "Thép", 1.0, None), now)?;
        tx.insert_change(&make_change("c1", "missing", &m.id))
    });
    assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
}

#[test]
fn test_list_materials_search_sort_and_paging() {
    let store = setup_store();
    let now = Utc::now();

    store
        .transaction(|tx| {
            tx.upsert_material(&make_row("B02", "Bu lông", 30.0, Some(2.0)), now)?;
            tx.upsert_material(&make_row("A01", "Thép tấm", 10.0, Some(100.0)), now)?;
            tx.upsert_material(&make_row("C03", "Thép ống", 20.0, None), now)?;
            let mut c = tx.find_material_by_code("C03")?.unwrap();
            c.active = false;
            tx.update_material(&c)
        })
        .unwrap();

    let all = store.list_materials(&MaterialQuery::default()).unwrap();
    let codes: Vec<_> = all.items.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(codes, vec!["A01", "B02"]);

    let query = MaterialQuery {
        search: Some("thép".to_string()),
        include_inactive: true,
        sort_by: MaterialSortField::Quantity,
        order: SortOrder::Desc,
        ..Default::default()
    };
    let found = store.list_materials(&query).unwrap();
    let codes: Vec<_> = found.items.iter().map(|m| m.code.as_str()).collect();
    assert_eq!(codes, vec!["C03", "A01"]);

    let query = MaterialQuery {
        search: Some("0".to_string()),
        include_inactive: true,
        sort_by: MaterialSortField::Quantity,
        order: SortOrder::Desc,
        page: 2,
        limit: 2,
        ..Default::default()
    };
    let page = store.list_materials(&query).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].code, "A01");
}

#[test]
fn test_dashboard_stats_counts_active_value() {
    let store = setup_store();
    let now = Utc::now();

    store
        .transaction(|tx| {
            tx.upsert_material(&make_row("A01", "Thép", 10.0, Some(100.0)), now)?;
            tx.upsert_material(&make_row("B02", "Bu lông", 3.0, None), now)?;
            let mut m = tx.upsert_material(&make_row("C03", "Ống", 5.0, Some(7.0)), now)?;
            m.active = false;
            m.quantity = 0.0;
            tx.update_material(&m)?;
            tx.insert_history(&make_history("h1", 0))
        })
        .unwrap();

    let stats = store.dashboard_stats().unwrap();
    assert_eq!(stats.total_materials, 3);
    assert_eq!(stats.active_materials, 2);
    assert_eq!(stats.inactive_materials, 1);
    assert_eq!(stats.total_value, 1000.0);
    assert_eq!(stats.recent_import.map(|h| h.id), Some("h1".to_string()));
}
