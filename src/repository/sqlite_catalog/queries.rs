use super::core::{
    change_from_row, history_from_row, material_from_row, SqliteCatalogStore, MATERIAL_COLUMNS,
};
use super::tx::SqliteCatalogTx;
use crate::domain::history::{ImportHistory, ImportHistorySummary, MaterialChangeDetail};
use crate::domain::material::Material;
use crate::domain::query::{page_offset, DashboardStats, MaterialQuery, Page};
use crate::repository::catalog_store::{CatalogStore, CatalogTx};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, TransactionBehavior};

/// LIKE 模式转义（配合 ESCAPE '\'）
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// limit = 0 时不分页（SQLite 中 LIMIT -1 表示不限）
fn limit_and_offset(page: u32, limit: u32) -> (i64, i64) {
    if limit == 0 {
        (-1, 0)
    } else {
        (limit as i64, page_offset(page, limit) as i64)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn CatalogTx) -> RepositoryResult<T>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let value = {
            let mut scope = SqliteCatalogTx::new(&tx);
            f(&mut scope)?
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(value)
    }

    fn list_active_materials(&self) -> RepositoryResult<Vec<Material>> {
        self.with_read(|conn| SqliteCatalogTx::new(conn).list_active_materials())
    }

    fn find_material_by_code(&self, code: &str) -> RepositoryResult<Option<Material>> {
        self.with_read(|conn| SqliteCatalogTx::new(conn).find_material_by_code(code))
    }

    fn list_materials(&self, query: &MaterialQuery) -> RepositoryResult<Page<Material>> {
        self.with_read(|conn| {
            let pattern = query.search_term().map(like_pattern);
            let include_inactive = query.include_inactive as i64;
            let filter = r#"
                WHERE (?1 IS NULL OR code LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
                  AND (?2 = 1 OR active = 1)
            "#;

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM material {}", filter),
                params![pattern, include_inactive],
                |row| row.get(0),
            )?;

            let (limit, offset) = limit_and_offset(query.page, query.limit);
            let sql = format!(
                "SELECT {} FROM material {} ORDER BY {} {}, code ASC LIMIT ?3 OFFSET ?4",
                MATERIAL_COLUMNS,
                filter,
                query.sort_by.sql_expr(),
                query.order.sql_keyword()
            );

            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(
                    params![pattern, include_inactive, limit, offset],
                    material_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Page::new(items, total, query.page, query.limit))
        })
    }

    fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        self.with_read(|conn| {
            let (total_materials, active_materials, total_value): (i64, i64, f64) = conn.query_row(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN active = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN active = 1 THEN quantity * COALESCE(unit_price, 0) ELSE 0 END), 0.0)
                FROM material
                "#,
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            let recent_import = SqliteCatalogTx::new(conn).latest_history()?;

            Ok(DashboardStats {
                total_materials,
                active_materials,
                inactive_materials: total_materials - active_materials,
                total_value,
                recent_import,
            })
        })
    }

    fn list_histories(
        &self,
        page: u32,
        limit: u32,
    ) -> RepositoryResult<Page<ImportHistorySummary>> {
        self.with_read(|conn| {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM import_history", [], |row| row.get(0))?;

            let (sql_limit, offset) = limit_and_offset(page, limit);
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM material_change c WHERE c.import_id = h.id),
                    h.id, h.file_name, h.imported_at, h.total_items,
                    h.new_items, h.updated_items, h.removed_items
                FROM import_history h
                ORDER BY h.imported_at DESC, h.rowid DESC
                LIMIT ?1 OFFSET ?2
                "#,
            )?;

            let items = stmt
                .query_map(params![sql_limit, offset], |row| {
                    Ok(ImportHistorySummary {
                        change_count: row.get(0)?,
                        history: history_from_row(row, 1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Page::new(items, total, page, limit))
        })
    }

    fn find_history(&self, id: &str) -> RepositoryResult<Option<ImportHistory>> {
        self.with_read(|conn| SqliteCatalogTx::new(conn).find_history(id))
    }

    fn list_change_details(&self, import_id: &str) -> RepositoryResult<Vec<MaterialChangeDetail>> {
        self.with_read(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    c.id, c.import_id, c.material_id, c.change_type, c.old_quantity,
                    c.new_quantity, c.quantity_diff, c.note, c.created_at,
                    m.code, m.name, m.unit
                FROM material_change c
                JOIN material m ON m.id = c.material_id
                WHERE c.import_id = ?1
                ORDER BY m.code ASC, c.rowid ASC
                "#,
            )?;

            let details = stmt
                .query_map(params![import_id], |row| {
                    Ok(MaterialChangeDetail {
                        change: change_from_row(row)?,
                        material_code: row.get(9)?,
                        material_name: row.get(10)?,
                        unit: row.get(11)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(details)
        })
    }
}
