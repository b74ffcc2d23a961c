use super::core::{
    change_from_row, format_ts, history_from_row, material_from_row, CHANGE_COLUMNS,
    HISTORY_COLUMNS, MATERIAL_COLUMNS,
};
use crate::domain::history::{ImportHistory, MaterialChange};
use crate::domain::material::{Material, MaterialDetails};
use crate::repository::catalog_store::CatalogTx;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// SqliteCatalogTx - 事务作用域
// ==========================================
// 持有事务（或只读查询时的普通连接）的借用
pub struct SqliteCatalogTx<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCatalogTx<'a> {
    pub(super) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl CatalogTx for SqliteCatalogTx<'_> {
    fn find_material_by_code(&self, code: &str) -> RepositoryResult<Option<Material>> {
        let sql = format!("SELECT {} FROM material WHERE code = ?1", MATERIAL_COLUMNS);
        let material = self
            .conn
            .query_row(&sql, params![code], material_from_row)
            .optional()?;
        Ok(material)
    }

    fn find_material_by_id(&self, id: &str) -> RepositoryResult<Option<Material>> {
        let sql = format!("SELECT {} FROM material WHERE id = ?1", MATERIAL_COLUMNS);
        let material = self
            .conn
            .query_row(&sql, params![id], material_from_row)
            .optional()?;
        Ok(material)
    }

    fn list_active_materials(&self) -> RepositoryResult<Vec<Material>> {
        let sql = format!(
            "SELECT {} FROM material WHERE active = 1 ORDER BY rowid",
            MATERIAL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let materials = stmt
            .query_map([], material_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    fn insert_material(&mut self, material: &Material) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO material (
                id, code, sequence, name, unit, lot, origin, quality,
                quantity, unit_price, total_value, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                material.id,
                material.code,
                material.sequence,
                material.name,
                material.unit,
                material.lot,
                material.origin,
                material.quality,
                material.quantity,
                material.unit_price,
                material.total_value,
                material.active as i64,
                format_ts(&material.created_at),
                format_ts(&material.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update_material(&mut self, material: &Material) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            r#"
            UPDATE material SET
                code = ?2, sequence = ?3, name = ?4, unit = ?5, lot = ?6,
                origin = ?7, quality = ?8, quantity = ?9, unit_price = ?10,
                total_value = ?11, active = ?12, updated_at = ?13
            WHERE id = ?1
            "#,
            params![
                material.id,
                material.code,
                material.sequence,
                material.name,
                material.unit,
                material.lot,
                material.origin,
                material.quality,
                material.quantity,
                material.unit_price,
                material.total_value,
                material.active as i64,
                format_ts(&material.updated_at),
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::not_found("Material", &material.id));
        }
        Ok(())
    }

    fn update_material_details(
        &mut self,
        code: &str,
        details: &MaterialDetails,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            r#"
            UPDATE material SET
                sequence = ?2, name = ?3, unit = ?4, lot = ?5, origin = ?6,
                quality = ?7, unit_price = ?8, total_value = ?9, updated_at = ?10
            WHERE code = ?1
            "#,
            params![
                code,
                details.sequence,
                details.name,
                details.unit,
                details.lot,
                details.origin,
                details.quality,
                details.unit_price,
                details.total_value,
                format_ts(&updated_at),
            ],
        )?;
        Ok(rows)
    }

    fn insert_history(&mut self, history: &ImportHistory) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO import_history (
                id, file_name, imported_at, total_items, new_items, updated_items, removed_items
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                history.id,
                history.file_name,
                format_ts(&history.imported_at),
                history.total_items,
                history.new_items,
                history.updated_items,
                history.removed_items,
            ],
        )?;
        Ok(())
    }

    fn find_history(&self, id: &str) -> RepositoryResult<Option<ImportHistory>> {
        let sql = format!("SELECT {} FROM import_history WHERE id = ?1", HISTORY_COLUMNS);
        let history = self
            .conn
            .query_row(&sql, params![id], |row| history_from_row(row, 0))
            .optional()?;
        Ok(history)
    }

    fn latest_history(&self) -> RepositoryResult<Option<ImportHistory>> {
        let sql = format!(
            "SELECT {} FROM import_history ORDER BY imported_at DESC, rowid DESC LIMIT 1",
            HISTORY_COLUMNS
        );
        let history = self
            .conn
            .query_row(&sql, [], |row| history_from_row(row, 0))
            .optional()?;
        Ok(history)
    }

    fn delete_history(&mut self, id: &str) -> RepositoryResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM import_history WHERE id = ?1", params![id])?;
        Ok(rows)
    }

    fn insert_change(&mut self, change: &MaterialChange) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO material_change (
                id, import_id, material_id, change_type, old_quantity,
                new_quantity, quantity_diff, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                change.id,
                change.import_id,
                change.material_id,
                change.change_type.as_str(),
                change.old_quantity,
                change.new_quantity,
                change.quantity_diff,
                change.note,
                format_ts(&change.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_changes_for_history(&self, import_id: &str) -> RepositoryResult<Vec<MaterialChange>> {
        let sql = format!(
            "SELECT {} FROM material_change WHERE import_id = ?1 ORDER BY rowid",
            CHANGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let changes = stmt
            .query_map(params![import_id], change_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(changes)
    }

    fn delete_changes_for_history(&mut self, import_id: &str) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "DELETE FROM material_change WHERE import_id = ?1",
            params![import_id],
        )?;
        Ok(rows)
    }
}
