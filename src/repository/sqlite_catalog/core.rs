use crate::db::{enable_wal, init_schema, open_sqlite_connection};
use crate::domain::history::{ImportHistory, MaterialChange};
use crate::domain::material::Material;
use crate::domain::types::ChangeType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub(super) const MATERIAL_COLUMNS: &str = "id, code, sequence, name, unit, lot, origin, quality, \
     quantity, unit_price, total_value, active, created_at, updated_at";

pub(super) const HISTORY_COLUMNS: &str =
    "id, file_name, imported_at, total_items, new_items, updated_items, removed_items";

pub(super) const CHANGE_COLUMNS: &str = "id, import_id, material_id, change_type, old_quantity, \
     new_quantity, quantity_diff, note, created_at";

// ==========================================
// SqliteCatalogStore - SQLite 目录仓储
// ==========================================
// 写: 单一连接 + 互斥锁，写事务串行
// 读: 文件库使用独立的只读连接池（WAL 下读不阻塞读）
// ==========================================
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
    readers: Option<ReadPool>,
}

impl SqliteCatalogStore {
    /// 使用已有连接（调用方负责 PRAGMA 与建表），读写共用该连接
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            readers: None,
        }
    }

    /// 打开数据库文件并建表
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        let readers = ReadPool::for_path(db_path);
        if readers.is_some() {
            enable_wal(&conn)?;
        }
        tracing::debug!(db_path, "目录数据库已打开");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            readers,
        })
    }

    /// 共享写连接（供配置管理器等复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 获取写连接
    pub(super) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在读连接上执行查询；无连接池时使用写连接
    pub(super) fn with_read<T>(
        &self,
        f: impl FnOnce(&Connection) -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        match &self.readers {
            Some(pool) => {
                let conn = pool.acquire()?;
                let result = f(&conn);
                pool.release(conn);
                result
            }
            None => {
                let conn = self.get_conn()?;
                f(&*conn)
            }
        }
    }
}

// ==========================================
// ReadPool - 只读连接池
// ==========================================
struct ReadPool {
    db_path: String,
    idle: Mutex<Vec<Connection>>,
}

impl ReadPool {
    /// 内存库每个连接各自独立，不建池
    fn for_path(db_path: &str) -> Option<Self> {
        if db_path.is_empty() || db_path == ":memory:" || db_path.starts_with("file::memory:") {
            return None;
        }
        Some(Self {
            db_path: db_path.to_string(),
            idle: Mutex::new(Vec::new()),
        })
    }

    fn acquire(&self) -> RepositoryResult<Connection> {
        let idle = self
            .idle
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?
            .pop();
        match idle {
            Some(conn) => Ok(conn),
            None => {
                tracing::trace!(db_path = %self.db_path, "新建读连接");
                Ok(open_sqlite_connection(&self.db_path)?)
            }
        }
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_READERS {
                idle.push(conn);
            }
        }
    }
}

const MAX_IDLE_READERS: usize = 4;

// ==========================================
// 时间戳与行映射
// ==========================================

/// 定宽 RFC3339（纳秒），文本排序即时间排序
pub(super) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(super) fn material_from_row(row: &Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        code: row.get(1)?,
        sequence: row.get(2)?,
        name: row.get(3)?,
        unit: row.get(4)?,
        lot: row.get(5)?,
        origin: row.get(6)?,
        quality: row.get(7)?,
        quantity: row.get(8)?,
        unit_price: row.get(9)?,
        total_value: row.get(10)?,
        active: row.get::<_, i64>(11)? != 0,
        created_at: ts_at(row, 12)?,
        updated_at: ts_at(row, 13)?,
    })
}

/// 从 offset 列开始映射 import_history
pub(super) fn history_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ImportHistory> {
    Ok(ImportHistory {
        id: row.get(offset)?,
        file_name: row.get(offset + 1)?,
        imported_at: ts_at(row, offset + 2)?,
        total_items: row.get(offset + 3)?,
        new_items: row.get(offset + 4)?,
        updated_items: row.get(offset + 5)?,
        removed_items: row.get(offset + 6)?,
    })
}

pub(super) fn change_from_row(row: &Row<'_>) -> rusqlite::Result<MaterialChange> {
    let raw_type: String = row.get(3)?;
    let change_type = raw_type
        .parse::<ChangeType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(MaterialChange {
        id: row.get(0)?,
        import_id: row.get(1)?,
        material_id: row.get(2)?,
        change_type,
        old_quantity: row.get(4)?,
        new_quantity: row.get(5)?,
        quantity_diff: row.get(6)?,
        note: row.get(7)?,
        created_at: ts_at(row, 8)?,
    })
}
