// ==========================================
// 物料库存对账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::reader_config::{ColumnRole, ReaderConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 表头扫描行数（正整数）
    pub const HEADER_SCAN_ROWS: &str = "reader.header_scan_rows";
    /// 汇总行标记（JSON 字符串数组）
    pub const AGGREGATE_MARKERS: &str = "reader.aggregate_markers";
    /// 同义词前缀，完整键为 reader.synonyms.<role>（JSON 字符串数组）
    pub const SYNONYMS_PREFIX: &str = "reader.synonyms.";

    pub fn synonyms_key(role: super::ColumnRole) -> String {
        format!("{}{}", SYNONYMS_PREFIX, role.key())
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ImportResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 写入字符串数组配置（JSON 编码）
    pub fn set_string_list(&self, key: &str, values: &[String]) -> ImportResult<()> {
        let encoded = serde_json::to_string(values).map_err(|e| ImportError::ConfigValueError {
            key: key.to_string(),
            value: format!("{:?}", values),
            message: e.to_string(),
        })?;
        self.set_global_config_value(key, &encoded)
    }

    /// 获取所有 global 配置的快照（JSON 格式）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&config_map).map_err(|e| ImportError::InternalError(e.to_string()))
    }

    fn get_string_list(&self, key: &str) -> ImportResult<Option<Vec<String>>> {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let list: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| ImportError::ConfigValueError {
                key: key.to_string(),
                value: raw.clone(),
                message: format!("应为 JSON 字符串数组: {}", e),
            })?;

        let list: Vec<String> = list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if list.is_empty() {
            return Err(ImportError::ConfigValueError {
                key: key.to_string(),
                value: raw,
                message: "列表不能为空".to_string(),
            });
        }

        Ok(Some(list))
    }
}

impl ImportConfigReader for ConfigManager {
    fn load_reader_config(&self) -> ImportResult<ReaderConfig> {
        let mut config = ReaderConfig::default();

        if let Some(raw) = self.get_global_config_value(config_keys::HEADER_SCAN_ROWS)? {
            config.header_scan_rows = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ImportError::ConfigValueError {
                    key: config_keys::HEADER_SCAN_ROWS.to_string(),
                    value: raw.clone(),
                    message: "应为正整数".to_string(),
                })?;
        }

        if let Some(markers) = self.get_string_list(config_keys::AGGREGATE_MARKERS)? {
            config.aggregate_markers = markers;
        }

        for role in ColumnRole::ALL {
            if let Some(list) = self.get_string_list(&config_keys::synonyms_key(role))? {
                config.synonyms.set(role, list);
            }
        }

        tracing::debug!(
            header_scan_rows = config.header_scan_rows,
            "读取器配置已加载"
        );
        Ok(config)
    }
}
