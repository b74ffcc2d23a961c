// ==========================================
// 物料库存对账系统 - 导入API
// ==========================================
// 职责: 预览（读取 + 差异检测，不落库）与提交（事务写入 + 台账）
// 流程: bytes → SnapshotReader → rows → detect_changes → ChangeSet → ImportCommitter
// 红线: 预览不写库；提交失败不留下任何修改
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::change_set::ChangeSet;
use crate::domain::history::ImportHistory;
use crate::domain::material::MaterialRow;
use crate::engine::change_detector::detect_changes;
use crate::engine::events::{CatalogEvent, OptionalEventPublisher};
use crate::engine::import_committer::ImportCommitter;
use crate::importer::material_reader::SnapshotReader;
use crate::repository::catalog_store::CatalogStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const EVENT_SOURCE: &str = "import_api";

/// 预览结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    pub rows: Vec<MaterialRow>,
    pub changes: ChangeSet,
    /// 汇总文本
    pub summary: String,
}

/// 提交结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub history_id: String,
    pub summary: String,
    pub history: ImportHistory,
    pub ledger_entries: usize,
}

/// 导入API
pub struct ImportApi<S: CatalogStore> {
    store: Arc<S>,
    reader: Box<dyn SnapshotReader>,
    committer: ImportCommitter<S>,
    publisher: OptionalEventPublisher,
}

impl<S: CatalogStore> ImportApi<S> {
    pub fn new(
        store: Arc<S>,
        reader: Box<dyn SnapshotReader>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            committer: ImportCommitter::new(Arc::clone(&store)),
            store,
            reader,
            publisher,
        }
    }

    /// 预览一份快照
    ///
    /// # 返回
    /// - Ok(PreviewResult): 解析出的行 + 相对当前目录的差异
    /// - Err(ParseError): 文件为空/无法读取/找不到表头
    /// - Err(ValidationError): 没有任何物料行，或数量非法
    #[tracing::instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn preview(&self, bytes: &[u8]) -> ApiResult<PreviewResult> {
        let rows = self.reader.read_rows(bytes)?;
        validate_rows(&rows)?;

        let active = self.store.list_active_materials()?;
        let changes = detect_changes(&rows, &active);

        tracing::info!(
            total_rows = changes.total_in_file,
            new = changes.new_items.len(),
            increased = changes.increased_items.len(),
            decreased = changes.decreased_items.len(),
            removed = changes.removed_items.len(),
            unchanged = changes.unchanged_count,
            "预览完成"
        );

        Ok(PreviewResult {
            summary: changes.summary(),
            rows,
            changes,
        })
    }

    /// 从文件路径预览
    pub async fn preview_file(&self, path: &Path) -> ApiResult<PreviewResult> {
        let bytes = read_file(path).await?;
        self.preview(&bytes)
    }

    /// 提交预览结果
    ///
    /// 事务内会重新检测差异；目录在预览后被修改时返回 StaleChangeSet
    #[tracing::instrument(skip(self, rows, changes), fields(rows = rows.len()))]
    pub fn commit(
        &self,
        file_name: &str,
        rows: &[MaterialRow],
        changes: &ChangeSet,
    ) -> ApiResult<CommitOutcome> {
        if file_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件名不能为空".to_string()));
        }
        validate_rows(rows)?;

        let report = self
            .committer
            .commit(file_name, rows, changes)
            .map_err(ApiError::commit_failure)?;

        self.publisher.publish(CatalogEvent::import_committed(
            &report.history.id,
            Some(EVENT_SOURCE.to_string()),
        ));

        Ok(CommitOutcome {
            history_id: report.history.id.clone(),
            summary: changes.commit_summary(),
            history: report.history,
            ledger_entries: report.ledger_entries,
        })
    }

    /// 预览并立即提交一个文件
    pub async fn import_file(&self, path: &Path) -> ApiResult<CommitOutcome> {
        let preview = self.preview_file(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.commit(&file_name, &preview.rows, &preview.changes)
    }
}

async fn read_file(path: &Path) -> ApiResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        ApiError::ParseError(format!("无法读取文件 {}: {}", path.display(), e))
    })
}

/// 检测前的行集合校验
fn validate_rows(rows: &[MaterialRow]) -> ApiResult<()> {
    if rows.is_empty() {
        return Err(ApiError::ValidationError(
            "文件中没有任何物料行".to_string(),
        ));
    }

    if let Some(bad) = rows
        .iter()
        .find(|r| !r.quantity.is_finite() || r.quantity < 0.0)
    {
        return Err(ApiError::ValidationError(format!(
            "第 {} 行物料 {} 的数量无效: {}",
            bad.row_number, bad.code, bad.quantity
        )));
    }

    Ok(())
}
