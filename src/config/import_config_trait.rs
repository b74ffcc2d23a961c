// ==========================================
// 物料库存对账系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义读取器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::reader_config::ReaderConfig;
use crate::importer::error::ImportResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）, ReaderConfig（静态配置）
pub trait ImportConfigReader: Send + Sync {
    /// 读取表格读取器配置
    ///
    /// # 返回
    /// - Ok(ReaderConfig): 缺失的键使用默认值
    /// - Err: 配置值格式错误
    fn load_reader_config(&self) -> ImportResult<ReaderConfig>;
}

impl ImportConfigReader for ReaderConfig {
    fn load_reader_config(&self) -> ImportResult<ReaderConfig> {
        Ok(self.clone())
    }
}
