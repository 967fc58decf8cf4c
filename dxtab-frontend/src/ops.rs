use std::path::{Path, PathBuf};

use tracing::{info, warn};

use dxtab_config::AppConfig;
use dxtab_core::schema;
use dxtab_engine::extract::ExtractorRegistry;
use dxtab_engine::summary;
use dxtab_io::{CsvTableWriter, DocumentLoader, DxfFacade, TableSink};

use crate::errors::ExportError;

/// 预览操作：加载文档并返回逐行结构摘要。
///
/// `max_entities` 为 `None` 时不限制数量。加载失败返回仅含一条
/// 错误信息的序列，调用方无需处理异常。
pub fn inspect_structure(filepath: &Path, max_entities: Option<usize>) -> Vec<String> {
    let loader = DxfFacade::new();
    let drawing = match loader.load(filepath) {
        Ok(drawing) => drawing,
        Err(error) => {
            warn!(path = %filepath.display(), error = %error, "预览加载失败");
            return vec![format!("加载 DXF 文件失败: {error}")];
        }
    };
    summary::summarize(&drawing, max_entities)
}

/// 导出操作（类型化接口）：实体 → 归一化记录 → 列序归并 → CSV。
///
/// 成功返回解析后的输出文件路径。两阶段流程：先收集整批记录，
/// 列序在看到全部字段之前不可知，之后才写出。
pub fn try_export_table(
    filepath: &Path,
    output: Option<&Path>,
    config: &AppConfig,
) -> Result<PathBuf, ExportError> {
    // 在触碰文档提供者之前先确认输入存在
    if !filepath.exists() {
        return Err(ExportError::MissingInput {
            path: filepath.to_path_buf(),
        });
    }

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => filepath.with_extension(config.export.output_extension.as_str()),
    };

    let loader = DxfFacade::new();
    let drawing = loader.load(filepath)?;

    let registry = ExtractorRegistry::new();
    let records: Vec<_> = drawing
        .entities()
        .map(|entity| registry.extract_record(entity))
        .collect();
    if records.is_empty() {
        return Err(ExportError::EmptyDocument {
            path: filepath.to_path_buf(),
        });
    }
    info!(path = %filepath.display(), records = records.len(), "实体提取完成");

    let columns = schema::reconcile(&records);
    CsvTableWriter::new().write(&output, &columns, &records)?;
    info!(path = %output.display(), columns = columns.len(), "CSV 表格写出完成");

    // 规范化失败不影响已写出的结果，退回原路径
    Ok(output.canonicalize().unwrap_or(output))
}

/// 导出操作（字符串边界）：任何失败都以可读状态串返回，
/// 与预览一样面向工具调用方，不向外抛异常。
pub fn export_table(filepath: &Path, output: Option<&Path>, config: &AppConfig) -> String {
    match try_export_table(filepath, output, config) {
        Ok(path) => format!("[成功] CSV 文件已生成：{}", path.display()),
        Err(error) => error.to_string(),
    }
}
