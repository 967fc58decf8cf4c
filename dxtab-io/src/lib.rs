use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dxf::Drawing;
use tempfile::NamedTempFile;
use thiserror::Error;

use dxtab_core::record::Record;

/// UTF-8 BOM。前缀于表格文件，便于电子表格软件识别编码。
pub const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("读取 DXF 文件 {path:?} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: dxf::DxfError,
    },
    #[error("创建输出目录 {path:?} 失败: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("序列化表格 {path:?} 失败: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("写入表格文件 {path:?} 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 文档模型提供者的窄接口：按路径加载为可遍历的 DXF 文档。
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Drawing, IoError>;
}

/// 表格落盘的窄接口：按既定列序写出全部记录。
pub trait TableSink {
    fn write(&self, path: &Path, columns: &[String], records: &[Record]) -> Result<(), IoError>;
}

/// 基于 `dxf` crate 的文档提供者。格式解析完全委托给该 crate，
/// 本层只做错误归一。
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Drawing, IoError> {
        Drawing::load_file(path).map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// CSV 写出器：UTF-8 BOM、逗号分隔、RFC 4180 引号转义，
/// 非 ASCII 文本与内嵌分隔符均可安全往返。
pub struct CsvTableWriter;

impl CsvTableWriter {
    pub fn new() -> Self {
        Self
    }

    /// 在内存中组装完整文件内容，之后一次性落盘。
    fn render(
        &self,
        path: &Path,
        columns: &[String],
        records: &[Record],
    ) -> Result<Vec<u8>, IoError> {
        let mut buffer: Vec<u8> = UTF8_BOM.to_vec();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            writer.write_record(columns).map_err(|source| IoError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            for record in records {
                // 缺列写空单元格；列序之外的字段自然不出现
                let row: Vec<String> = columns
                    .iter()
                    .map(|column| record.cell(column).unwrap_or_default())
                    .collect();
                writer.write_record(&row).map_err(|source| IoError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
            writer.flush().map_err(|source| IoError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(buffer)
    }
}

impl TableSink for CsvTableWriter {
    fn write(&self, path: &Path, columns: &[String], records: &[Record]) -> Result<(), IoError> {
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|source| IoError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
                dir.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let buffer = self.render(path, columns, records)?;

        // 先写同目录临时文件再原子替换，失败不会留下残缺输出
        let mut staged = NamedTempFile::new_in(&parent).map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        staged.write_all(&buffer).map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        staged.persist(path).map_err(|error| IoError::Write {
            path: path.to_path_buf(),
            source: error.error,
        })?;
        Ok(())
    }
}
