use std::path::PathBuf;

use thiserror::Error;

/// 导出失败的各类情形。`Display` 输出即为面向调用方的状态串。
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("[错误] 输入文件不存在：{}", .path.display())]
    MissingInput { path: PathBuf },
    #[error("[警告] DXF 中未发现任何实体：{}", .path.display())]
    EmptyDocument { path: PathBuf },
    #[error("[错误] DXF 解析或导出失败：{0}")]
    Io(#[from] dxtab_io::IoError),
}

impl ExportError {
    /// 空结果属于业务告警而非失败，调用方可据此决定退出码。
    pub fn is_warning(&self) -> bool {
        matches!(self, ExportError::EmptyDocument { .. })
    }
}
