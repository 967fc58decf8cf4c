pub mod extract;
pub mod summary;
pub mod xdata;

pub mod errors {
    use thiserror::Error;

    /// 单实体提取异常。只影响当前实体，整批提取继续进行。
    #[derive(Debug, Error)]
    pub enum ExtractError {
        #[error("实体数据与类型标签 {tag} 不匹配")]
        ShapeMismatch { tag: &'static str },
    }
}
