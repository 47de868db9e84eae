//! 统一错误类型定义.
//!
//! 所有 remux crate 共用的错误类型, 支持跨模块传播.
//!
//! 格式探测失败不属于错误: 探测器返回 `None` 即表示"不是此格式".
//! 字幕结构性解析错误在本地恢复, 以诊断信息的形式返回, 也不经过本类型.

use thiserror::Error;

/// remux 统一错误类型
#[derive(Debug, Error)]
pub enum RemuxError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 读取器构造时未能在预读窗口内找到有效的头部/结构
    #[error("头部无效: {0}")]
    MalformedHeader(String),

    /// 码流数据无效
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误 (构造成功后的读取/定位失败)
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 未找到匹配的容器格式
    #[error("未找到容器格式: {0}")]
    FormatNotFound(String),

    /// 两条轨道无法拼接 (追加模式), 指明不匹配的参数
    #[error("轨道无法拼接: {field} 不一致 (当前: {ours}, 追加: {theirs})")]
    IncompatibleConnection {
        /// 不匹配的参数名
        field: &'static str,
        /// 当前轨道的取值
        ours: String,
        /// 被追加轨道的取值
        theirs: String,
    },
}

impl RemuxError {
    /// 构造拼接不兼容错误
    pub fn incompatible(field: &'static str, ours: impl ToString, theirs: impl ToString) -> Self {
        Self::IncompatibleConnection {
            field,
            ours: ours.to_string(),
            theirs: theirs.to_string(),
        }
    }
}

/// remux 统一 Result 类型
pub type RemuxResult<T> = Result<T, RemuxError>;
