//! 输入格式标识符.

use std::fmt;

/// 输入格式标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FormatId {
    // ========================
    // 音频基本流
    // ========================
    /// AC-3 / E-AC-3 裸流
    Ac3,

    // ========================
    // 字幕
    // ========================
    /// SubRip (SRT)
    Srt,
}

impl FormatId {
    /// 获取格式的短名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ac3 => "ac3",
            Self::Srt => "srt",
        }
    }

    /// 识别报告中使用的容器名
    pub const fn container_name(&self) -> &'static str {
        match self {
            Self::Ac3 => "AC3",
            Self::Srt => "SRT",
        }
    }

    /// 获取格式常用的文件扩展名
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Ac3 => &["ac3", "eac3", "ec3"],
            Self::Srt => &["srt"],
        }
    }
}

impl FormatId {
    /// 所有已知格式标识的列表
    pub const ALL: &[FormatId] = &[Self::Ac3, Self::Srt];

    /// 根据文件扩展名猜测格式
    ///
    /// # 参数
    /// - `ext`: 文件扩展名 (不含 `.`, 如 "ac3", "srt")
    pub fn from_extension(ext: &str) -> Option<FormatId> {
        let ext_lower = ext.to_lowercase();
        Self::ALL
            .iter()
            .find(|id| id.extensions().contains(&ext_lower.as_str()))
            .copied()
    }

    /// 从文件路径猜测格式
    pub fn from_filename(filename: &str) -> Option<FormatId> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
