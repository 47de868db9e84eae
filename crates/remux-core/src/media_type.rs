//! 媒体类型定义.

use std::fmt;

/// 轨道的媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频轨道
    Video,
    /// 音频轨道
    Audio,
    /// 字幕轨道
    Subtitle,
}

impl MediaType {
    /// 识别报告中使用的类型名
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitles",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
