//! 编解码器标识符.
//!
//! 标识打包器输出的基本流格式, 并给出目标容器使用的编解码器 ID 字符串.

use std::fmt;
use remux_core::MediaType;

/// 编解码器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    // ========================
    // 音频
    // ========================
    /// AC-3 (Dolby Digital)
    Ac3,
    /// E-AC-3 (Dolby Digital Plus)
    Eac3,

    // ========================
    // 字幕
    // ========================
    /// UTF-8 纯文本字幕
    TextUtf8,
    /// DVD 位图字幕 (VobSub)
    VobSub,
}

impl CodecId {
    /// 获取编解码器对应的媒体类型
    pub const fn media_type(&self) -> MediaType {
        match self {
            Self::Ac3 | Self::Eac3 => MediaType::Audio,
            Self::TextUtf8 | Self::VobSub => MediaType::Subtitle,
        }
    }

    /// 获取编解码器的人类可读名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ac3 => "AC-3",
            Self::Eac3 => "E-AC-3",
            Self::TextUtf8 => "SubRip/SRT",
            Self::VobSub => "VobSub",
        }
    }

    /// 目标容器中的编解码器 ID
    pub const fn container_codec_id(&self) -> &'static str {
        match self {
            Self::Ac3 => "A_AC3",
            Self::Eac3 => "A_EAC3",
            Self::TextUtf8 => "S_TEXT/UTF8",
            Self::VobSub => "S_VOBSUB",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
