//! 轨道配置 (TrackInfo).
//!
//! 由外部配置层在建轨时创建一次, 之后对读取器与打包器只读, 通过 `Arc` 在两者之间共享.

use crate::compression::CompressionKind;

/// 压缩设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionSetting {
    /// 使用格式默认值 (VobSub 为 zlib, 其余不压缩)
    #[default]
    FormatDefault,
    /// 强制不压缩
    Disabled,
    /// 强制使用指定算法
    Enabled(CompressionKind),
}

impl CompressionSetting {
    /// 结合格式默认值得到最终生效的压缩算法
    pub fn resolve(self, format_default: Option<CompressionKind>) -> Option<CompressionKind> {
        match self {
            Self::FormatDefault => format_default,
            Self::Disabled => None,
            Self::Enabled(kind) => Some(kind),
        }
    }
}

/// 单条轨道的配置
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    /// 轨道 ID
    pub id: u64,
    /// 源文件名 (仅用于日志与识别报告)
    pub file_name: Option<String>,
    /// 语言代码
    pub language: Option<String>,
    /// 强制时钟频率 (每秒采样数), 覆盖码流头部中的值
    pub samples_per_second: Option<u32>,
    /// 负载压缩
    pub compression: CompressionSetting,
    /// 文本字幕字符集标签 (如 "windows-1252"), None 表示自动检测
    pub sub_charset: Option<String>,
    /// VobSub 调色板 (16 个 0xRRGGBB)
    pub vobsub_palette: Option<Vec<u32>>,
    /// 图像字幕画面尺寸 (宽, 高)
    pub frame_size: Option<(u32, u32)>,
}

impl TrackInfo {
    /// 创建指定 ID 的默认轨道配置
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// 设置源文件名
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// 设置语言
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// 强制时钟频率
    pub fn with_samples_per_second(mut self, samples_per_second: u32) -> Self {
        self.samples_per_second = Some(samples_per_second);
        self
    }

    /// 设置压缩
    pub fn with_compression(mut self, compression: CompressionSetting) -> Self {
        self.compression = compression;
        self
    }

    /// 设置字幕字符集
    pub fn with_sub_charset(mut self, charset: impl Into<String>) -> Self {
        self.sub_charset = Some(charset.into());
        self
    }

    /// 设置 VobSub 调色板
    pub fn with_vobsub_palette(mut self, palette: Vec<u32>) -> Self {
        self.vobsub_palette = Some(palette);
        self
    }

    /// 设置画面尺寸
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    /// 日志中使用的来源名
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<stream>")
    }
}
