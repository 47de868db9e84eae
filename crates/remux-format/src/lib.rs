//! # remux-format
//!
//! remux 输入格式库: 字节源抽象、格式探测与读取器.
//!
//! 读取器独占一个 [`IoContext`], 校验格式头部后按块或按条目提取原始单元,
//! 交给自己创建的打包器. [`FormatRegistry`] 负责探测输入格式并创建对应读取器.
//!
//! ## 支持的格式
//!
//! - **AC-3 / E-AC-3 裸流**: 连续帧头探测, 4096 字节分块读取
//! - **SubRip (SRT)**: 逐行状态机解析, 支持 BOM 与字符集标签

pub mod charset;
pub mod format_id;
pub mod io;
pub mod probe;
pub mod reader;
pub mod readers;
pub mod registry;
pub mod subtitles;

// 重导出常用类型
pub use format_id::FormatId;
pub use io::{ByteStream, FileBackend, IoContext, MemoryBackend};
pub use probe::{FormatProbe, ProbeResult};
pub use reader::{FileStatus, IdentifiedTrack, IdentifyReport, Reader};
pub use registry::FormatRegistry;
pub use remux_codec::TrackInfo;
pub use subtitles::{SubtitleEntry, SubtitleQueue};

/// 注册所有内置输入格式
pub fn register_all(registry: &mut FormatRegistry) {
    readers::register_all_readers(registry);
}
