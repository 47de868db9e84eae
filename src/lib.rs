//! # remux
//!
//! 纯 Rust 实现的基本流重封装管线.
//!
//! 读取器从字节源中提取原始单元, 时间戳计算器依据采样数与显式时间戳重建时间轴,
//! 打包器附加编码元数据后把数据包交给下游封装器.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use remux::codec::{PacketQueue, TrackInfo};
//! use remux::format::{FileStatus, IoContext};
//!
//! # fn main() -> remux::core::RemuxResult<()> {
//! let registry = remux::default_format_registry();
//! let io = IoContext::open_read("movie.ac3")?;
//! let track = Arc::new(TrackInfo::new(0).with_file_name("movie.ac3"));
//! let mut reader = registry.open_input(io, track)?;
//!
//! let mut sink = PacketQueue::new();
//! while reader.read(&mut sink)? == FileStatus::MoreData {}
//! println!("{}", reader.identify());
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `remux-core` | 错误类型, 纳秒时间戳, 位读取器 |
//! | `remux-codec` | 数据包, 时间戳计算器, 打包器 |
//! | `remux-format` | 字节源, 格式探测, 读取器 |

/// 核心类型与工具
pub use remux_core as core;

/// 数据包与打包器
pub use remux_codec as codec;

/// 输入格式与读取器
pub use remux_format as format;

/// 获取 remux 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置输入格式的注册表
pub fn default_format_registry() -> remux_format::FormatRegistry {
    let mut registry = remux_format::FormatRegistry::new();
    remux_format::register_all(&mut registry);
    registry
}
