//! # remux-core
//!
//! remux 核心库, 提供错误类型、纳秒时间戳、媒体类型和比特流读取等基础设施.
//!
//! 本 crate 不依赖任何容器格式或编解码器细节, 为上层 `remux-codec` / `remux-format` 提供共享的数据模型叶子节点.

pub mod bitreader;
pub mod error;
pub mod media_type;
pub mod timestamp;

// 重导出常用类型
pub use error::{RemuxError, RemuxResult};
pub use media_type::MediaType;
pub use timestamp::Timestamp;
