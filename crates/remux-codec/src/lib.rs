//! # remux-codec
//!
//! remux 数据包与打包器库.
//!
//! 读取器从码流中提取的原始单元 ([`RawUnit`]) 经由打包器 ([`Packetizer`]) 附加时间戳、
//! 时长与编码元数据后, 作为 [`Packet`] 交给下游封装器 ([`PacketSink`]).
//! 没有显式时间戳的码流由 [`TimestampCalculator`] 依据采样数重建时间轴.
//!
//! ## 打包器
//!
//! - **AC-3 / E-AC-3**: 从任意切分的字节块中重组完整帧, 按采样数推导时间戳
//! - **文本字幕**: 接收已带时间的字幕条目 (UTF-8)
//! - **VobSub**: 接收已带时间的图像字幕, 默认 zlib 压缩, 带调色板头部

pub mod codec_id;
pub mod compression;
pub mod packet;
pub mod packetizer;
pub mod packetizers;
pub mod parsers;
pub mod sink;
pub mod timestamp_calculator;
pub mod track;

// 重导出常用类型
pub use codec_id::CodecId;
pub use compression::CompressionKind;
pub use packet::{Packet, RawUnit};
pub use packetizer::{ConnectionParams, Packetizer};
pub use sink::{PacketQueue, PacketSink, TrackHeaders};
pub use timestamp_calculator::TimestampCalculator;
pub use track::{CompressionSetting, TrackInfo};
