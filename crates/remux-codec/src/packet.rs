//! 原始单元 (RawUnit) 与输出数据包 (Packet).
//!
//! 读取器产出 [`RawUnit`], 打包器将其转换为带完整时间信息的 [`Packet`] 交给封装器.

use bytes::Bytes;
use remux_core::Timestamp;

use crate::compression::CompressionKind;

/// 读取器提取的原始单元, 尚未完成时间戳对齐
///
/// 对于流式格式, 一个原始单元只是一块任意切分的字节, 可能包含多个或半个基本流帧.
#[derive(Debug, Clone, Default)]
pub struct RawUnit {
    /// 负载数据
    pub data: Bytes,
    /// 显式时间戳 (来自外层容器或字幕条目)
    pub timestamp: Option<Timestamp>,
    /// 显式时长 (已带时间的格式, 如字幕)
    pub duration: Option<Timestamp>,
    /// 负载首字节在源字节流中的偏移
    pub position: Option<u64>,
}

impl RawUnit {
    /// 从数据创建不带时间信息的原始单元
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// 附加显式时间戳
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// 附加显式时长
    pub fn with_duration(mut self, duration: Timestamp) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 附加源字节流偏移
    pub fn with_position(mut self, position: u64) -> Self {
        self.position = Some(position);
        self
    }
}

/// 输出数据包
///
/// 由打包器创建, 交给封装器后即不可变. 负载由数据包独占, 直到封装器消费.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// 负载数据 (若 `compression` 非空, 为压缩后的数据)
    pub data: Bytes,
    /// 显示时间戳 (纳秒)
    pub timestamp: Timestamp,
    /// 时长 (纳秒), None 表示未知
    pub duration: Option<Timestamp>,
    /// 所属轨道 ID
    pub track_id: u64,
    /// 负载压缩算法
    pub compression: Option<CompressionKind>,
    /// 负载在源字节流中的偏移
    pub position: Option<u64>,
}

impl Packet {
    /// 创建时间戳为零的数据包
    pub fn new(track_id: u64, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            timestamp: Timestamp::ZERO,
            duration: None,
            track_id,
            compression: None,
            position: None,
        }
    }

    /// 设置时间戳
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 设置时长
    pub fn with_duration(mut self, duration: Timestamp) -> Self {
        self.duration = Some(duration);
        self
    }

    /// 设置源字节流偏移
    pub fn with_position(mut self, position: Option<u64>) -> Self {
        self.position = position;
        self
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 结束时间 (时间戳 + 时长), 时长未知时等于时间戳
    pub fn end(&self) -> Timestamp {
        self.timestamp + self.duration.unwrap_or(Timestamp::ZERO)
    }
}
