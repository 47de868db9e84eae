//! 数据包接收端 (PacketSink).
//!
//! 封装器实现此 trait 接收打包器的输出. 单条轨道内的数据包时间戳非递减,
//! 跨轨道交织由封装器自行负责.

use bytes::Bytes;
use remux_core::{MediaType, RemuxResult, Timestamp};

use crate::codec_id::CodecId;
use crate::compression::CompressionKind;
use crate::packet::Packet;

/// 音频轨道头部参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioHeaders {
    /// 采样率 (Hz)
    pub sample_rate: u32,
    /// 声道数 (含 LFE)
    pub channels: u32,
}

/// 轨道头部信息, 每条轨道在第一个数据包之前发出一次
#[derive(Debug, Clone, PartialEq)]
pub struct TrackHeaders {
    /// 轨道 ID
    pub track_id: u64,
    /// 编解码器
    pub codec_id: CodecId,
    /// 语言
    pub language: Option<String>,
    /// 音频参数
    pub audio: Option<AudioHeaders>,
    /// 画面尺寸 (图像字幕)
    pub frame_size: Option<(u32, u32)>,
    /// 编解码器私有数据
    pub codec_private: Option<Bytes>,
    /// 负载压缩算法
    pub compression: Option<CompressionKind>,
    /// 固定帧时长
    pub default_duration: Option<Timestamp>,
}

impl TrackHeaders {
    /// 创建只带编解码器信息的头部
    pub fn new(track_id: u64, codec_id: CodecId) -> Self {
        Self {
            track_id,
            codec_id,
            language: None,
            audio: None,
            frame_size: None,
            codec_private: None,
            compression: None,
            default_duration: None,
        }
    }

    /// 媒体类型
    pub fn media_type(&self) -> MediaType {
        self.codec_id.media_type()
    }
}

/// 数据包接收端
pub trait PacketSink {
    /// 接收轨道头部
    fn set_track_headers(&mut self, headers: TrackHeaders) -> RemuxResult<()>;

    /// 接收一个数据包
    fn accept(&mut self, packet: Packet) -> RemuxResult<()>;
}

/// 在内存中收集头部与数据包的接收端
#[derive(Debug, Default)]
pub struct PacketQueue {
    /// 已收到的轨道头部
    pub headers: Vec<TrackHeaders>,
    /// 已收到的数据包, 按到达顺序
    pub packets: Vec<Packet>,
}

impl PacketQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出全部数据包
    pub fn take_packets(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.packets)
    }

    /// 指定轨道的时间戳序列
    pub fn timestamps(&self, track_id: u64) -> Vec<Timestamp> {
        self.packets
            .iter()
            .filter(|p| p.track_id == track_id)
            .map(|p| p.timestamp)
            .collect()
    }
}

impl PacketSink for PacketQueue {
    fn set_track_headers(&mut self, headers: TrackHeaders) -> RemuxResult<()> {
        self.headers.push(headers);
        Ok(())
    }

    fn accept(&mut self, packet: Packet) -> RemuxResult<()> {
        self.packets.push(packet);
        Ok(())
    }
}
