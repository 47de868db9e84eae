//! 打包器 trait 定义.
//!
//! 所有打包器实现必须实现 `Packetizer` trait.

use std::fmt::Debug;
use std::sync::Arc;

use log::warn;
use remux_core::{RemuxError, RemuxResult, Timestamp};

use crate::codec_id::CodecId;
use crate::compression::CompressionKind;
use crate::packet::{Packet, RawUnit};
use crate::sink::{PacketSink, TrackHeaders};
use crate::track::TrackInfo;

/// 打包器 trait
///
/// 接收读取器提取的原始单元, 附加时间戳与编码元数据后交给 [`PacketSink`].
///
/// 打包流程:
/// 1. 调用 `set_headers()` 发出轨道头部 (可重复调用, 只生效一次)
/// 2. 反复调用 `process()` 送入原始单元
/// 3. 码流结束时调用 `flush()` 输出缓存中的剩余数据
pub trait Packetizer: Send {
    /// 打包器名称 (用于日志与识别报告)
    fn format_name(&self) -> &str;

    /// 输出的编解码器
    fn codec_id(&self) -> CodecId;

    /// 所属轨道 ID
    fn track_id(&self) -> u64;

    /// 根据当前已知参数构造轨道头部
    fn headers(&self) -> TrackHeaders;

    /// 向接收端发出轨道头部
    ///
    /// 必须在第一个数据包之前调用; 重复调用为空操作.
    fn set_headers(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<()>;

    /// 处理一个原始单元, 产出零个或多个数据包
    fn process(&mut self, unit: RawUnit, sink: &mut dyn PacketSink) -> RemuxResult<()>;

    /// 输出缓存中的剩余数据
    fn flush(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<()>;

    /// 用于连接检查的流参数
    fn connection_params(&self) -> ConnectionParams;

    /// 检查另一个打包器的输出能否追加到本轨道之后
    ///
    /// 依次比较编解码器、采样率、声道数、bsid、调色板与画面尺寸, 返回第一个不一致的字段.
    fn can_connect_to(&self, other: &dyn Packetizer) -> RemuxResult<()> {
        self.connection_params()
            .check_compatible(&other.connection_params())
    }
}

/// 连接检查参数
///
/// 不适用于某格式的字段保持 `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// 编解码器
    pub codec_id: CodecId,
    /// 采样率
    pub sample_rate: Option<u32>,
    /// 声道数
    pub channels: Option<u32>,
    /// 码流标识
    pub bsid: Option<u8>,
    /// 调色板
    pub palette: Option<Vec<u32>>,
    /// 画面尺寸
    pub frame_size: Option<(u32, u32)>,
}

impl ConnectionParams {
    /// 只带编解码器的参数
    pub fn new(codec_id: CodecId) -> Self {
        Self {
            codec_id,
            sample_rate: None,
            channels: None,
            bsid: None,
            palette: None,
            frame_size: None,
        }
    }

    /// 逐字段比较
    pub fn check_compatible(&self, other: &ConnectionParams) -> RemuxResult<()> {
        compare("codec", &self.codec_id, &other.codec_id)?;
        compare("sample_rate", &self.sample_rate, &other.sample_rate)?;
        compare("channels", &self.channels, &other.channels)?;
        compare("bsid", &self.bsid, &other.bsid)?;
        compare("palette", &self.palette, &other.palette)?;
        compare("frame_size", &self.frame_size, &other.frame_size)
    }
}

fn compare<T: PartialEq + Debug>(field: &'static str, ours: &T, theirs: &T) -> RemuxResult<()> {
    if ours == theirs {
        Ok(())
    } else {
        Err(RemuxError::incompatible(
            field,
            format!("{ours:?}"),
            format!("{theirs:?}"),
        ))
    }
}

/// 各打包器共用的输出状态
///
/// 负责头部只发送一次、负载压缩以及单轨时间戳顺序检查.
#[derive(Debug)]
pub struct PacketizerState {
    track: Arc<TrackInfo>,
    compression: Option<CompressionKind>,
    headers_sent: bool,
    last_timestamp: Option<Timestamp>,
    packets_emitted: u64,
}

impl PacketizerState {
    /// 创建状态, `format_compression` 为该格式的默认压缩算法
    pub fn new(track: Arc<TrackInfo>, format_compression: Option<CompressionKind>) -> Self {
        let compression = track.compression.resolve(format_compression);
        Self {
            track,
            compression,
            headers_sent: false,
            last_timestamp: None,
            packets_emitted: 0,
        }
    }

    /// 轨道配置
    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    /// 生效的压缩算法
    pub fn compression(&self) -> Option<CompressionKind> {
        self.compression
    }

    /// 头部是否已发送
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// 已发出的数据包数
    pub fn packets_emitted(&self) -> u64 {
        self.packets_emitted
    }

    /// 带轨道通用字段 (语言, 压缩) 的头部
    pub fn base_headers(&self, codec_id: CodecId) -> TrackHeaders {
        let mut headers = TrackHeaders::new(self.track.id, codec_id);
        headers.language = self.track.language.clone();
        headers.compression = self.compression;
        headers
    }

    /// 首次调用时发出头部
    pub fn send_headers(
        &mut self,
        sink: &mut dyn PacketSink,
        headers: TrackHeaders,
    ) -> RemuxResult<()> {
        if self.headers_sent {
            return Ok(());
        }
        sink.set_track_headers(headers)?;
        self.headers_sent = true;
        Ok(())
    }

    /// 压缩负载并发出数据包
    pub fn emit(&mut self, sink: &mut dyn PacketSink, mut packet: Packet) -> RemuxResult<()> {
        if let Some(kind) = self.compression {
            packet.data = kind.compress(&packet.data)?;
            packet.compression = Some(kind);
        }

        if let Some(last) = self.last_timestamp {
            if packet.timestamp < last {
                warn!(
                    "{}: 轨道 {} 时间戳倒退 ({} < {})",
                    self.track.display_name(),
                    self.track.id,
                    packet.timestamp,
                    last
                );
            }
        }
        self.last_timestamp = Some(packet.timestamp);
        self.packets_emitted += 1;
        sink.accept(packet)
    }
}
