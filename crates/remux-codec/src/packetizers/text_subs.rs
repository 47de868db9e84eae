//! 文本字幕打包器.
//!
//! 字幕条目在读取阶段已经带有开始时间与时长, 打包器只做换行规范化与可选压缩.
//! 负载一律为 UTF-8.

use std::sync::Arc;

use log::warn;
use remux_core::{RemuxError, RemuxResult, Timestamp};

use crate::codec_id::CodecId;
use crate::packet::{Packet, RawUnit};
use crate::packetizer::{ConnectionParams, Packetizer, PacketizerState};
use crate::sink::{PacketSink, TrackHeaders};
use crate::track::TrackInfo;

/// UTF-8 文本字幕打包器
pub struct TextSubsPacketizer {
    state: PacketizerState,
}

impl TextSubsPacketizer {
    /// 创建打包器
    pub fn new(track: Arc<TrackInfo>) -> Self {
        Self {
            state: PacketizerState::new(track, None),
        }
    }
}

impl Packetizer for TextSubsPacketizer {
    fn format_name(&self) -> &str {
        "text subtitles"
    }

    fn codec_id(&self) -> CodecId {
        CodecId::TextUtf8
    }

    fn track_id(&self) -> u64 {
        self.state.track().id
    }

    fn headers(&self) -> TrackHeaders {
        self.state.base_headers(CodecId::TextUtf8)
    }

    fn set_headers(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<()> {
        if self.state.headers_sent() {
            return Ok(());
        }
        let headers = self.headers();
        self.state.send_headers(sink, headers)
    }

    fn process(&mut self, unit: RawUnit, sink: &mut dyn PacketSink) -> RemuxResult<()> {
        self.set_headers(sink)?;

        let timestamp = unit.timestamp.ok_or_else(|| {
            RemuxError::InvalidData("文本字幕条目缺少时间戳".into())
        })?;

        let mut duration = unit.duration.unwrap_or(Timestamp::ZERO);
        if duration < Timestamp::ZERO {
            warn!(
                "{}: 字幕条目 {} 的时长为负 ({} ns), 按 0 处理",
                self.state.track().display_name(),
                timestamp,
                duration.ns()
            );
            duration = Timestamp::ZERO;
        }

        let text = String::from_utf8_lossy(&unit.data).replace("\r\n", "\n");
        let packet = Packet::new(self.state.track().id, text.into_bytes())
            .with_timestamp(timestamp)
            .with_duration(duration)
            .with_position(unit.position);
        self.state.emit(sink, packet)
    }

    fn flush(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<()> {
        self.set_headers(sink)
    }

    fn connection_params(&self) -> ConnectionParams {
        ConnectionParams::new(CodecId::TextUtf8)
    }
}
