//! VobSub 图像字幕打包器.
//!
//! 字幕包由容器读取器解出, 已带时间戳. 轨道头部携带 idx 格式的私有数据
//! (画面尺寸与 16 色调色板), 负载默认以 zlib 压缩.

use std::fmt::Write as _;
use std::sync::Arc;

use bytes::Bytes;
use remux_core::{RemuxError, RemuxResult};

use crate::codec_id::CodecId;
use crate::compression::CompressionKind;
use crate::packet::{Packet, RawUnit};
use crate::packetizer::{ConnectionParams, Packetizer, PacketizerState};
use crate::sink::{PacketSink, TrackHeaders};
use crate::track::TrackInfo;

/// idx 私有数据首行
const IDX_HEADER_LINE: &str = "# VobSub index file, v7 (do not modify this line!)";

/// VobSub 打包器
pub struct VobSubPacketizer {
    state: PacketizerState,
    palette: Option<Vec<u32>>,
    frame_size: Option<(u32, u32)>,
}

impl VobSubPacketizer {
    /// 以轨道配置中的调色板与画面尺寸创建
    pub fn new(track: Arc<TrackInfo>) -> Self {
        let palette = track.vobsub_palette.clone();
        let frame_size = track.frame_size;
        Self {
            state: PacketizerState::new(track, Some(CompressionKind::Zlib)),
            palette,
            frame_size,
        }
    }

    /// 生成 idx 格式的私有数据
    fn codec_private(&self) -> String {
        let mut idx = String::new();
        let _ = writeln!(idx, "{IDX_HEADER_LINE}");
        if let Some((width, height)) = self.frame_size {
            let _ = writeln!(idx, "size: {width}x{height}");
        }
        if let Some(palette) = &self.palette {
            let colors: Vec<String> = palette
                .iter()
                .map(|rgb| format!("{:06x}", rgb & 0x00FF_FFFF))
                .collect();
            let _ = writeln!(idx, "palette: {}", colors.join(", "));
        }
        idx
    }
}

impl Packetizer for VobSubPacketizer {
    fn format_name(&self) -> &str {
        "VobSub"
    }

    fn codec_id(&self) -> CodecId {
        CodecId::VobSub
    }

    fn track_id(&self) -> u64 {
        self.state.track().id
    }

    fn headers(&self) -> TrackHeaders {
        let mut headers = self.state.base_headers(CodecId::VobSub);
        headers.frame_size = self.frame_size;
        headers.codec_private = Some(Bytes::from(self.codec_private()));
        headers
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

        let timestamp = unit
            .timestamp
            .ok_or_else(|| RemuxError::InvalidData("VobSub 数据包缺少时间戳".into()))?;
        let mut packet = Packet::new(self.state.track().id, unit.data)
            .with_timestamp(timestamp)
            .with_position(unit.position);
        packet.duration = unit.duration;
        self.state.emit(sink, packet)
    }

    fn flush(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<()> {
        self.set_headers(sink)
    }

    fn connection_params(&self) -> ConnectionParams {
        let mut params = ConnectionParams::new(CodecId::VobSub);
        params.palette = self.palette.clone();
        params.frame_size = self.frame_size;
        params
    }
}
