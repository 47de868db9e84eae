//! AC-3 / E-AC-3 裸流读取器.
//!
//! 裸流没有容器结构, 读取器只按固定大小分块读取字节, 成帧与时间戳推导全部交给
//! [`Ac3Packetizer`]. 探测时要求连续若干个长度自洽的帧头, 以免把偶然出现的同步字误判为 AC-3.

use std::sync::Arc;

use log::{debug, info};
use remux_codec::packetizers::Ac3Packetizer;
use remux_codec::parsers::ac3::{self, Ac3Header};
use remux_codec::{PacketSink, Packetizer, RawUnit, TrackInfo};
use remux_core::{MediaType, RemuxError, RemuxResult};

use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_MAX};
use crate::reader::{percent, FileStatus, IdentifiedTrack, IdentifyReport, Reader};

/// 每次读取的块大小, 也是构造时的预读窗口
pub const CHUNK_SIZE: usize = 4096;

/// AC-3 读取器
pub struct Ac3Reader {
    io: IoContext,
    track: Arc<TrackInfo>,
    file_name: String,
    /// 预读窗口中的首个帧头
    header: Ac3Header,
    size: Option<u64>,
    bytes_processed: u64,
    packetizer: Option<Ac3Packetizer>,
    flushed: bool,
}

impl Ac3Reader {
    /// 校验预读窗口并创建读取器
    ///
    /// 前 [`CHUNK_SIZE`] 字节内找不到有效帧头时返回 `MalformedHeader`.
    pub fn open(mut io: IoContext, track: Arc<TrackInfo>) -> RemuxResult<Self> {
        let file_name = track
            .file_name
            .clone()
            .or_else(|| io.name().map(str::to_string))
            .unwrap_or_else(|| track.display_name().to_string());

        io.rewind()?;
        let window = io.read_bytes_up_to(CHUNK_SIZE)?;
        let (offset, header) = ac3::find_header(&window).ok_or_else(|| {
            RemuxError::MalformedHeader(format!(
                "{file_name}: 前 {} 字节内没有有效的 AC-3 帧头",
                window.len()
            ))
        })?;
        io.rewind()?;

        info!("{file_name}: 使用 AC-3 读取器");
        debug!(
            "{file_name}: 首帧偏移 {offset}, {} Hz, {} 声道, bsid {}, 帧长 {}",
            header.sample_rate, header.channels, header.bsid, header.frame_size
        );

        let size = io.size();
        Ok(Self {
            io,
            track,
            file_name,
            header,
            size,
            bytes_processed: 0,
            packetizer: None,
            flushed: false,
        })
    }

    /// 注册表使用的工厂函数
    pub fn create(io: IoContext, track: Arc<TrackInfo>) -> RemuxResult<Box<dyn Reader>> {
        Ok(Box::new(Self::open(io, track)?))
    }

    /// 构造时解析的首帧头
    pub fn header(&self) -> &Ac3Header {
        &self.header
    }

    fn ensure_packetizer(&mut self) -> &mut Ac3Packetizer {
        let track = &self.track;
        let header = self.header;
        let file_name = &self.file_name;
        self.packetizer.get_or_insert_with(|| {
            info!("{file_name}: 轨道 {} 使用 AC-3 输出模块", track.id);
            Ac3Packetizer::new(Arc::clone(track), header)
        })
    }
}

impl Reader for Ac3Reader {
    fn format_id(&self) -> FormatId {
        FormatId::Ac3
    }

    fn create_packetizer(&mut self) -> RemuxResult<()> {
        self.ensure_packetizer();
        Ok(())
    }

    fn packetizer(&self) -> Option<&dyn Packetizer> {
        self.packetizer.as_ref().map(|p| p as &dyn Packetizer)
    }

    fn read(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<FileStatus> {
        if self.flushed {
            return Ok(FileStatus::Done);
        }

        let position = self.bytes_processed;
        let chunk = self.io.read_bytes_up_to(CHUNK_SIZE)?;
        if chunk.is_empty() {
            self.ensure_packetizer().flush(sink)?;
            self.flushed = true;
            return Ok(FileStatus::Done);
        }

        self.bytes_processed += chunk.len() as u64;
        let unit = RawUnit::new(chunk).with_position(position);
        self.ensure_packetizer().process(unit, sink)?;
        Ok(FileStatus::MoreData)
    }

    fn progress(&self) -> u8 {
        match self.size {
            Some(size) => percent(self.bytes_processed, size),
            None if self.flushed => 100,
            None => 0,
        }
    }

    fn identify(&self) -> IdentifyReport {
        let codec = if self.header.is_eac3() { "EAC3" } else { "AC3" };
        IdentifyReport {
            file_name: self.file_name.clone(),
            container: FormatId::Ac3.container_name().to_string(),
            tracks: vec![IdentifiedTrack {
                id: self.track.id,
                media_type: MediaType::Audio,
                codec: codec.to_string(),
            }],
        }
    }
}

/// AC-3 探测器
///
/// 在开头 `probe_size` 字节内寻找 `num_headers` 个连续帧头.
#[derive(Debug, Clone, Copy)]
pub struct Ac3Probe {
    /// 探测窗口大小 (字节)
    pub probe_size: usize,
    /// 要求的连续帧头个数
    pub num_headers: usize,
}

impl Ac3Probe {
    /// 默认探测窗口
    pub const DEFAULT_PROBE_SIZE: usize = 64 * 1024;

    /// 默认连续帧头个数
    pub const DEFAULT_NUM_HEADERS: usize = 2;

    /// 指定窗口与帧头个数
    pub fn new(probe_size: usize, num_headers: usize) -> Self {
        Self {
            probe_size,
            num_headers,
        }
    }

    /// 返回连续帧头序列的起始偏移, 未找到时返回 `None`
    ///
    /// 无论成功与否, 返回前都把字节源恢复到起始位置.
    pub fn find_valid_headers(&self, io: &mut IoContext) -> Option<usize> {
        let window = io
            .rewind()
            .and_then(|()| io.read_bytes_up_to(self.probe_size));
        let restored = io.rewind();
        let window = window.ok()?;
        restored.ok()?;
        ac3::find_consecutive_headers(&window, self.num_headers)
    }
}

impl Default for Ac3Probe {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROBE_SIZE, Self::DEFAULT_NUM_HEADERS)
    }
}

impl FormatProbe for Ac3Probe {
    fn probe(&self, io: &mut IoContext, _filename: Option<&str>) -> Option<ProbeScore> {
        self.find_valid_headers(io).map(|_| SCORE_MAX)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Ac3
    }
}
