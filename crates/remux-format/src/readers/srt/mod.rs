//! SubRip (SRT) 字幕读取器.
//!
//! 构造时读入并解码整个文件, 解析为按开始时间排序的字幕队列;
//! 之后每次 `read()` 向文本字幕打包器送出一条.

pub mod parser;

use std::sync::Arc;

use log::{info, warn};
use remux_codec::packetizers::TextSubsPacketizer;
use remux_codec::{PacketSink, Packetizer, RawUnit, TrackInfo};
use remux_core::{MediaType, RemuxError, RemuxResult};

use crate::charset::decode_text;
use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeScore, SCORE_MAX};
use crate::reader::{percent, FileStatus, IdentifiedTrack, IdentifyReport, Reader};
use crate::subtitles::SubtitleQueue;

pub use parser::{parse_srt, SrtDiagnostic, SrtDiagnosticKind, SrtDocument};

/// 探测时读取的字节数
const PROBE_WINDOW: usize = 4096;

/// SRT 读取器
pub struct SrtReader {
    track: Arc<TrackInfo>,
    file_name: String,
    queue: SubtitleQueue,
    diagnostics: Vec<SrtDiagnostic>,
    packetizer: Option<TextSubsPacketizer>,
    flushed: bool,
}

impl SrtReader {
    /// 校验并解析整个文件
    ///
    /// 开头不符合 SRT 结构时返回 `MalformedHeader`. 文件中部的结构错误只记录警告,
    /// 保留出错前解析到的条目.
    pub fn open(mut io: IoContext, track: Arc<TrackInfo>) -> RemuxResult<Self> {
        let file_name = track
            .file_name
            .clone()
            .or_else(|| io.name().map(str::to_string))
            .unwrap_or_else(|| track.display_name().to_string());

        if SrtProbe::find_header(&mut io).is_none() {
            return Err(RemuxError::MalformedHeader(format!(
                "{file_name}: 不是有效的 SRT 文件"
            )));
        }

        let data = io.read_to_end()?;
        let decoded = decode_text(&data, track.sub_charset.as_deref());
        if decoded.had_errors {
            warn!(
                "{file_name}: 按 {} 解码时遇到无效字节, 已替换为 U+FFFD",
                decoded.encoding.name()
            );
        }

        let document = parse_srt(&decoded.text);
        for diagnostic in &document.diagnostics {
            warn!("{file_name}: {diagnostic}");
        }

        info!(
            "{file_name}: 使用 SRT 读取器, {} 条字幕 ({})",
            document.entries.len(),
            decoded.encoding.name()
        );

        Ok(Self {
            track,
            file_name,
            queue: SubtitleQueue::new(document.entries),
            diagnostics: document.diagnostics,
            packetizer: None,
            flushed: false,
        })
    }

    /// 注册表使用的工厂函数
    pub fn create(io: IoContext, track: Arc<TrackInfo>) -> RemuxResult<Box<dyn Reader>> {
        Ok(Box::new(Self::open(io, track)?))
    }

    /// 字幕队列
    pub fn queue(&self) -> &SubtitleQueue {
        &self.queue
    }

    /// 解析时产生的诊断
    pub fn diagnostics(&self) -> &[SrtDiagnostic] {
        &self.diagnostics
    }

    fn ensure_packetizer(&mut self) -> &mut TextSubsPacketizer {
        let track = &self.track;
        let file_name = &self.file_name;
        self.packetizer.get_or_insert_with(|| {
            info!("{file_name}: 轨道 {} 使用文本字幕输出模块", track.id);
            TextSubsPacketizer::new(Arc::clone(track))
        })
    }

    fn finish(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<FileStatus> {
        if !self.flushed {
            self.ensure_packetizer().flush(sink)?;
            self.flushed = true;
        }
        Ok(FileStatus::Done)
    }
}

impl Reader for SrtReader {
    fn format_id(&self) -> FormatId {
        FormatId::Srt
    }

    fn create_packetizer(&mut self) -> RemuxResult<()> {
        self.ensure_packetizer();
        Ok(())
    }

    fn packetizer(&self) -> Option<&dyn Packetizer> {
        self.packetizer.as_ref().map(|p| p as &dyn Packetizer)
    }

    fn read(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<FileStatus> {
        let unit = match self.queue.next_entry() {
            Some(entry) => RawUnit::new(entry.text.clone())
                .with_timestamp(entry.start)
                .with_duration(entry.duration()),
            None => return self.finish(sink),
        };

        self.ensure_packetizer().process(unit, sink)?;

        if self.queue.is_empty() {
            self.finish(sink)
        } else {
            Ok(FileStatus::MoreData)
        }
    }

    fn progress(&self) -> u8 {
        percent(
            self.queue.num_processed() as u64,
            self.queue.num_entries() as u64,
        )
    }

    fn identify(&self) -> IdentifyReport {
        IdentifyReport {
            file_name: self.file_name.clone(),
            container: FormatId::Srt.container_name().to_string(),
            tracks: vec![IdentifiedTrack {
                id: self.track.id,
                media_type: MediaType::Subtitle,
                codec: "SRT".to_string(),
            }],
        }
    }
}

/// SRT 探测器
///
/// 第一个非空行必须是无符号整数, 下一行必须是时间码行, 且之后还能读到第三行.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtProbe;

impl SrtProbe {
    /// 检查开头结构, 返回首个序号 (超出 `u64` 时饱和)
    ///
    /// 返回前总是把字节源恢复到起始位置.
    pub fn find_header(io: &mut IoContext) -> Option<u64> {
        let window = io
            .rewind()
            .and_then(|()| io.read_bytes_up_to(PROBE_WINDOW));
        let restored = io.rewind();
        let window = window.ok()?;
        restored.ok()?;
        Self::check_window(&window)
    }

    fn check_window(window: &[u8]) -> Option<u64> {
        let decoded = decode_text(window, None);
        let mut lines = decoded
            .text
            .lines()
            .map(str::trim)
            .skip_while(|line| line.is_empty());

        let number = lines.next().filter(|line| parser::is_number_line(line))?;
        parser::parse_timecode_line(lines.next()?)?;
        lines.next()?;
        Some(number.parse().unwrap_or(u64::MAX))
    }
}

impl FormatProbe for SrtProbe {
    fn probe(&self, io: &mut IoContext, _filename: Option<&str>) -> Option<ProbeScore> {
        Self::find_header(io).map(|_| SCORE_MAX)
    }

    fn format_id(&self) -> FormatId {
        FormatId::Srt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remux_codec::{CodecId, PacketQueue};
    use remux_core::Timestamp;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n\
                          2\n00:00:03,000 --> 00:00:04,000\nWorld\n";

    fn open_reader(text: &str) -> SrtReader {
        let io = IoContext::from_memory(text.as_bytes().to_vec()).with_name("test.srt");
        SrtReader::open(io, Arc::new(TrackInfo::new(0))).unwrap()
    }

    #[test]
    fn test_探测() {
        let mut io = IoContext::from_memory(SAMPLE.as_bytes().to_vec());
        assert_eq!(SrtProbe.probe(&mut io, None), Some(SCORE_MAX));
        assert_eq!(io.position().unwrap(), 0);

        let mut io = IoContext::from_memory(b"\xEF\xBB\xBF\r\n7\r\n00:00:01,000 --> 00:00:02,000\r\n\r\n".to_vec());
        assert_eq!(SrtProbe::find_header(&mut io), Some(7));
    }

    #[test]
    fn test_探测_拒绝() {
        for text in [
            "hello\n00:00:01,000 --> 00:00:02,500\nx\n",
            "1\n00:00:01,000 -> 00:00:02,500\nx\n",
            "1\n00:00:01,000 --> 00:00:02,500",
            "-1\n00:00:01,000 --> 00:00:02,500\nx\n",
            "+1\n00:00:01,000 --> 00:00:02,500\nx\n",
            "",
        ] {
            let mut io = IoContext::from_memory(text.as_bytes().to_vec());
            assert_eq!(SrtProbe.probe(&mut io, None), None, "{text:?}");
            assert_eq!(io.position().unwrap(), 0);
        }
    }

    #[test]
    fn test_探测与解析器的序号规则一致() {
        let long = "123456789012345678901234";
        let text = format!("{long}\n00:00:01,000 --> 00:00:02,000\nx\n");
        let mut io = IoContext::from_memory(text.clone().into_bytes());
        assert_eq!(SrtProbe::find_header(&mut io), Some(u64::MAX));

        let reader = open_reader(&text);
        assert_eq!(reader.queue().num_entries(), 1);
        assert!(reader.diagnostics().is_empty());

        let io = IoContext::from_memory(b"+1\n00:00:01,000 --> 00:00:02,000\nx\n".to_vec());
        assert!(matches!(
            SrtReader::open(io, Arc::new(TrackInfo::new(0))),
            Err(RemuxError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_构造失败() {
        let io = IoContext::from_memory(b"not a subtitle file".to_vec());
        assert!(matches!(
            SrtReader::open(io, Arc::new(TrackInfo::new(0))),
            Err(RemuxError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_逐条读取() {
        let mut reader = open_reader(SAMPLE);
        let mut sink = PacketQueue::new();
        assert_eq!(reader.progress(), 0);

        assert_eq!(reader.read(&mut sink).unwrap(), FileStatus::MoreData);
        assert_eq!(reader.progress(), 50);
        assert_eq!(reader.read(&mut sink).unwrap(), FileStatus::Done);
        assert_eq!(reader.progress(), 100);
        assert_eq!(reader.read(&mut sink).unwrap(), FileStatus::Done);

        assert_eq!(sink.headers.len(), 1);
        assert_eq!(sink.headers[0].codec_id, CodecId::TextUtf8);
        assert_eq!(sink.packets.len(), 2);
        assert_eq!(&sink.packets[0].data[..], b"Hello");
        assert_eq!(sink.packets[0].timestamp, Timestamp::from_ms(1000));
        assert_eq!(sink.packets[0].duration, Some(Timestamp::from_ms(1500)));
        assert_eq!(&sink.packets[1].data[..], b"World");
    }

    #[test]
    fn test_字符集() {
        let mut data = b"1\n00:00:01,000 --> 00:00:02,000\n".to_vec();
        data.extend_from_slice(b"caf\xE9\n");
        let track = TrackInfo::new(0).with_sub_charset("windows-1252");
        let mut reader = SrtReader::open(IoContext::from_memory(data), Arc::new(track)).unwrap();
        let mut sink = PacketQueue::new();
        reader.read(&mut sink).unwrap();
        assert_eq!(&sink.packets[0].data[..], "café".as_bytes());
    }

    #[test]
    fn test_中途错误保留已解析条目() {
        let reader = open_reader("1\n00:00:01,000 --> 00:00:02,000\nA\n\n2\ngarbage\n");
        assert_eq!(reader.queue().num_entries(), 1);
        assert_eq!(reader.diagnostics().len(), 1);
        assert!(reader.diagnostics()[0].is_fatal());
    }

    #[test]
    fn test_识别报告() {
        let reader = open_reader(SAMPLE);
        assert_eq!(
            reader.identify().to_string(),
            "File 'test.srt': container: SRT\nTrack ID 0: subtitles (SRT)"
        );
    }
}
