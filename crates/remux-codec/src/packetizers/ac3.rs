//! AC-3 / E-AC-3 打包器.
//!
//! 读取器送入的是任意切分的字节块, 打包器在内部缓存中重组完整同步帧,
//! 每个访问单元一个数据包 (AC-3 为单帧, E-AC-3 为主帧连同其后的子流帧). 码流本身不带时间戳, 由 [`TimestampCalculator`] 按每帧采样数推导;
//! 外层容器提供的显式时间戳按字节偏移对齐到对应的帧.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use log::{debug, info, warn};
use remux_core::RemuxResult;

use crate::codec_id::CodecId;
use crate::packet::{Packet, RawUnit};
use crate::packetizer::{ConnectionParams, Packetizer, PacketizerState};
use crate::parsers::ac3::{self, Ac3Header, HEADER_SIZE};
use crate::sink::{AudioHeaders, PacketSink, TrackHeaders};
use crate::timestamp_calculator::TimestampCalculator;
use crate::track::TrackInfo;

/// AC-3 / E-AC-3 打包器
pub struct Ac3Packetizer {
    state: PacketizerState,
    calculator: TimestampCalculator,
    /// 最近一帧的头部 (初始为读取器探测到的头部)
    header: Ac3Header,
    /// 未成帧的字节
    buffer: BytesMut,
    /// `buffer[0]` 在源字节流中的偏移
    buffer_pos: u64,
    /// 下一个送入字节的偏移 (原始单元不带偏移时使用)
    next_position: u64,
    /// 重同步时跳过的字节数
    skipped_bytes: u64,
}

impl Ac3Packetizer {
    /// 以读取器探测到的首帧头部创建
    ///
    /// 轨道配置中强制的时钟频率优先于头部中的采样率.
    pub fn new(track: Arc<TrackInfo>, header: Ac3Header) -> Self {
        let samples_per_second = track.samples_per_second.unwrap_or(header.sample_rate);
        info!(
            "{}: 轨道 {} 使用 {} 打包器 ({} Hz, {} 声道, bsid {})",
            track.display_name(),
            track.id,
            header.codec_id(),
            header.sample_rate,
            header.channels,
            header.bsid
        );
        Self {
            state: PacketizerState::new(track, None),
            calculator: TimestampCalculator::new(samples_per_second),
            header,
            buffer: BytesMut::new(),
            buffer_pos: 0,
            next_position: 0,
            skipped_bytes: 0,
        }
    }

    /// 重同步累计跳过的字节数
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    fn skip(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        debug!(
            "{}: 在偏移 {} 处跳过 {} 字节以重新同步",
            self.state.track().display_name(),
            self.buffer_pos,
            count
        );
        self.buffer.advance(count);
        self.buffer_pos += count as u64;
        self.skipped_bytes += count as u64;
    }

    /// 从缓存中取出所有完整的访问单元
    ///
    /// `at_end` 为真时不再等待后续字节来确定访问单元的边界.
    fn drain_frames(&mut self, sink: &mut dyn PacketSink, at_end: bool) -> RemuxResult<()> {
        loop {
            let Some((offset, header)) = ac3::find_header(&self.buffer) else {
                // 末尾不足一个帧头的字节可能是下一帧同步字的前半部分
                let keep = HEADER_SIZE - 1;
                if self.buffer.len() > keep {
                    self.skip(self.buffer.len() - keep);
                }
                return Ok(());
            };

            if let Some(real) = self.find_real_sync(offset, &header) {
                self.skip(real);
                continue;
            }
            self.skip(offset);
            if self.buffer.len() < header.frame_size {
                return Ok(());
            }

            if !header.starts_access_unit() {
                debug!(
                    "{}: 偏移 {} 处的 E-AC-3 子流帧没有对应的主帧",
                    self.state.track().display_name(),
                    self.buffer_pos
                );
                self.skip(header.frame_size);
                continue;
            }

            let Some(unit_size) = self.access_unit_size(&header, at_end) else {
                return Ok(());
            };
            let unit = self.buffer.split_to(unit_size).freeze();
            let position = self.buffer_pos;
            self.buffer_pos += unit_size as u64;
            self.emit_frame(sink, header, unit, position)?;
        }
    }

    /// 候选帧之后紧接的不是帧头时, 在候选帧范围内寻找被下一帧确认的同步点
    ///
    /// 帧间垃圾里偶然出现的同步字可能声明很大的帧长, 直接采用会吞掉后面的真实帧.
    /// 候选帧之后的字节尚未到达时无法否定它, 返回 `None`.
    fn find_real_sync(&self, offset: usize, header: &Ac3Header) -> Option<usize> {
        let frame_end = offset + header.frame_size;
        if self
            .buffer
            .get(frame_end..)
            .and_then(ac3::parse_header)
            .is_some()
        {
            return None;
        }

        let scan_end = frame_end.min(self.buffer.len().saturating_sub(HEADER_SIZE - 1));
        (offset + 1..scan_end).find(|&pos| {
            ac3::parse_header(&self.buffer[pos..]).is_some_and(|candidate| {
                self.buffer
                    .get(pos + candidate.frame_size..)
                    .and_then(ac3::parse_header)
                    .is_some_and(|next| next.same_stream(&candidate))
            })
        })
    }

    /// 以 `header` 开头的访问单元的字节数, 需要等待更多数据时返回 `None`
    ///
    /// 主帧之后的 E-AC-3 从属子流帧与附加子流帧并入同一访问单元.
    /// E-AC-3 主帧要看到下一个帧头才能确定边界; AC-3 帧完整即可输出.
    fn access_unit_size(&self, header: &Ac3Header, at_end: bool) -> Option<usize> {
        let mut size = header.frame_size;
        loop {
            let next = match self.buffer.get(size..) {
                Some(rest) if rest.len() >= HEADER_SIZE => ac3::parse_header(rest),
                _ if at_end || !header.is_eac3() => return Some(size),
                _ => return None,
            };
            match next {
                Some(next) if !next.starts_access_unit() => {
                    if self.buffer.len() < size + next.frame_size {
                        return at_end.then_some(size);
                    }
                    size += next.frame_size;
                }
                _ => return Some(size),
            }
        }
    }

    fn emit_frame(
        &mut self,
        sink: &mut dyn PacketSink,
        header: Ac3Header,
        frame: bytes::Bytes,
        position: u64,
    ) -> RemuxResult<()> {
        if header.sample_rate != self.header.sample_rate {
            debug!(
                "{}: 采样率变化 {} -> {} Hz (偏移 {})",
                self.state.track().display_name(),
                self.header.sample_rate,
                header.sample_rate,
                position
            );
            if self.state.track().samples_per_second.is_none() {
                self.calculator.set_samples_per_second(header.sample_rate)?;
            }
        } else if header.channels != self.header.channels || header.bsid != self.header.bsid {
            debug!(
                "{}: 帧参数变化, 声道 {} -> {}, bsid {} -> {}",
                self.state.track().display_name(),
                self.header.channels,
                header.channels,
                self.header.bsid,
                header.bsid
            );
        }
        self.header = header;

        let timestamp = self
            .calculator
            .get_next_timestamp(header.samples, Some(position))?;
        let duration = self.calculator.get_duration(header.samples)?;
        let packet = Packet::new(self.state.track().id, frame)
            .with_timestamp(timestamp)
            .with_duration(duration)
            .with_position(Some(position));
        self.state.emit(sink, packet)
    }
}

impl Packetizer for Ac3Packetizer {
    fn format_name(&self) -> &str {
        self.header.codec_id().name()
    }

    fn codec_id(&self) -> CodecId {
        self.header.codec_id()
    }

    fn track_id(&self) -> u64 {
        self.state.track().id
    }

    fn headers(&self) -> TrackHeaders {
        let mut headers = self.state.base_headers(self.header.codec_id());
        headers.audio = Some(AudioHeaders {
            sample_rate: self.header.sample_rate,
            channels: self.header.channels,
        });
        headers.default_duration = self.calculator.get_duration(self.header.samples).ok();
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

        let position = unit.position.unwrap_or(self.next_position);
        if self.buffer.is_empty() {
            self.buffer_pos = position;
        }
        self.next_position = position + unit.data.len() as u64;

        if let Some(timestamp) = unit.timestamp {
            self.calculator.add_timestamp(timestamp, Some(position));
        }

        self.buffer.extend_from_slice(&unit.data);
        self.drain_frames(sink, false)
    }

    fn flush(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<()> {
        self.set_headers(sink)?;
        self.drain_frames(sink, true)?;

        if !self.buffer.is_empty() {
            if let Some((_, header)) = ac3::find_header(&self.buffer) {
                warn!(
                    "{}: 丢弃末尾不完整的帧 (偏移 {}, {} / {} 字节)",
                    self.state.track().display_name(),
                    self.buffer_pos,
                    self.buffer.len(),
                    header.frame_size
                );
                self.buffer.clear();
            } else {
                let rest = self.buffer.len();
                self.skip(rest);
            }
        }

        if self.skipped_bytes > 0 {
            warn!(
                "{}: 共跳过 {} 字节无效数据",
                self.state.track().display_name(),
                self.skipped_bytes
            );
        }
        debug!(
            "{}: 打包完成, 共 {} 帧",
            self.state.track().display_name(),
            self.state.packets_emitted()
        );
        Ok(())
    }

    fn connection_params(&self) -> ConnectionParams {
        let mut params = ConnectionParams::new(self.header.codec_id());
        params.sample_rate = Some(self.header.sample_rate);
        params.channels = Some(self.header.channels);
        params.bsid = Some(self.header.bsid);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::PacketQueue;
    use remux_core::{RemuxError, Timestamp};

    /// 48kHz 立体声 AC-3 帧, 256 字节, 首个负载字节写入序号
    fn build_ac3_frame(index: u8) -> Vec<u8> {
        let mut frame = vec![0u8; 256];
        frame[0] = 0x0B;
        frame[1] = 0x77;
        frame[4] = 8;
        frame[5] = 8 << 3;
        frame[6] = 0x40;
        frame[8] = index;
        frame
    }

    /// 32kHz 立体声 AC-3 帧, 384 字节
    fn build_ac3_frame_32k(index: u8) -> Vec<u8> {
        let mut frame = vec![0u8; 384];
        frame[0] = 0x0B;
        frame[1] = 0x77;
        frame[4] = (2 << 6) | 8;
        frame[5] = 8 << 3;
        frame[6] = 0x40;
        frame[8] = index;
        frame
    }

    /// 48kHz 6 块 E-AC-3 帧, 512 字节
    fn build_eac3_frame(strmtyp: u8, index: u8) -> Vec<u8> {
        let frmsiz: u16 = 255;
        let mut frame = vec![0u8; 512];
        frame[0] = 0x0B;
        frame[1] = 0x77;
        frame[2] = (strmtyp << 6) | ((frmsiz >> 8) as u8 & 0x07);
        frame[3] = frmsiz as u8;
        frame[4] = 0b0011_0100;
        frame[5] = 16 << 3;
        frame[8] = index;
        frame
    }

    fn build_stream(count: u8) -> Vec<u8> {
        (0..count).flat_map(build_ac3_frame).collect()
    }

    fn new_packetizer(track: TrackInfo) -> Ac3Packetizer {
        let header = ac3::parse_header(&build_ac3_frame(0)).unwrap();
        Ac3Packetizer::new(Arc::new(track), header)
    }

    fn feed(packetizer: &mut Ac3Packetizer, data: &[u8], chunk: usize, sink: &mut PacketQueue) {
        let mut pos = 0u64;
        for part in data.chunks(chunk) {
            let unit = RawUnit::new(part.to_vec()).with_position(pos);
            packetizer.process(unit, sink).unwrap();
            pos += part.len() as u64;
        }
    }

    #[test]
    fn test_任意切分重组成帧() {
        let mut packetizer = new_packetizer(TrackInfo::new(0));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &build_stream(3), 100, &mut sink);
        packetizer.flush(&mut sink).unwrap();

        assert_eq!(sink.headers.len(), 1);
        assert_eq!(sink.headers[0].codec_id, CodecId::Ac3);
        assert_eq!(
            sink.headers[0].audio,
            Some(AudioHeaders {
                sample_rate: 48000,
                channels: 2
            })
        );

        assert_eq!(sink.packets.len(), 3);
        for (i, packet) in sink.packets.iter().enumerate() {
            assert_eq!(packet.size(), 256);
            assert_eq!(packet.data[8], i as u8);
            assert_eq!(packet.timestamp.ns(), i as i64 * 32_000_000);
            assert_eq!(packet.duration, Some(Timestamp::from_ms(32)));
            assert_eq!(packet.position, Some(i as u64 * 256));
        }
    }

    #[test]
    fn test_跳过帧间垃圾() {
        let mut data = vec![0xAAu8; 50];
        data.extend(build_ac3_frame(0));
        data.extend(vec![0x11u8; 30]);
        data.extend(build_ac3_frame(1));

        let mut packetizer = new_packetizer(TrackInfo::new(0));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &data, 64, &mut sink);
        packetizer.flush(&mut sink).unwrap();

        assert_eq!(sink.packets.len(), 2);
        assert_eq!(sink.packets[0].position, Some(50));
        assert_eq!(sink.packets[1].position, Some(50 + 256 + 30));
        assert_eq!(packetizer.skipped_bytes(), 80);
    }

    #[test]
    fn test_末尾不完整帧被丢弃() {
        let mut data = build_stream(2);
        data.extend_from_slice(&build_ac3_frame(2)[..100]);

        let mut packetizer = new_packetizer(TrackInfo::new(0));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &data, 4096, &mut sink);
        assert_eq!(sink.packets.len(), 2);
        packetizer.flush(&mut sink).unwrap();
        assert_eq!(sink.packets.len(), 2);
    }

    #[test]
    fn test_显式时间戳按偏移对齐() {
        let data = build_stream(3);
        let mut packetizer = new_packetizer(TrackInfo::new(0));
        let mut sink = PacketQueue::new();

        packetizer
            .process(RawUnit::new(data[..256].to_vec()).with_position(0), &mut sink)
            .unwrap();
        packetizer
            .process(
                RawUnit::new(data[256..].to_vec())
                    .with_position(256)
                    .with_timestamp(Timestamp::from_ms(1000)),
                &mut sink,
            )
            .unwrap();

        assert_eq!(
            sink.timestamps(0),
            vec![
                Timestamp::ZERO,
                Timestamp::from_ms(1000),
                Timestamp::from_ms(1032)
            ]
        );
    }

    #[test]
    fn test_强制时钟频率() {
        let mut packetizer = new_packetizer(TrackInfo::new(0).with_samples_per_second(96000));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &build_stream(2), 512, &mut sink);
        assert_eq!(sink.packets[1].timestamp, Timestamp::from_ms(16));
    }

    #[test]
    fn test_采样率变化不回溯() {
        let mut data = build_stream(2);
        data.extend(build_ac3_frame_32k(2));
        data.extend(build_ac3_frame_32k(3));

        let mut packetizer = new_packetizer(TrackInfo::new(0));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &data, 200, &mut sink);
        packetizer.flush(&mut sink).unwrap();

        let ms: Vec<i64> = sink.timestamps(0).iter().map(|ts| ts.ns() / 1_000_000).collect();
        assert_eq!(ms, [0, 32, 64, 112]);
        assert_eq!(sink.packets[3].duration, Some(Timestamp::from_ms(48)));
        assert_eq!(packetizer.connection_params().sample_rate, Some(32000));
    }

    #[test]
    fn test_强制时钟频率时忽略采样率变化() {
        let mut data = build_stream(2);
        data.extend(build_ac3_frame_32k(2));
        data.extend(build_ac3_frame_32k(3));

        let mut packetizer = new_packetizer(TrackInfo::new(0).with_samples_per_second(48000));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &data, 200, &mut sink);
        packetizer.flush(&mut sink).unwrap();

        let ms: Vec<i64> = sink.timestamps(0).iter().map(|ts| ts.ns() / 1_000_000).collect();
        assert_eq!(ms, [0, 32, 64, 96]);
    }

    #[test]
    fn test_eac3_从属子流并入主帧() {
        let data: Vec<u8> = (0..4u8)
            .flat_map(|i| [build_eac3_frame(0, i), build_eac3_frame(1, i)].concat())
            .collect();
        let header = ac3::parse_header(&data).unwrap();
        let mut packetizer = Ac3Packetizer::new(Arc::new(TrackInfo::new(0)), header);
        let mut sink = PacketQueue::new();

        feed(&mut packetizer, &data, 300, &mut sink);
        // 最后一个访问单元要等到流结束才能确定边界
        assert_eq!(sink.packets.len(), 3);
        packetizer.flush(&mut sink).unwrap();

        assert_eq!(sink.packets.len(), 4);
        let ms: Vec<i64> = sink.timestamps(0).iter().map(|ts| ts.ns() / 1_000_000).collect();
        assert_eq!(ms, [0, 32, 64, 96]);
        for (i, packet) in sink.packets.iter().enumerate() {
            assert_eq!(packet.size(), 1024);
            assert_eq!(packet.position, Some(i as u64 * 1024));
            assert_eq!(packet.data[8], i as u8);
            assert_eq!(packet.data[512 + 8], i as u8);
        }
        assert_eq!(packetizer.skipped_bytes(), 0);
    }

    #[test]
    fn test_垃圾中的伪同步字不吞掉真实帧() {
        // 伪帧头声明 640kbps, 帧长 2560 字节, 远超后面 4 个真实帧的总长
        let mut data = vec![0x0B, 0x77, 0, 0, 37, 8 << 3, 0x40, 0];
        data.extend(build_stream(4));

        let mut packetizer = new_packetizer(TrackInfo::new(0));
        let mut sink = PacketQueue::new();
        feed(&mut packetizer, &data, 100, &mut sink);
        packetizer.flush(&mut sink).unwrap();

        assert_eq!(sink.packets.len(), 4);
        for (i, packet) in sink.packets.iter().enumerate() {
            assert_eq!(packet.position, Some(8 + i as u64 * 256));
            assert_eq!(packet.data[8], i as u8);
        }
        assert_eq!(packetizer.skipped_bytes(), 8);
    }

    #[test]
    fn test_can_connect_to() {
        let a = new_packetizer(TrackInfo::new(0));
        let b = new_packetizer(TrackInfo::new(1));
        assert!(a.can_connect_to(&b).is_ok());

        let mut frame = build_ac3_frame(0);
        frame[5] = 6 << 3;
        let header = ac3::parse_header(&frame).unwrap();
        let c = Ac3Packetizer::new(Arc::new(TrackInfo::new(2)), header);
        assert!(matches!(
            a.can_connect_to(&c),
            Err(RemuxError::IncompatibleConnection { field: "bsid", .. })
        ));
    }
}
