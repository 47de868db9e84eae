//! 统计型数据包接收端.
//!
//! 演练模式下代替真正的封装器: 只记录头部与数据包统计, 不保留负载.

use remux_codec::{Packet, PacketSink, TrackHeaders};
use remux_core::RemuxResult;
use serde::Serialize;

/// 数据包统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PacketStats {
    /// 数据包总数
    pub packets: u64,
    /// 负载总字节数 (压缩后)
    pub bytes: u64,
    /// 第一个数据包的时间戳 (纳秒)
    pub first_timestamp_ns: Option<i64>,
    /// 最后一个数据包的时间戳 (纳秒)
    pub last_timestamp_ns: Option<i64>,
    /// 最晚结束时间 (纳秒)
    pub end_ns: Option<i64>,
    /// 被压缩的数据包数
    pub compressed_packets: u64,
}

impl PacketStats {
    /// 覆盖的时长 (纳秒)
    pub fn duration_ns(&self) -> Option<i64> {
        Some(self.end_ns? - self.first_timestamp_ns?)
    }
}

/// 只做统计的接收端
#[derive(Debug, Default)]
pub struct CountingSink {
    /// 收到的轨道头部
    pub headers: Vec<TrackHeaders>,
    /// 数据包统计
    pub stats: PacketStats,
}

impl PacketSink for CountingSink {
    fn set_track_headers(&mut self, headers: TrackHeaders) -> RemuxResult<()> {
        self.headers.push(headers);
        Ok(())
    }

    fn accept(&mut self, packet: Packet) -> RemuxResult<()> {
        let stats = &mut self.stats;
        stats.packets += 1;
        stats.bytes += packet.size() as u64;
        if packet.compression.is_some() {
            stats.compressed_packets += 1;
        }
        let timestamp = packet.timestamp.ns();
        stats.first_timestamp_ns.get_or_insert(timestamp);
        stats.last_timestamp_ns = Some(timestamp);
        let end = packet.end().ns();
        stats.end_ns = Some(stats.end_ns.map_or(end, |e| e.max(end)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remux_core::Timestamp;

    #[test]
    fn test_统计() {
        let mut sink = CountingSink::default();
        for i in 0..3i64 {
            let packet = Packet::new(0, vec![0u8; 10])
                .with_timestamp(Timestamp::from_ms(i * 32))
                .with_duration(Timestamp::from_ms(32));
            sink.accept(packet).unwrap();
        }
        assert_eq!(sink.stats.packets, 3);
        assert_eq!(sink.stats.bytes, 30);
        assert_eq!(sink.stats.first_timestamp_ns, Some(0));
        assert_eq!(sink.stats.last_timestamp_ns, Some(64_000_000));
        assert_eq!(sink.stats.duration_ns(), Some(96_000_000));
    }

    #[test]
    fn test_空统计() {
        let sink = CountingSink::default();
        assert_eq!(sink.stats.duration_ns(), None);
    }
}
