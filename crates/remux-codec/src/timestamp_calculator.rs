//! 时间戳计算器.
//!
//! 许多基本流音频格式 (AC-3, DTS, MPEG 音频等) 不携带时间戳, 只能依据累计采样数与固定时钟频率重建时间轴.
//! 外层容器偶尔会提供显式时间戳, 这些时间戳按到达顺序排队, 优先于推导值使用,
//! 并可通过字节流偏移精确对齐到它所属的那一帧; 两个显式时间戳之间的空隙仍由采样数连续推导.

use std::collections::VecDeque;

use log::{debug, trace};
use remux_core::{RemuxError, RemuxResult, Timestamp};

use crate::packet::Packet;

/// 每条轨道一个的时间戳计算器
#[derive(Debug, Clone)]
pub struct TimestampCalculator {
    /// 待消费的显式时间戳 (FIFO), 附带可选的字节流偏移
    available: VecDeque<(Timestamp, Option<u64>)>,
    /// 推导的参考点
    reference: Timestamp,
    /// 最近一次返回的时间戳
    last_returned: Option<Timestamp>,
    /// 自参考点以来已分配的采样数
    samples_since_reference: i64,
    /// 时钟频率 (每秒采样数)
    samples_per_second: u32,
}

impl TimestampCalculator {
    /// 以指定时钟频率创建, 参考点为 0
    pub fn new(samples_per_second: u32) -> Self {
        Self {
            available: VecDeque::new(),
            reference: Timestamp::ZERO,
            last_returned: None,
            samples_since_reference: 0,
            samples_per_second,
        }
    }

    /// 当前时钟频率
    pub fn samples_per_second(&self) -> u32 {
        self.samples_per_second
    }

    /// 待消费的显式时间戳个数
    pub fn pending(&self) -> usize {
        self.available.len()
    }

    /// 加入一个显式时间戳
    ///
    /// 不晚于队尾或最近一次返回值的时间戳会被丢弃, 参考点只向前移动.
    pub fn add_timestamp(&mut self, timestamp: Timestamp, stream_position: Option<u64>) {
        let floor = self
            .available
            .back()
            .map(|(queued, _)| *queued)
            .max(self.last_returned);
        if let Some(floor) = floor.filter(|floor| timestamp <= *floor) {
            debug!("丢弃乱序的显式时间戳 {timestamp} (不晚于 {floor})");
            return;
        }
        trace!("加入显式时间戳 {timestamp}, 偏移 {stream_position:?}");
        self.available.push_back((timestamp, stream_position));
    }

    /// 以纳秒整数加入显式时间戳, 负值视为无效并忽略
    pub fn add_timestamp_ns(&mut self, timestamp_ns: i64, stream_position: Option<u64>) {
        if timestamp_ns < 0 {
            return;
        }
        self.add_timestamp(Timestamp::from_ns(timestamp_ns), stream_position);
    }

    /// 以已有数据包的时间戳加入
    pub fn add_packet_timestamp(&mut self, packet: &Packet, stream_position: Option<u64>) {
        self.add_timestamp(packet.timestamp, stream_position);
    }

    /// 获取下一帧的时间戳
    ///
    /// 队列非空且队首没有偏移、或未提供偏移、或队首偏移不晚于 `stream_position` 时, 取出队首作为新的参考点;
    /// 否则按 `参考点 + 自参考点以来的采样数` 推导.
    pub fn get_next_timestamp(
        &mut self,
        samples_in_frame: u32,
        stream_position: Option<u64>,
    ) -> RemuxResult<Timestamp> {
        let use_explicit = match (self.available.front(), stream_position) {
            (None, _) => false,
            (Some(_), None) | (Some((_, None)), Some(_)) => true,
            (Some((_, Some(queued))), Some(position)) => *queued <= position,
        };

        if use_explicit {
            if let Some((timestamp, _)) = self.available.pop_front() {
                self.reference = timestamp;
                self.samples_since_reference = i64::from(samples_in_frame);
                self.last_returned = Some(timestamp);
                return Ok(timestamp);
            }
        }

        let timestamp = self.reference + self.samples_to_duration(self.samples_since_reference)?;
        self.samples_since_reference += i64::from(samples_in_frame);
        self.last_returned = Some(timestamp);
        Ok(timestamp)
    }

    /// 指定采样数对应的时长
    pub fn get_duration(&self, samples: u32) -> RemuxResult<Timestamp> {
        self.samples_to_duration(i64::from(samples))
    }

    /// 修改时钟频率, 只影响之后的推导
    ///
    /// 已分配的采样按旧频率折算进参考点.
    pub fn set_samples_per_second(&mut self, samples_per_second: u32) -> RemuxResult<()> {
        if samples_per_second == self.samples_per_second {
            return Ok(());
        }
        if self.samples_since_reference != 0 {
            self.reference += self.samples_to_duration(self.samples_since_reference)?;
            self.samples_since_reference = 0;
        }
        self.samples_per_second = samples_per_second;
        Ok(())
    }

    fn samples_to_duration(&self, samples: i64) -> RemuxResult<Timestamp> {
        Timestamp::from_samples(samples, self.samples_per_second).ok_or_else(|| {
            RemuxError::InvalidArgument("时钟频率为 0, 无法由采样数推导时间戳".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_纯推导_单调且精确() {
        let mut calc = TimestampCalculator::new(44100);
        let mut cumulative: i64 = 0;
        let mut previous = Timestamp::from_ns(-1);
        for i in 0..500u32 {
            let samples = 1000 + (i % 7) * 100;
            let ts = calc.get_next_timestamp(samples, None).unwrap();
            let expected = Timestamp::from_samples(cumulative, 44100).unwrap();
            assert_eq!(ts, expected, "第 {i} 帧");
            assert!(ts >= previous);
            previous = ts;
            cumulative += i64::from(samples);
        }
    }

    #[test]
    fn test_时长推导() {
        let calc = TimestampCalculator::new(48000);
        assert_eq!(calc.get_duration(48000).unwrap().ns(), 1_000_000_000);
        assert_eq!(calc.get_duration(1536).unwrap().ns(), 32_000_000);
    }

    #[test]
    fn test_显式时间戳优先() {
        let mut calc = TimestampCalculator::new(48000);
        assert_eq!(calc.get_next_timestamp(1536, Some(0)).unwrap().ns(), 0);

        calc.add_timestamp(Timestamp::from_ms(500), Some(1792));
        // 队首偏移晚于当前帧, 继续推导
        assert_eq!(calc.get_next_timestamp(1536, Some(896)).unwrap().ns(), 32_000_000);
        assert_eq!(calc.pending(), 1);

        // 偏移匹配, 返回显式值
        assert_eq!(
            calc.get_next_timestamp(1536, Some(1792)).unwrap(),
            Timestamp::from_ms(500)
        );
        assert_eq!(calc.pending(), 0);

        // 之后从显式值继续累计采样
        assert_eq!(calc.get_next_timestamp(1536, Some(2688)).unwrap().ns(), 532_000_000);
        assert_eq!(calc.get_next_timestamp(1536, Some(3584)).unwrap().ns(), 564_000_000);
    }

    #[test]
    fn test_显式时间戳_无偏移() {
        let mut calc = TimestampCalculator::new(1000);
        calc.add_timestamp_ns(7_000_000, None);
        calc.add_timestamp_ns(-5, None);
        assert_eq!(calc.pending(), 1);

        // 队首无偏移时, 即使调用方提供了偏移也直接使用
        assert_eq!(calc.get_next_timestamp(10, Some(100)).unwrap().ns(), 7_000_000);
        assert_eq!(calc.get_next_timestamp(10, None).unwrap().ns(), 17_000_000);
    }

    #[test]
    fn test_显式时间戳_先进先出() {
        let mut calc = TimestampCalculator::new(1000);
        let packet = Packet::new(0, vec![0u8]).with_timestamp(Timestamp::from_ms(40));
        calc.add_timestamp(Timestamp::from_ms(20), None);
        calc.add_packet_timestamp(&packet, None);
        assert_eq!(calc.get_next_timestamp(1, None).unwrap(), Timestamp::from_ms(20));
        assert_eq!(calc.get_next_timestamp(1, None).unwrap(), Timestamp::from_ms(40));
        assert_eq!(calc.get_next_timestamp(1, None).unwrap(), Timestamp::from_ms(41));
    }

    #[test]
    fn test_早于已返回值的显式时间戳被丢弃() {
        let mut calc = TimestampCalculator::new(1000);
        calc.add_timestamp(Timestamp::from_ms(100), None);
        assert_eq!(calc.get_next_timestamp(10, None).unwrap(), Timestamp::from_ms(100));
        assert_eq!(calc.get_next_timestamp(10, None).unwrap(), Timestamp::from_ms(110));

        calc.add_timestamp(Timestamp::from_ms(50), None);
        calc.add_timestamp(Timestamp::from_ms(110), None);
        assert_eq!(calc.pending(), 0);
        assert_eq!(calc.get_next_timestamp(10, None).unwrap(), Timestamp::from_ms(120));
        assert_eq!(calc.get_next_timestamp(10, None).unwrap(), Timestamp::from_ms(130));
    }

    #[test]
    fn test_不晚于队尾的显式时间戳被丢弃() {
        let mut calc = TimestampCalculator::new(1000);
        calc.add_timestamp(Timestamp::from_ms(200), None);
        calc.add_timestamp(Timestamp::from_ms(150), None);
        calc.add_timestamp(Timestamp::from_ms(200), None);
        calc.add_timestamp(Timestamp::from_ms(300), None);
        assert_eq!(calc.pending(), 2);
        assert_eq!(calc.get_next_timestamp(1, None).unwrap(), Timestamp::from_ms(200));
        assert_eq!(calc.get_next_timestamp(1, None).unwrap(), Timestamp::from_ms(300));
    }

    #[test]
    fn test_修改时钟频率不回溯() {
        let mut calc = TimestampCalculator::new(1000);
        calc.get_next_timestamp(500, None).unwrap();
        calc.get_next_timestamp(500, None).unwrap();
        // 已分配 1000 采样 = 1s
        calc.set_samples_per_second(2000).unwrap();
        assert_eq!(calc.get_next_timestamp(1000, None).unwrap(), Timestamp::from_ms(1000));
        assert_eq!(calc.get_next_timestamp(1000, None).unwrap(), Timestamp::from_ms(1500));
        assert_eq!(calc.get_duration(2000).unwrap(), Timestamp::from_ms(1000));
    }

    #[test]
    fn test_零时钟频率() {
        let mut calc = TimestampCalculator::new(0);
        assert!(matches!(
            calc.get_next_timestamp(1536, None),
            Err(RemuxError::InvalidArgument(_))
        ));
        assert!(calc.get_duration(1).is_err());

        // 显式时间戳不依赖时钟频率
        calc.add_timestamp(Timestamp::from_ms(1), None);
        assert_eq!(calc.get_next_timestamp(1536, None).unwrap(), Timestamp::from_ms(1));
    }
}
