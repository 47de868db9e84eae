//! 时间戳类型, 用于表示媒体流中的时间点与时长.
//!
//! 与基于 `time_base` 的时间戳不同, remux 内部统一使用纳秒精度的有符号整数,
//! 采样数与时间之间的换算通过 [`Timestamp::from_samples`] 完成.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// 每秒纳秒数
pub const NS_PER_SECOND: i64 = 1_000_000_000;

/// 每毫秒纳秒数
pub const NS_PER_MILLI: i64 = 1_000_000;

/// 纳秒时间戳 (也用于表示时长)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 零点
    pub const ZERO: Self = Self(0);

    /// 从纳秒创建
    pub const fn from_ns(ns: i64) -> Self {
        Self(ns)
    }

    /// 从毫秒创建
    pub const fn from_ms(ms: i64) -> Self {
        Self(ms * NS_PER_MILLI)
    }

    /// 由采样数和时钟频率换算, 结果四舍五入到最近的纳秒
    ///
    /// 时钟频率为 0 时无法换算, 返回 `None`.
    ///
    /// # 示例
    /// ```
    /// use remux_core::Timestamp;
    ///
    /// assert_eq!(Timestamp::from_samples(48000, 48000).unwrap().ns(), 1_000_000_000);
    /// assert_eq!(Timestamp::from_samples(1, 3).unwrap().ns(), 333_333_333);
    /// assert!(Timestamp::from_samples(1, 0).is_none());
    /// ```
    pub fn from_samples(samples: i64, samples_per_second: u32) -> Option<Self> {
        if samples_per_second == 0 {
            return None;
        }
        let num = i128::from(samples) * i128::from(NS_PER_SECOND);
        let den = i128::from(samples_per_second);
        let half = den / 2;
        let rounded = if num >= 0 {
            (num + half) / den
        } else {
            (num - half) / den
        };
        Some(Self(rounded as i64))
    }

    /// 纳秒值
    pub const fn ns(self) -> i64 {
        self.0
    }

    /// 毫秒值 (截断)
    pub const fn ms(self) -> i64 {
        self.0 / NS_PER_MILLI
    }

    /// 转换为秒 (f64)
    pub fn to_seconds(self) -> f64 {
        self.0 as f64 / NS_PER_SECOND as f64
    }

    /// 两个时间点之差, 负值截断为零
    pub fn saturating_duration_since(self, earlier: Self) -> Self {
        Self((self.0 - earlier.0).max(0))
    }
}

impl Add for Timestamp {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Timestamp {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl From<i64> for Timestamp {
    fn from(ns: i64) -> Self {
        Self(ns)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    /// 格式: `HH:MM:SS.nnnnnnnnn`, 负值带前导 `-`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let ns_per_second = NS_PER_SECOND as u64;
        let secs = abs / ns_per_second;
        write!(
            f,
            "{sign}{:02}:{:02}:{:02}.{:09}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            abs % ns_per_second
        )
    }
}
