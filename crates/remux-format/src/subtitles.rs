//! 已带时间的字幕条目集合.

use remux_core::Timestamp;

/// 一条字幕
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// 开始时间
    pub start: Timestamp,
    /// 结束时间
    pub end: Timestamp,
    /// 文本, 多行以 `\n` 分隔
    pub text: String,
}

impl SubtitleEntry {
    /// 时长, 结束早于开始时为负
    pub fn duration(&self) -> Timestamp {
        self.end - self.start
    }
}

/// 按开始时间排序的字幕队列, 记录已处理位置
#[derive(Debug, Clone, Default)]
pub struct SubtitleQueue {
    entries: Vec<SubtitleEntry>,
    processed: usize,
}

impl SubtitleQueue {
    /// 创建队列, 按开始时间稳定排序
    pub fn new(mut entries: Vec<SubtitleEntry>) -> Self {
        entries.sort_by_key(|entry| entry.start);
        Self {
            entries,
            processed: 0,
        }
    }

    /// 取出下一条字幕
    pub fn next_entry(&mut self) -> Option<&SubtitleEntry> {
        let entry = self.entries.get(self.processed)?;
        self.processed += 1;
        Some(entry)
    }

    /// 条目总数
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// 已处理的条目数
    pub fn num_processed(&self) -> usize {
        self.processed
    }

    /// 是否已全部处理
    pub fn is_empty(&self) -> bool {
        self.processed >= self.entries.len()
    }

    /// 全部条目 (已排序)
    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }
}
