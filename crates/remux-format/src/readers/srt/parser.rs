//! SRT 文档解析 (逐行状态机).
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,500
//! 第一行文本
//! 第二行文本
//!
//! 2
//! ...
//! ```
//!
//! 解析是纯函数: 结构性错误不会中止调用方, 而是停止解析并保留此前得到的条目,
//! 连同行号一起记录为诊断信息.

use std::fmt;

use remux_core::Timestamp;

use crate::subtitles::SubtitleEntry;

/// 时间码行最短长度: `HH:MM:SS,mmm --> HH:MM:SS,mmm`
pub const TIMECODE_LINE_LEN: usize = 29;

/// 解析结果
#[derive(Debug, Clone, Default)]
pub struct SrtDocument {
    /// 按开始时间稳定排序的条目
    pub entries: Vec<SubtitleEntry>,
    /// 诊断信息, 按行号顺序
    pub diagnostics: Vec<SrtDiagnostic>,
}

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtDiagnosticKind {
    /// 期望序号行, 实际为文本 (解析停止)
    ExpectedNumber,
    /// 期望时间码行, 实际为其他内容 (解析停止)
    ExpectedTimecode,
    /// 开始时间早于前一条目, 条目将按开始时间重新排序
    StartBeforePrevious,
}

/// 一条诊断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrtDiagnostic {
    /// 行号 (从 1 开始)
    pub line: usize,
    /// 类别
    pub kind: SrtDiagnosticKind,
}

impl SrtDiagnostic {
    /// 是否导致解析提前停止
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind, SrtDiagnosticKind::StartBeforePrevious)
    }
}

impl fmt::Display for SrtDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.kind {
            SrtDiagnosticKind::ExpectedNumber => "期望字幕序号, 实际为文本",
            SrtDiagnosticKind::ExpectedTimecode => "期望 SRT 时间码行, 停止解析此文件",
            SrtDiagnosticKind::StartBeforePrevious => {
                "开始时间早于前一条目, 所有条目将按开始时间排序"
            }
        };
        write!(f, "第 {} 行: {}", self.line, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    ExpectTime,
    InSubtitleText,
    SubtitleOrNumber,
}

/// 是否全部由数字组成 (序号行)
pub fn is_number_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

fn digits(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_digit)
}

/// `HH:MM:SS,mmm`
fn is_timecode(b: &[u8]) -> bool {
    b.len() >= 12
        && digits(&b[0..2])
        && b[2] == b':'
        && digits(&b[3..5])
        && b[5] == b':'
        && digits(&b[6..8])
        && b[8] == b','
        && digits(&b[9..12])
}

fn number(bytes: &[u8]) -> i64 {
    bytes
        .iter()
        .fold(0, |acc, b| acc * 10 + i64::from(b - b'0'))
}

fn timecode_value(b: &[u8]) -> Timestamp {
    let ms = number(&b[0..2]) * 3_600_000
        + number(&b[3..5]) * 60_000
        + number(&b[6..8]) * 1000
        + number(&b[9..12]);
    Timestamp::from_ms(ms)
}

/// 解析时间码行, 返回 (开始, 结束)
///
/// 只检查固定位置上的字符, 第 29 个字符之后的内容 (如显示坐标) 忽略.
pub fn parse_timecode_line(line: &str) -> Option<(Timestamp, Timestamp)> {
    let b = line.as_bytes();
    if b.len() < TIMECODE_LINE_LEN
        || !is_timecode(b)
        || &b[12..17] != b" --> "
        || !is_timecode(&b[17..])
    {
        return None;
    }
    Some((timecode_value(&b[..12]), timecode_value(&b[17..29])))
}

/// 解析 SRT 文本
pub fn parse_srt(text: &str) -> SrtDocument {
    let mut document = SrtDocument::default();
    let mut state = State::Initial;
    let mut start = Timestamp::ZERO;
    let mut end = Timestamp::ZERO;
    let mut previous_start = Timestamp::ZERO;
    let mut order_warned = false;
    let mut pending: Vec<String> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            if matches!(state, State::Initial | State::ExpectTime) {
                continue;
            }
            state = State::SubtitleOrNumber;
            pending.push(String::new());
            continue;
        }

        match state {
            State::Initial => {
                if !is_number_line(line) {
                    document.diagnostics.push(SrtDiagnostic {
                        line: line_number,
                        kind: SrtDiagnosticKind::ExpectedNumber,
                    });
                    break;
                }
                state = State::ExpectTime;
            }
            State::ExpectTime => {
                let Some((new_start, new_end)) = parse_timecode_line(line) else {
                    document.diagnostics.push(SrtDiagnostic {
                        line: line_number,
                        kind: SrtDiagnosticKind::ExpectedTimecode,
                    });
                    break;
                };

                push_pending(&mut document.entries, start, end, &mut pending);

                if !order_warned && new_start < previous_start {
                    document.diagnostics.push(SrtDiagnostic {
                        line: line_number,
                        kind: SrtDiagnosticKind::StartBeforePrevious,
                    });
                    order_warned = true;
                }
                previous_start = new_start;
                start = new_start;
                end = new_end;
                state = State::InSubtitleText;
            }
            State::InSubtitleText => pending.push(line.to_string()),
            State::SubtitleOrNumber => {
                if is_number_line(line) {
                    state = State::ExpectTime;
                } else {
                    pending.push(line.to_string());
                }
            }
        }
    }

    push_pending(&mut document.entries, start, end, &mut pending);
    document.entries.sort_by_key(|entry| entry.start);
    document
}

fn push_pending(
    entries: &mut Vec<SubtitleEntry>,
    start: Timestamp,
    end: Timestamp,
    pending: &mut Vec<String>,
) {
    let joined = pending.join("\n");
    pending.clear();
    let text = joined.trim();
    if text.is_empty() {
        return;
    }
    entries.push(SubtitleEntry {
        start,
        end,
        text: text.to_string(),
    });
}
