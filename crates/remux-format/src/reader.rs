//! 读取器 (Reader) trait 定义.
//!
//! 读取器独占一个字节源, 从中提取原始单元并交给自己创建的打包器.

use std::fmt;

use remux_codec::{PacketSink, Packetizer};
use remux_core::{MediaType, RemuxResult};

use crate::format_id::FormatId;

/// `read()` 的返回状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// 还有数据, 应继续调用 `read()`
    MoreData,
    /// 已读完, 打包器已刷新
    Done,
}

/// 读取器 trait
///
/// 每种输入格式一个实现. 构造时完成头部校验 (失败返回 `MalformedHeader`),
/// 之后由外部控制器反复拉取.
///
/// 使用流程:
/// 1. 调用 `create_packetizer()` 创建打包器 (可重复调用, 只创建一次)
/// 2. 循环调用 `read()` 直到返回 [`FileStatus::Done`]
/// 3. 随时可调用 `progress()` 获取进度
pub trait Reader: Send {
    /// 获取格式标识
    fn format_id(&self) -> FormatId;

    /// 创建打包器, 已创建时为空操作
    fn create_packetizer(&mut self) -> RemuxResult<()>;

    /// 已创建的打包器
    fn packetizer(&self) -> Option<&dyn Packetizer>;

    /// 读取下一批数据并交给打包器
    ///
    /// 打包器尚未创建时自动创建.
    fn read(&mut self, sink: &mut dyn PacketSink) -> RemuxResult<FileStatus>;

    /// 处理进度 (0..=100)
    fn progress(&self) -> u8;

    /// 识别报告
    fn identify(&self) -> IdentifyReport;
}

/// 按已处理量与总量计算百分比, 总量为 0 时视为已完成
pub(crate) fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (u128::from(done) * 100 / u128::from(total)).min(100) as u8
}

/// 识别出的一条轨道
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedTrack {
    /// 轨道 ID
    pub id: u64,
    /// 媒体类型
    pub media_type: MediaType,
    /// 格式名 (如 "AC3", "SRT")
    pub codec: String,
}

/// 识别报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyReport {
    /// 文件名
    pub file_name: String,
    /// 容器类型
    pub container: String,
    /// 轨道列表
    pub tracks: Vec<IdentifiedTrack>,
}

impl fmt::Display for IdentifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File '{}': container: {}",
            self.file_name, self.container
        )?;
        for track in &self.tracks {
            write!(
                f,
                "\nTrack ID {}: {} ({})",
                track.id, track.media_type, track.codec
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_边界() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(20, 10), 100);
        assert_eq!(percent(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_识别报告格式() {
        let report = IdentifyReport {
            file_name: "a.srt".into(),
            container: "SRT".into(),
            tracks: vec![IdentifiedTrack {
                id: 0,
                media_type: MediaType::Subtitle,
                codec: "SRT".into(),
            }],
        };
        assert_eq!(
            report.to_string(),
            "File 'a.srt': container: SRT\nTrack ID 0: subtitles (SRT)"
        );
    }
}
