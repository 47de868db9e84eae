//! 格式探测.
//!
//! 探测器只看字节源开头的一个窗口. 结构不符、数据不足或 I/O 出错都只表示
//! "不是此格式", 不会作为错误向上传播.

use crate::format_id::FormatId;
use crate::io::IoContext;

/// 探测置信度, 越高越可信
pub type ProbeScore = u32;

/// 码流结构完全匹配时的分数
pub const SCORE_MAX: ProbeScore = 100;

/// 注册表的探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// 命中的格式
    pub format_id: FormatId,
    /// 该格式探测器给出的分数
    pub score: ProbeScore,
}

/// 格式探测器
///
/// 实现必须在返回前把 `io` 恢复到起始位置, 使多个探测器可以依次运行,
/// 且重复探测得到相同结果.
pub trait FormatProbe {
    /// 判断字节源是否为本格式, `filename` 仅供参考
    fn probe(&self, io: &mut IoContext, filename: Option<&str>) -> Option<ProbeScore>;

    /// 对应的格式
    fn format_id(&self) -> FormatId;
}
