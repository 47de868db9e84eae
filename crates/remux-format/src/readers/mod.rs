//! 读取器实现.
//!
//! 每个读取器模块同时提供对应格式的探测器.

pub mod ac3;
pub mod srt;

use crate::format_id::FormatId;
use crate::registry::FormatRegistry;

/// 注册所有内置读取器和探测器
pub fn register_all_readers(registry: &mut FormatRegistry) {
    registry.register_reader(FormatId::Ac3, "ac3", ac3::Ac3Reader::create);
    registry.register_probe(Box::new(ac3::Ac3Probe::default()));

    registry.register_reader(FormatId::Srt, "srt", srt::SrtReader::create);
    registry.register_probe(Box::new(srt::SrtProbe));
}
