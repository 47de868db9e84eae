//! 输入格式注册表.
//!
//! 管理所有已注册的读取器与探测器, 支持按格式标识创建读取器和自动探测.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use remux_codec::TrackInfo;
use remux_core::{RemuxError, RemuxResult};

use crate::format_id::FormatId;
use crate::io::IoContext;
use crate::probe::{FormatProbe, ProbeResult};
use crate::reader::Reader;

/// 读取器工厂函数类型
pub type ReaderFactory = fn(IoContext, Arc<TrackInfo>) -> RemuxResult<Box<dyn Reader>>;

/// 输入格式注册表
pub struct FormatRegistry {
    /// 读取器工厂映射
    readers: HashMap<FormatId, ReaderEntry>,
    /// 格式探测器列表, 按注册顺序
    probes: Vec<Box<dyn FormatProbe + Send + Sync>>,
}

/// 读取器注册条目
struct ReaderEntry {
    /// 格式名称
    name: String,
    /// 工厂函数
    factory: ReaderFactory,
}

impl FormatRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            readers: HashMap::new(),
            probes: Vec::new(),
        }
    }

    /// 注册一个读取器
    pub fn register_reader(
        &mut self,
        format_id: FormatId,
        name: impl Into<String>,
        factory: ReaderFactory,
    ) {
        self.readers.insert(
            format_id,
            ReaderEntry {
                name: name.into(),
                factory,
            },
        );
    }

    /// 注册一个格式探测器
    pub fn register_probe(&mut self, probe: Box<dyn FormatProbe + Send + Sync>) {
        self.probes.push(probe);
    }

    /// 创建指定格式的读取器
    pub fn create_reader(
        &self,
        format_id: FormatId,
        io: IoContext,
        track: Arc<TrackInfo>,
    ) -> RemuxResult<Box<dyn Reader>> {
        let entry = self.readers.get(&format_id).ok_or_else(|| {
            RemuxError::FormatNotFound(format!("未找到 {format_id} 的读取器"))
        })?;
        (entry.factory)(io, track)
    }

    /// 探测字节源的格式
    ///
    /// 依次运行所有探测器, 返回置信度最高的结果; 分数相同时先注册的优先.
    pub fn probe(&self, io: &mut IoContext, filename: Option<&str>) -> Option<ProbeResult> {
        let mut best: Option<ProbeResult> = None;
        for probe in &self.probes {
            if let Some(score) = probe.probe(io, filename) {
                debug!("探测器 {} 命中, 分数 {score}", probe.format_id());
                let is_better = best.as_ref().is_none_or(|b| score > b.score);
                if is_better {
                    best = Some(ProbeResult {
                        format_id: probe.format_id(),
                        score,
                    });
                }
            }
        }
        best
    }

    /// 获取所有已注册的读取器名称
    pub fn list_readers(&self) -> Vec<(FormatId, &str)> {
        let mut list: Vec<_> = self
            .readers
            .iter()
            .map(|(id, entry)| (*id, entry.name.as_str()))
            .collect();
        list.sort_by_key(|(_, name)| *name);
        list
    }

    /// 探测输入格式 (不创建读取器)
    ///
    /// 探测结束后字节源位于起始位置.
    pub fn probe_input(
        &self,
        io: &mut IoContext,
        filename: Option<&str>,
    ) -> RemuxResult<ProbeResult> {
        let result = self.probe(io, filename);
        io.rewind()?;
        result.ok_or_else(|| RemuxError::FormatNotFound("无法识别输入文件格式".to_string()))
    }

    /// 自动探测格式并创建读取器
    pub fn open_input(
        &self,
        mut io: IoContext,
        track: Arc<TrackInfo>,
    ) -> RemuxResult<Box<dyn Reader>> {
        let filename = track
            .file_name
            .clone()
            .or_else(|| io.name().map(str::to_string));
        let result = self.probe_input(&mut io, filename.as_deref())?;
        debug!("识别为 {} (分数 {})", result.format_id, result.score);
        self.create_reader(result.format_id, io, track)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
