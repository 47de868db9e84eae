//! remux-identify - 输入格式识别工具
//!
//! 识别 AC-3 / SRT 等基本流文件, 输出识别报告; `--mux` 时驱动完整的
//! 读取器 → 打包器管线, 统计输出数据包.

mod logging;
mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use remux_codec::{CompressionKind, CompressionSetting, TrackHeaders, TrackInfo};
use remux_format::{FileStatus, FormatRegistry, IdentifyReport, IoContext, Reader};

use crate::stats::{CountingSink, PacketStats};

/// remux 输入格式识别工具
#[derive(Parser, Debug)]
#[command(name = "remux-identify", version, about = "识别基本流文件并演练重封装管线")]
struct Cli {
    /// 输入文件路径
    input: PathBuf,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 读取全部数据并统计输出数据包
    #[arg(long)]
    mux: bool,

    /// 轨道语言
    #[arg(long)]
    language: Option<String>,

    /// 文本字幕字符集 (如 windows-1252)
    #[arg(long)]
    sub_charset: Option<String>,

    /// 强制时钟频率 (每秒采样数)
    #[arg(long)]
    samples_per_second: Option<u32>,

    /// 负载压缩: none 或 zlib
    #[arg(long, value_parser = parse_compression)]
    compression: Option<CompressionSetting>,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// 日志详细程度 (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_compression(value: &str) -> Result<CompressionSetting, String> {
    match value.to_ascii_lowercase().as_str() {
        "none" => Ok(CompressionSetting::Disabled),
        "zlib" => Ok(CompressionSetting::Enabled(CompressionKind::Zlib)),
        other => Err(format!("未知压缩算法 '{other}' (可选: none, zlib)")),
    }
}

// ============================================================
// JSON 输出结构体
// ============================================================

/// 完整识别结果
#[derive(Serialize)]
struct IdentifyOutput {
    file: String,
    container: String,
    probe_score: u32,
    tracks: Vec<TrackOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mux: Option<PacketStats>,
}

/// 轨道信息
#[derive(Serialize)]
struct TrackOutput {
    id: u64,
    #[serde(rename = "type")]
    media_type: String,
    codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    codec_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
}

// ============================================================
// 主逻辑
// ============================================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_dir, "remux-identify", cli.verbose)?;

    let input = cli.input.display().to_string();
    let track = Arc::new(build_track_info(&cli, &input));

    let mut registry = FormatRegistry::new();
    remux_format::register_all(&mut registry);

    let mut io = IoContext::open_read(&cli.input)
        .with_context(|| format!("无法打开文件 '{input}'"))?;
    let probe = registry
        .probe_input(&mut io, Some(&input))
        .with_context(|| format!("无法识别文件格式 '{input}'"))?;
    info!("{input}: 格式 {} (置信度 {})", probe.format_id, probe.score);

    let mut reader = registry
        .create_reader(probe.format_id, io, Arc::clone(&track))
        .with_context(|| format!("无法解析文件头部 '{input}'"))?;
    reader.create_packetizer()?;
    let headers = reader.packetizer().map(|p| p.headers());

    let report = reader.identify();
    let mux = if cli.mux {
        Some(run_pipeline(reader.as_mut())?)
    } else {
        None
    };

    if cli.json {
        let output = build_output(&report, probe.score, headers.as_ref(), mux);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{report}");
        if let Some(headers) = &headers {
            print_headers_text(headers);
        }
        if let Some(stats) = &mux {
            print_stats_text(stats);
        }
    }
    Ok(())
}

/// 由命令行参数构造轨道配置
fn build_track_info(cli: &Cli, input: &str) -> TrackInfo {
    let mut track = TrackInfo::new(0).with_file_name(input);
    if let Some(language) = &cli.language {
        track = track.with_language(language);
    }
    if let Some(charset) = &cli.sub_charset {
        track = track.with_sub_charset(charset);
    }
    if let Some(sps) = cli.samples_per_second {
        track = track.with_samples_per_second(sps);
    }
    if let Some(compression) = cli.compression {
        track = track.with_compression(compression);
    }
    track
}

/// 反复调用 `read()` 直到读完
fn run_pipeline(reader: &mut dyn Reader) -> Result<PacketStats> {
    let mut sink = CountingSink::default();
    let mut last_progress = 0;
    while reader.read(&mut sink)? == FileStatus::MoreData {
        let progress = reader.progress();
        if progress >= last_progress + 10 {
            info!("进度 {progress}%");
            last_progress = progress;
        }
    }
    info!(
        "读取完成: {} 个数据包, {} 字节",
        sink.stats.packets, sink.stats.bytes
    );
    Ok(sink.stats)
}

fn build_output(
    report: &IdentifyReport,
    probe_score: u32,
    headers: Option<&TrackHeaders>,
    mux: Option<PacketStats>,
) -> IdentifyOutput {
    let tracks = report
        .tracks
        .iter()
        .map(|track| {
            let headers = headers.filter(|h| h.track_id == track.id);
            TrackOutput {
                id: track.id,
                media_type: track.media_type.to_string(),
                codec: track.codec.clone(),
                codec_id: headers.map(|h| h.codec_id.container_codec_id().to_string()),
                language: headers.and_then(|h| h.language.clone()),
                sample_rate: headers.and_then(|h| h.audio).map(|a| a.sample_rate),
                channels: headers.and_then(|h| h.audio).map(|a| a.channels),
                compression: headers.and_then(|h| h.compression).map(|c| c.to_string()),
            }
        })
        .collect();

    IdentifyOutput {
        file: report.file_name.clone(),
        container: report.container.clone(),
        probe_score,
        tracks,
        mux,
    }
}

/// 文本输出: 轨道头部
fn print_headers_text(headers: &TrackHeaders) {
    println!("[TRACK #{}]", headers.track_id);
    println!("  编解码器     : {} ({})", headers.codec_id, headers.codec_id.container_codec_id());
    if let Some(language) = &headers.language {
        println!("  语言         : {language}");
    }
    if let Some(audio) = headers.audio {
        println!("  采样率       : {} Hz", audio.sample_rate);
        println!("  声道数       : {}", audio.channels);
    }
    if let Some(duration) = headers.default_duration {
        println!("  帧时长       : {} ns", duration.ns());
    }
    if let Some(compression) = headers.compression {
        println!("  压缩         : {compression}");
    }
    println!("[/TRACK]");
}

/// 文本输出: 数据包统计
fn print_stats_text(stats: &PacketStats) {
    println!("[PACKETS]");
    println!("  数据包总数   : {}", stats.packets);
    println!(
        "  数据总量     : {} 字节 ({:.2} KB)",
        stats.bytes,
        stats.bytes as f64 / 1024.0
    );
    if let (Some(first), Some(last)) = (stats.first_timestamp_ns, stats.last_timestamp_ns) {
        println!("  首个时间戳   : {first} ns");
        println!("  最后时间戳   : {last} ns");
    }
    if let Some(duration) = stats.duration_ns() {
        println!("  时长         : {:.3} 秒", duration as f64 / 1e9);
    }
    println!("[/PACKETS]");
}
