//! 日志初始化.
//!
//! 库 crate 通过 `log` 门面记录, 经 tracing-log 桥接后由这里安装的两个输出层处理:
//! - 终端: stderr (stdout 留给识别报告), 彩色, 默认 warn
//! - 文件: `{dir}/{prefix}.{date}.log`, 按天滚动, 默认 info, `REMUX_LOG` 可覆盖

use std::fmt::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// 文件日志过滤器环境变量
pub const LOG_ENV: &str = "REMUX_LOG";

/// 后台写线程的守卫, 进程退出前必须存活
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// 按 `-v` 次数得到 (终端, 文件) 级别
fn levels(verbosity: u8) -> (&'static str, &'static str) {
    match verbosity {
        0 => ("warn", "info"),
        1 => ("info", "debug"),
        _ => ("debug", "trace"),
    }
}

/// 安装全局日志订阅者
pub fn init(directory: &Path, file_prefix: &str, verbosity: u8) -> Result<()> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("创建日志目录 {} 失败", directory.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build(directory)
        .context("创建日志文件失败")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let (console_level, file_level) = levels(verbosity);
    let file_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(file_level));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(LineFormat { ansi: true })
        .with_filter(EnvFilter::new(console_level));
    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .event_format(LineFormat { ansi: false })
        .with_filter(file_filter);

    Registry::default()
        .with(console)
        .with(file)
        .try_init()
        .context("日志系统已初始化")
}

/// 单行格式: `[MM-DD HH:MM:SS.mmm] LEVEL > 消息`
struct LineFormat {
    ansi: bool,
}

impl LineFormat {
    fn level_color(level: Level) -> &'static str {
        match level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let level = *event.metadata().level();
        let mut prefix = Local::now().format("[%m-%d %H:%M:%S%.3f] ").to_string();
        if self.ansi {
            let _ = write!(prefix, "{}{level:5}\x1b[0m > ", Self::level_color(level));
        } else {
            let _ = write!(prefix, "{level:5} > ");
        }
        writer.write_str(&prefix)?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
