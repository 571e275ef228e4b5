//! 日志系统.
//!
//! 基于 tracing 的双通道输出: 控制台 (带颜色) + 按日期滚动的文件.
//! 文件滚动折叠在写入器内部 (写入时发现日期变化即切换文件),
//! 历史文件由后台维护任务按保留期清理并 gzip 压缩.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 文件输出过滤级别 (EnvFilter 语法, 如 "info" 或 "yuan_source=debug")
    pub level: String,
    /// 日志目录
    pub directory: String,
    /// 文件名前缀
    pub prefix: String,
    /// 历史日志保留天数
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// 是否 gzip 压缩历史日志
    #[serde(default = "default_compress")]
    pub compress: bool,
    /// 维护任务执行间隔 (秒)
    #[serde(default = "default_maintenance_secs")]
    pub maintenance_interval_secs: u64,
}

fn default_retention_days() -> i64 {
    14
}

fn default_compress() -> bool {
    true
}

fn default_maintenance_secs() -> u64 {
    1800
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 初始化全局日志系统
///
/// 进程内只能初始化一次 (tracing 全局订阅器的限制).
/// 需要在 tokio 运行时内调用, 以便启动后台维护任务.
pub fn init(config: LoggingConfig) -> Result<()> {
    fs::create_dir_all(&config.directory)
        .with_context(|| format!("创建日志目录失败: {}", config.directory))?;

    let writer = DailyFileWriter::open(Path::new(&config.directory), &config.prefix)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(LineFormat { ansi: true })
        .with_filter(EnvFilter::new("debug"));

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(LineFormat { ansi: false })
        .with_filter(EnvFilter::new(&config.level));

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .init();

    tokio::spawn(maintenance_loop(config));
    Ok(())
}

/// 后台维护: 周期性清理过期日志并压缩历史日志
async fn maintenance_loop(config: LoggingConfig) {
    let mut interval = tokio::time::interval(Duration::from_secs(
        config.maintenance_interval_secs.max(1),
    ));
    loop {
        interval.tick().await;
        if let Err(err) = sweep_logs(&config) {
            tracing::error!("日志维护失败: {err:#}");
        }
    }
}

/// 按日期滚动的追加写入器
///
/// 每次写入前检查本地日期, 跨天时切换到新文件.
struct DailyFileWriter {
    directory: PathBuf,
    prefix: String,
    date: NaiveDate,
    file: File,
}

impl DailyFileWriter {
    fn open(directory: &Path, prefix: &str) -> Result<Self> {
        let date = Local::now().date_naive();
        let file = open_append(&log_file_path(directory, prefix, date))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            date,
            file,
        })
    }

    fn roll_if_needed(&mut self) -> std::io::Result<()> {
        let today = Local::now().date_naive();
        if today != self.date {
            let path = log_file_path(&self.directory, &self.prefix, today);
            self.file = open_append(&path).map_err(std::io::Error::other)?;
            self.date = today;
        }
        Ok(())
    }
}

impl Write for DailyFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.roll_if_needed()?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败: {}", path.display()))
}

/// 日志文件路径: `<dir>/<prefix>.<yyyy-mm-dd>.log`
fn log_file_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{prefix}.{}.log", date.format("%Y-%m-%d")))
}

/// 解析日志文件名中的日期, 返回 (日期, 是否已压缩)
fn parse_log_date(file_name: &str, prefix: &str) -> Option<(NaiveDate, bool)> {
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('.')?;
    let (date_part, compressed) = match rest.strip_suffix(".log") {
        Some(d) => (d, false),
        None => (rest.strip_suffix(".log.gz")?, true),
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| (d, compressed))
}

/// 清理过期日志, 压缩今天之前的未压缩日志
fn sweep_logs(config: &LoggingConfig) -> Result<()> {
    let directory = Path::new(&config.directory);
    if !directory.exists() {
        return Ok(());
    }

    let today = Local::now().date_naive();
    let cutoff = today - chrono::Duration::days(config.retention_days);

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some((date, compressed)) = parse_log_date(&name, &config.prefix) else {
            continue;
        };

        if date < cutoff {
            let _ = fs::remove_file(entry.path());
        } else if config.compress && !compressed && date < today {
            compress_log(&entry.path())?;
        }
    }
    Ok(())
}

/// 将日志文件压缩为同名 `.gz` 并删除原文件
fn compress_log(path: &Path) -> Result<()> {
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    if gz_path.exists() {
        return Ok(());
    }

    let mut input =
        File::open(path).with_context(|| format!("打开待压缩日志失败: {}", path.display()))?;
    let output =
        File::create(&gz_path).with_context(|| format!("创建压缩文件失败: {}", gz_path.display()))?;
    let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
    std::io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path).with_context(|| format!("删除已压缩日志失败: {}", path.display()))?;
    Ok(())
}

/// 单行日志格式: `[时间] 级别 目标 > 内容`
struct LineFormat {
    ansi: bool,
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let now = Local::now();
        write!(writer, "[{}] ", now.format("%m-%d %H:%M:%S%.3f"))?;

        if self.ansi {
            let color = match *meta.level() {
                tracing::Level::ERROR => "\x1b[31m",
                tracing::Level::WARN => "\x1b[33m",
                tracing::Level::INFO => "\x1b[32m",
                _ => "\x1b[34m",
            };
            write!(writer, "{color}{:5}\x1b[0m ", meta.level().to_string())?;
        } else {
            write!(writer, "{:5} ", meta.level().to_string())?;
        }

        write!(writer, "{} > ", meta.target())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
