use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dxfview_config::{AppConfig, ConfigError, FrontendMode};
use dxfview_frontend::errors::FrontendError;
use dxfview_frontend::loader::SourceReference;

#[derive(Debug, Parser)]
#[command(name = "dxfview")]
#[command(about = "加载 DXF 文档并渲染到视口", long_about = None)]
struct Cli {
    /// DXF 来源：以 http:// 或 https:// 开头视为 URL，否则视为本地路径
    #[arg(env = "DXFVIEW_SOURCE")]
    source: Option<String>,

    /// 配置文件路径，缺省时按 DXFVIEW_CONFIG 与 ./config/default.toml 查找
    #[arg(long)]
    config: Option<PathBuf>,

    /// 前端模式，缺省取配置中的 frontend.default_mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// CLI 模式下加载后运行的帧数
    #[arg(long)]
    frames: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Cli,
    Bevy,
}

impl From<ModeArg> for FrontendMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Cli => FrontendMode::Cli,
            ModeArg::Bevy => FrontendMode::Bevy,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config, config_error) = match load_configuration(cli.config) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    // 订阅器就绪后再报告配置错误，否则警告会被丢弃
    init_logging(&config);
    if let Some(err) = config_error {
        report_config_error(&err);
    }
    info!("启动 DXF 查看器");

    let source = cli.source.as_deref().map(SourceReference::parse);
    let mode = cli
        .mode
        .map(FrontendMode::from)
        .unwrap_or(config.frontend.default_mode);

    let result = match mode {
        FrontendMode::Bevy => {
            info!("以 Bevy 模式启动");
            dxfview_frontend::launch_bevy_desktop(&config, source)
        }
        FrontendMode::Cli => {
            info!("以 CLI 模式启动");
            match source {
                Some(source) => dxfview_frontend::run_cli(&config, source, cli.frames),
                None => Err(FrontendError::MissingSource),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "前端运行失败");
            eprintln!("错误：{err}");
            ExitCode::FAILURE
        }
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn report_config_error(err: &ConfigError) {
    match err {
        ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
            warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
        }
        ConfigError::Context { .. } => {
            warn!(error = %err, "加载配置失败，使用内建默认值");
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写到标准错误，标准输出只保留摘要
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
