use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "DXFVIEW_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFVIEW_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontendMode {
    #[default]
    Cli,
    Bevy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub default_mode: FrontendMode,
    #[serde(default = "FrontendConfig::default_window_title")]
    pub window_title: String,
    /// 帧循环的目标帧率。
    #[serde(default = "FrontendConfig::default_frame_rate")]
    pub frame_rate: u32,
}

impl FrontendConfig {
    fn default_window_title() -> String {
        "DXF Viewer".to_string()
    }

    fn default_frame_rate() -> u32 {
        60
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            default_mode: FrontendMode::default(),
            window_title: Self::default_window_title(),
            frame_rate: Self::default_frame_rate(),
        }
    }
}

/// 视口外观。颜色均为 `#RRGGBB` 形式，由前端负责解析。
#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_background")]
    pub background: String,
    #[serde(default = "ViewportConfig::default_line_color")]
    pub line_color: String,
    #[serde(default = "ViewportConfig::default_face_color")]
    pub face_color: String,
    #[serde(default)]
    pub camera_start: Option<[f64; 3]>,
    #[serde(default)]
    pub camera_z: Option<f64>,
    #[serde(default = "ViewportConfig::default_dash_size")]
    pub dash_size: f64,
    #[serde(default = "ViewportConfig::default_gap_size")]
    pub gap_size: f64,
    /// 无头模式下假定的容器尺寸（像素）。
    #[serde(default = "ViewportConfig::default_size")]
    pub size: [f64; 2],
}

impl ViewportConfig {
    fn default_background() -> String {
        "#000000".to_string()
    }

    fn default_line_color() -> String {
        "#ffffff".to_string()
    }

    fn default_face_color() -> String {
        "#888888".to_string()
    }

    fn default_dash_size() -> f64 {
        3.0
    }

    fn default_gap_size() -> f64 {
        1.0
    }

    fn default_size() -> [f64; 2] {
        [1280.0, 720.0]
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            background: Self::default_background(),
            line_color: Self::default_line_color(),
            face_color: Self::default_face_color(),
            camera_start: None,
            camera_z: None,
            dash_size: Self::default_dash_size(),
            gap_size: Self::default_gap_size(),
            size: Self::default_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "enabled")]
    pub enable_pan: bool,
    #[serde(default = "enabled")]
    pub enable_zoom: bool,
    #[serde(default)]
    pub enable_rotate: bool,
    #[serde(default = "enabled")]
    pub enable_damping: bool,
    #[serde(default = "NavigationConfig::default_damping_factor")]
    pub damping_factor: f64,
}

impl NavigationConfig {
    fn default_damping_factor() -> f64 {
        0.05
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: false,
            enable_damping: true,
            damping_factor: Self::default_damping_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "LoaderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "LoaderConfig::default_user_agent")]
    pub user_agent: String,
}

impl LoaderConfig {
    fn default_timeout_secs() -> u64 {
        30
    }

    fn default_user_agent() -> String {
        concat!("dxfview/", env!("CARGO_PKG_VERSION")).to_string()
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            user_agent: Self::default_user_agent(),
        }
    }
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
