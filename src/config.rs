//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SOLVER__*` 覆盖（双下划线表示嵌套，如 `SOLVER__BACKEND__BASE_URL=http://10.0.0.2:8000`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendSection,
    pub ui: UiSection,
    pub log: LogSection,
}

/// [backend] 段：生成服务地址与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// 服务根地址，相对的 video_url 也以此为基准解析
    pub base_url: String,
    pub generate_path: String,
    /// 单次请求总超时（秒）；渲染视频较慢，默认给足
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// true 时不发网络请求，使用回显的 Mock 后端（离线演示）
    pub mock: bool,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            generate_path: "/generate".to_string(),
            timeout_secs: 600,
            connect_timeout_secs: 10,
            mock: false,
        }
    }
}

/// [ui] 段：刷新节拍、初始结果页、文本折叠上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSection {
    pub tick_ms: u64,
    /// true 时结果区默认显示 Manim 脚本，否则显示解题步骤
    pub show_script: bool,
    pub max_display_chars: usize,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            show_script: false,
            max_display_chars: 20_000,
        }
    }
}

/// [log] 段：TUI 占用 stdout，日志写文件
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub file: PathBuf,
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            file: PathBuf::from("manim-solver.log"),
            filter: "info".to_string(),
        }
    }
}

impl BackendSection {
    /// 完整的生成端点，如 http://localhost:8000/generate
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.generate_path.trim_start_matches('/')
        )
    }
}

/// 从 config 目录加载配置，环境变量 SOLVER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SOLVER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SOLVER")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
