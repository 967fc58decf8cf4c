use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dxtab_config::{AppConfig, ConfigError};

/// CAD-DXF 表格提取工具。
#[derive(Debug, Parser)]
#[command(name = "dxtab", version, about = "预览 DXF 结构并导出实体 CSV 表格")]
struct Cli {
    /// 配置文件路径，缺省时自动发现
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 检查 DXF 结构并列出 XDATA
    Inspect {
        /// DXF 文件路径
        filepath: PathBuf,
        /// 最大显示实体数量，缺省取配置值
        #[arg(long)]
        max_entities: Option<usize>,
        /// 不限制显示数量
        #[arg(long, conflicts_with = "max_entities")]
        no_limit: bool,
    },
    /// 提取 DXF 实体并导出 CSV
    Export {
        /// DXF 文件路径
        filepath: PathBuf,
        /// 输出 CSV 路径，缺省为输入路径替换扩展名
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_configuration(cli.config);
    init_logging(&config);

    match cli.command {
        Command::Inspect {
            filepath,
            max_entities,
            no_limit,
        } => {
            let limit = if no_limit {
                None
            } else {
                Some(max_entities.unwrap_or(config.preview.max_entities))
            };
            info!(path = %filepath.display(), ?limit, "预览 DXF 结构");
            for line in dxtab_frontend::inspect_structure(&filepath, limit) {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Command::Export { filepath, output } => {
            info!(path = %filepath.display(), "导出 DXF 实体表");
            match dxtab_frontend::try_export_table(&filepath, output.as_deref(), &config) {
                Ok(path) => {
                    println!("[成功] CSV 文件已生成：{}", path.display());
                    ExitCode::SUCCESS
                }
                Err(error) => {
                    println!("{error}");
                    if error.is_warning() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
            }
        }
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志走 stderr，stdout 只承载操作结果
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
