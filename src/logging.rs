//! # Logging モジュール
//!
//! 群制御のログ管理機能を提供します。
//!
//! tracing-appenderによる非同期ファイル出力と、コンソールへの
//! コンパクト出力を組み合わせます。制御ループは0.1秒周期で回るため、
//! ファイル書き込みは必ず非ブロッキングで行い、ティック処理を
//! 遅延させません。
//!
//! ## 設定可能な出力先
//!
//! - `Console`: コンソールのみ
//! - `File`: ファイルのみ（logs/swarmctl.log、JSON形式）
//! - `Both`: コンソールとファイルの両方

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};
use tracing_appender::{non_blocking, rolling};

/// ログ出力先の設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogOutput {
    /// コンソールのみ
    Console,
    /// ファイルのみ
    File,
    /// コンソールとファイルの両方
    Both,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(format!("無効な出力先: {}. 利用可能: console, file, both", s)),
        }
    }
}

/// ログ設定構造体
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub output: LogOutput,
    /// ログファイルのディレクトリ（FileまたはBothの場合）
    pub log_dir: String,
    /// ログファイル名のプレフィックス
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            log_dir: "logs".to_string(),
            file_prefix: "swarmctl".to_string(),
        }
    }
}

/// 詳細出力レベル（-vの個数）をログレベルへ変換
pub fn verbosity_to_level(verbose_count: u8) -> Level {
    match verbose_count {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// ログシステムを初期化
///
/// 環境変数RUST_LOGが設定されていればそちらを優先し、なければ
/// 設定のレベルを使用します。ファイル出力時は日次ローテーションの
/// JSONログを非同期で書き込みます。
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_string()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = || {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    };

    match config.output {
        LogOutput::Console => {
            Registry::default().with(env_filter).with(console_layer()).init();
        }
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir)?;
            let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
            let (non_blocking_appender, guard) = non_blocking(file_appender);

            Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking_appender)
                        .with_target(true)
                        .json(),
                )
                .init();

            // guardをリークさせて非同期書き込みをプロセス終了まで維持
            std::mem::forget(guard);
        }
        LogOutput::Both => {
            std::fs::create_dir_all(&config.log_dir)?;
            let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
            let (non_blocking_appender, guard) = non_blocking(file_appender);

            Registry::default()
                .with(env_filter)
                .with(console_layer())
                .with(
                    fmt::layer()
                        .with_writer(non_blocking_appender)
                        .with_target(true)
                        .json(),
                )
                .init();

            std::mem::forget(guard);
        }
    }

    Ok(())
}
