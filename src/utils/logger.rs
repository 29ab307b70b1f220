use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的精簡格式
    Compact,
    /// JSON lines，給無人值守的執行環境使用
    Json,
}

/// `RUST_LOG` 未設定時使用的過濾規則
fn default_directive(level: Option<&str>, verbose: bool) -> String {
    match (level, verbose) {
        (_, true) => "opentrons_flow=debug,info".to_string(),
        (Some(level), false) => format!("opentrons_flow={}", level),
        (None, false) => "opentrons_flow=info".to_string(),
    }
}

pub fn init_logger(format: LogFormat, level: Option<&str>, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(layer.compact())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init(),
    }
}
