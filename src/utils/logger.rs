use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日誌輸出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的精簡格式
    Compact,
    /// 部署時給集中式日誌收集
    Json,
}

/// `RUST_LOG` 優先；否則只開 regapi 自己的日誌
fn default_filter(verbose: bool) -> EnvFilter {
    let directive = if verbose {
        "regapi=debug,info"
    } else {
        "regapi=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

fn plain_layer<S>() -> fmt::Layer<S> {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with((!json).then(|| plain_layer().compact()))
        .with(json.then(|| plain_layer().json()))
        .init();
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(LogFormat::Compact, verbose);
}
