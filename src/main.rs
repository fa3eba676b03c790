use anyhow::Context;
use clap::Parser;
use regapi::config::ServerArgs;
use regapi::utils::logger::{self, LogFormat};
use regapi::utils::validation::Validate;
use regapi::{
    router_with_timeout, EvaluationResolver, LdapDirectory, PgEvaluationStore, RegService,
    ServiceConfig, TokenCodec,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // 載入 TOML 配置
    let mut config = match ServiceConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(address) = args.address {
        config.server.address = address;
    }

    // 初始化日誌
    let format = if config.json_logs() {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, args.verbose);
    tracing::info!("🚀 Starting regapi");

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.check {
        println!("✅ Configuration '{}' is valid", args.config);
        return Ok(());
    }

    let codec = match &config.token.secret {
        Some(secret) => TokenCodec::new(secret, config.token.ttl()),
        None => {
            tracing::warn!("token.secret is not set; issued tokens will not survive a restart");
            TokenCodec::with_random_secret(config.token.ttl())
        }
    };
    let directory = LdapDirectory::new(&config.directory);
    let store = PgEvaluationStore::connect_lazy(&config.database);
    let resolver = EvaluationResolver::new(store, config.resolver.settings());
    tracing::debug!(
        concurrent_lookups = resolver.settings().concurrent_lookups,
        lookup_timeout = ?resolver.settings().lookup_timeout,
        "Resolver configured"
    );
    let service = Arc::new(RegService::new(
        directory,
        resolver,
        codec,
        config.directory.identification_attribute(),
    ));
    tracing::info!(
        "🔑 Students are identified by the '{}' directory attribute",
        service.identification_attribute()
    );

    let listener = tokio::net::TcpListener::bind(&config.server.address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.address))?;
    tracing::info!("📡 Serving API on {}", config.server.address);

    let app = router_with_timeout(service, config.server.request_timeout());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("✅ regapi stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
