use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use std::sync::Arc;
use steer_control::{
    ControlError, ControlResult, Controller, ControllerConfig, ControllerConfigBuilder,
    NodeContext, shutdown,
};
use steer_mesh::{RedisConfig, RedisTransport, Transport};

#[derive(Parser, Debug)]
#[command(name = "turtle-steer", version)]
#[command(about = "Replace one simulated turtle with another and steer it along the x axis")]
struct Cli {
    /// Redis connection URL of the transport backend
    #[arg(long, env = "TURTLE_REDIS_URL", default_value = "redis://localhost:6379")]
    redis_url: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid controller configuration");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli.redis_url, config))
}

fn load_config() -> ControlResult<ControllerConfig> {
    Ok(ControllerConfigBuilder::from_env()?.build()?)
}

async fn run(redis_url: String, config: ControllerConfig) -> ExitCode {
    let redis_config = RedisConfig {
        url: redis_url,
        ..RedisConfig::default()
    };
    let transport: Arc<dyn Transport> = match RedisTransport::with_config(redis_config).await {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            tracing::error!(error = %e, "Transport backend unreachable");
            return ExitCode::FAILURE;
        }
    };

    let (handle, token) = shutdown::channel();
    let signals = shutdown::listen_for_signals(handle);
    let ctx = NodeContext::new(config.node_name.clone(), transport, token);

    let result = match Controller::connect(ctx, config).await {
        Ok(controller) => controller.run().await,
        Err(e) => Err(e),
    };
    signals.abort();

    match result {
        Ok(stats) => {
            tracing::info!(
                samples = stats.samples_received,
                commands = stats.commands_published,
                "Controller stopped"
            );
            ExitCode::SUCCESS
        }
        Err(ControlError::ShutdownRequested) => {
            tracing::info!("Controller stopped before setup completed");
            ExitCode::SUCCESS
        }
        Err(e @ ControlError::Setup { .. }) => {
            tracing::error!(error = %e, "Controller stopped after setup failure");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Controller failed");
            ExitCode::FAILURE
        }
    }
}
