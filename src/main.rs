use anyhow::{Context, Result};
use carfix::{build_router, AppState, Config, DiagnosisPipeline};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "carfix", about = "Car repair diagnosis service")]
struct Args {
    /// TOML config file; built-in defaults apply when omitted
    #[arg(long, env = "CARFIX_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides server.bind from the config
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    tokio::fs::create_dir_all(&config.media.output_dir)
        .await
        .with_context(|| format!("creating media dir {}", config.media.output_dir.display()))?;

    let pipeline = DiagnosisPipeline::builder(&config)?.build();
    let app = build_router(AppState::new(Arc::new(pipeline)));

    info!("carfix {} listening on {}", env!("CARGO_PKG_VERSION"), bind);
    info!("Annotated media in {}", config.media.output_dir.display());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    axum::serve(listener, app).await?;
    Ok(())
}
