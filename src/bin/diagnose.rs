use anyhow::{Context, Result};
use carfix::diagnosis::{remove_artifact, render_markdown};
use carfix::media::MediaBlob;
use carfix::{Config, DiagnosisPipeline, DiagnosisRequest, SessionId, VehicleIdentity};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "carfix-diagnose", about = "Run one diagnosis from the terminal")]
struct Cli {
    /// What the car is doing
    description: String,

    #[arg(long)]
    make: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    year: Option<String>,

    /// Audio or video clip of the symptom
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long, env = "CARFIX_CONFIG")]
    config: Option<PathBuf>,

    /// Print the full result as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Leave the annotated video in the media directory after printing
    #[arg(long)]
    keep_media: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    tokio::fs::create_dir_all(&config.media.output_dir).await?;

    let vehicle = VehicleIdentity::from_fields(cli.make, cli.model, cli.year);
    let mut request = DiagnosisRequest::new(cli.description, vehicle);
    if let Some(path) = &cli.file {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
        request = request.with_media(MediaBlob::new(bytes, filename, None));
    }

    let pipeline = DiagnosisPipeline::builder(&config)?.build();
    let result = pipeline.diagnose(SessionId::new(), request).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&*result)?);
    } else {
        print!("{}", render_markdown(&result));
    }

    if let Some(media) = &result.annotated_media {
        if cli.keep_media {
            eprintln!("Annotated video kept at {}", media.path.display());
        } else {
            remove_artifact(&media.path).await;
        }
    }
    Ok(())
}
