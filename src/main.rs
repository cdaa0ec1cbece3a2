use anyhow::Context;
use clap::Parser;
use log::{error, info};
use sentiment_api::pipelines::sentiment::{SentimentConfig, SentimentModel};
use sentiment_api::server::{init_logging, startup, AppState, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tch::Device;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(
        long,
        default_value = "127.0.0.1",
        help = "Host address to bind the server to"
    )]
    host: String,

    #[arg(long, default_value_t = 8000, help = "Port number to listen on")]
    port: u16,

    #[arg(long, help = "Number of HTTP workers (default: number of physical cores)")]
    workers: Option<usize>,

    #[arg(
        long,
        help = "Directory containing config.json, vocab.json, merges.txt and rust_model.ot, model.safetensors or pytorch_model.bin. Downloads the pretrained checkpoint when omitted"
    )]
    model_dir: Option<PathBuf>,

    #[arg(long, help = "Run the model on CPU even when CUDA is available")]
    cpu: bool,

    #[arg(
        long,
        default_value = "info",
        help = "Log level: off, error, warn, info, debug or trace"
    )]
    log_level: log::LevelFilter,
}

impl Args {
    fn get_server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            workers: self.workers,
        }
    }

    fn get_device(&self) -> Device {
        if self.cpu {
            Device::Cpu
        } else {
            Device::cuda_if_available()
        }
    }
}

#[cfg(feature = "remote")]
fn pretrained_config() -> anyhow::Result<SentimentConfig> {
    Ok(SentimentConfig::default())
}

#[cfg(not(feature = "remote"))]
fn pretrained_config() -> anyhow::Result<SentimentConfig> {
    anyhow::bail!("--model-dir is required when built without the `remote` feature")
}

fn load_model(args: &Args) -> anyhow::Result<SentimentModel> {
    let mut config = match &args.model_dir {
        Some(model_dir) => SentimentConfig::from_directory(model_dir)
            .with_context(|| format!("invalid model directory {}", model_dir.display()))?,
        None => pretrained_config()?,
    };
    config.device = args.get_device();

    info!("Loading sentiment model on {:?}", config.device);
    let model = SentimentModel::new(config).context("failed to load the sentiment model")?;
    info!("Sentiment model ready");
    Ok(model)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    let model = load_model(&args).map_err(|e| {
        error!("{:#}", e);
        e
    })?;

    let app_state = AppState::new(Arc::new(model));
    actix_web::rt::System::new().block_on(startup(args.get_server_config(), app_state))?;
    Ok(())
}
