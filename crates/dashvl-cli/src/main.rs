mod commands;
mod configuration;
mod menu;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashvl::builders::document::DEFAULT_QUERY;
use dashvl::builders::{DocumentQuery, ImageAnalysis, TextChat, VideoAnalysis};
use dashvl::models::request::Options;
use dashvl::providers::dashscope::DashScopeClient;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use commands::chat::{conversation, handle_chat, DEFAULT_MESSAGE, DEFAULT_SYSTEM};
use commands::document::handle_document;
use commands::image::{handle_image, PROBLEM_IMAGE_URL, PROBLEM_PROMPT};
use commands::ocr::{handle_ocr, parse_schema, OcrPreset};
use commands::video::{frames_or_demo, handle_video, DEMO_PROMPT};
use commands::AppContext;
use configuration::Settings;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// DashScope API key (can also be set via DASHSCOPE_API_KEY environment variable)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// TOML settings file, layered under DASHVL_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question about an image, streaming the answer
    Image {
        #[arg(long, default_value = PROBLEM_IMAGE_URL)]
        url: String,

        #[arg(short, long, default_value = PROBLEM_PROMPT)]
        prompt: String,

        /// Skip the reasoning trace
        #[arg(long)]
        no_thinking: bool,

        /// Wait for the full response instead of streaming
        #[arg(long)]
        no_stream: bool,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Describe a video given as frame image URLs in playback order
    Video {
        /// Frame URL; repeat for each frame. Defaults to the demo frames
        #[arg(long = "frame")]
        frames: Vec<String>,

        #[arg(short, long, default_value = DEMO_PROMPT)]
        prompt: String,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Extract structured fields from an image as JSON
    Ocr {
        #[arg(long, value_enum, default_value_t = OcrPreset::Invoice)]
        preset: OcrPreset,

        /// Image URL; defaults to the preset's demo image
        #[arg(long)]
        url: Option<String>,

        /// JSON describing the fields to extract
        #[arg(long, conflicts_with = "prompt")]
        schema: Option<String>,

        /// Replace the extraction instruction entirely
        #[arg(long)]
        prompt: Option<String>,

        #[arg(long, requires = "max_pixels")]
        min_pixels: Option<u32>,

        #[arg(long, requires = "min_pixels")]
        max_pixels: Option<u32>,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Send a single message to a text model
    Chat {
        #[arg(default_value = DEFAULT_MESSAGE)]
        message: String,

        #[arg(long, default_value = DEFAULT_SYSTEM)]
        system: String,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a question about a local document
    Document {
        path: PathBuf,

        #[arg(short, long, default_value = DEFAULT_QUERY)]
        query: String,

        /// Stream the answer as it is generated
        #[arg(long)]
        stream: bool,

        #[arg(short, long)]
        model: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Cancels outstanding requests on Ctrl-C
fn watch_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            token.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_path = dotenv::dotenv().ok();
    init_tracing();
    if let Some(path) = dotenv_path {
        tracing::debug!("loaded environment from {:?}", path);
    }

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    let client = DashScopeClient::new(settings.client_config(cli.api_key, cli.base_url))
        .context("Failed to create the HTTP client")?;
    let ctx = AppContext {
        client,
        settings,
        cancel: watch_interrupt(),
    };

    match cli.command {
        None => menu::run_menu(&ctx).await,
        Some(command) => run_command(&ctx, command).await,
    }
}

async fn run_command(ctx: &AppContext, command: Command) -> Result<()> {
    let models = &ctx.settings.models;

    match command {
        Command::Image {
            url,
            prompt,
            no_thinking,
            no_stream,
            model,
        } => {
            let model = model.unwrap_or_else(|| models.image.clone());
            let analysis = ImageAnalysis::new(model, url, prompt)
                .with_thinking(!no_thinking)
                .with_stream(!no_stream);
            handle_image(ctx, analysis).await
        }
        Command::Video {
            frames,
            prompt,
            model,
        } => {
            let analysis = VideoAnalysis::new(
                model.unwrap_or_else(|| models.video.clone()),
                frames_or_demo(frames),
                prompt,
            );
            handle_video(ctx, analysis).await
        }
        Command::Ocr {
            preset,
            url,
            schema,
            prompt,
            min_pixels,
            max_pixels,
            model,
        } => {
            let mut extraction = preset.extraction(models, url);
            if let Some(model) = model {
                extraction.model = model;
            }
            if let Some(schema) = schema {
                extraction = extraction.with_schema(parse_schema(&schema));
            }
            if let Some(prompt) = prompt {
                extraction = extraction.with_custom_prompt(prompt);
            }
            if let (Some(min), Some(max)) = (min_pixels, max_pixels) {
                extraction = extraction.with_pixel_bounds(min, max);
            }
            handle_ocr(ctx, extraction).await
        }
        Command::Chat {
            message,
            system,
            model,
        } => {
            let chat = TextChat::new(
                model.unwrap_or_else(|| models.text.clone()),
                conversation(&system, &message),
            );
            handle_chat(ctx, chat).await
        }
        Command::Document {
            path,
            query,
            stream,
            model,
        } => {
            let mut options = Options::new();
            if stream {
                options.insert("stream".to_string(), json!(true));
            }
            let query = DocumentQuery::new(model.unwrap_or_else(|| models.document.clone()), path)
                .with_query(query)
                .with_options(options);
            handle_document(ctx, query).await
        }
    }
}
