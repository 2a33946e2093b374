use std::path::PathBuf;

use anyhow::Result;
use console::style;
use dashvl::builders::document::DEFAULT_QUERY;
use dashvl::builders::{DocumentQuery, TextChat, VideoAnalysis};

use crate::commands::chat::{conversation, handle_chat, DEFAULT_MESSAGE, DEFAULT_SYSTEM};
use crate::commands::document::handle_document;
use crate::commands::image::{handle_image, ImageTask};
use crate::commands::ocr::{handle_ocr, OcrPreset};
use crate::commands::video::{frames_or_demo, handle_video, DEMO_PROMPT};
use crate::commands::AppContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Image,
    Video,
    Ocr,
    Chat,
    Document,
}

/// The numbered menu shown when no subcommand is given.
///
/// A failing branch is reported and ends the menu without an error exit.
pub async fn run_menu(ctx: &AppContext) -> Result<()> {
    cliclack::intro(style(" dashvl ").on_cyan().black())?;

    let mode = cliclack::select("Which mode would you like to run?")
        .item(Mode::Image, "1. Image analysis", "")
        .item(Mode::Video, "2. Video analysis", "demo frames")
        .item(Mode::Ocr, "3. OCR structured extraction", "")
        .item(Mode::Chat, "4. Text chat", "")
        .item(Mode::Document, "5. Document understanding", "local file")
        .interact()?;

    match run_mode(ctx, mode).await {
        Ok(()) => cliclack::outro("Done")?,
        Err(err) => {
            tracing::debug!(?mode, error = ?err, "menu branch failed");
            cliclack::log::error(format!("{err:#}"))?;
            cliclack::outro_cancel("Nothing more to do")?;
        }
    }
    Ok(())
}

async fn run_mode(ctx: &AppContext, mode: Mode) -> Result<()> {
    let models = &ctx.settings.models;

    match mode {
        Mode::Image => {
            let task = cliclack::select("Which image analysis?")
                .item(ImageTask::SolveProblem, "1. Solve a problem", "with reasoning")
                .item(ImageTask::ExtractText, "2. Extract text", "no reasoning")
                .interact()?;
            handle_image(ctx, task.analysis(models)).await
        }
        Mode::Video => {
            let analysis = VideoAnalysis::new(&models.video, frames_or_demo(vec![]), DEMO_PROMPT);
            handle_video(ctx, analysis).await
        }
        Mode::Ocr => {
            let preset = cliclack::select("Which document type?")
                .item(OcrPreset::Invoice, "1. Invoice", "")
                .item(OcrPreset::TrainTicket, "2. Train ticket", "")
                .interact()?;
            handle_ocr(ctx, preset.extraction(models, None)).await
        }
        Mode::Chat => {
            let chat = TextChat::new(&models.text, conversation(DEFAULT_SYSTEM, DEFAULT_MESSAGE));
            handle_chat(ctx, chat).await
        }
        Mode::Document => {
            let path: String = cliclack::input("Path to the document")
                .placeholder("./report.pdf")
                .interact()?;
            let query: String = cliclack::input("What would you like to know?")
                .default_input(DEFAULT_QUERY)
                .interact()?;

            let query = DocumentQuery::new(&models.document, PathBuf::from(path.trim()))
                .with_query(query);
            handle_document(ctx, query).await
        }
    }
}
