use anyhow::{Context, Result};
use dashvl::builders::{ImageAnalysis, RequestProcessor};
use dashvl::models::request::ChatRequest;
use dashvl::providers::base::Transport;
use dashvl::stream::{consume_stream, StreamAccumulator, StreamSink};

use super::{with_spinner, AppContext};
use crate::configuration::ModelSettings;
use crate::render::{print_json, print_outcome, ConsoleSink};

pub const PROBLEM_IMAGE_URL: &str =
    "https://img.alicdn.com/imgextra/i1/O1CN01gDEY8M1W114Hi3XcN_!!6000000002727-0-tps-1024-406.jpg";
pub const PROBLEM_PROMPT: &str = "How do I solve this problem?";

pub const TEXT_IMAGE_URL: &str =
    "https://help-static-aliyun-doc.aliyuncs.com/file-manage-files/zh-CN/20241108/ctdzex/biaozhun.jpg";
pub const TEXT_PROMPT: &str = "Only output the text in the image.";

/// The two image demos offered by the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTask {
    /// Work through a problem with the reasoning trace on
    SolveProblem,
    /// Read the text out of an image, no reasoning
    ExtractText,
}

impl ImageTask {
    pub fn analysis(self, models: &ModelSettings) -> ImageAnalysis {
        match self {
            ImageTask::SolveProblem => {
                ImageAnalysis::new(&models.image, PROBLEM_IMAGE_URL, PROBLEM_PROMPT)
            }
            ImageTask::ExtractText => {
                ImageAnalysis::new(&models.image_text, TEXT_IMAGE_URL, TEXT_PROMPT)
                    .with_thinking(false)
            }
        }
    }
}

/// Reasoning is tracked when the request sent asks for it
fn accumulator_for(request: &ChatRequest) -> StreamAccumulator {
    StreamAccumulator::new(request.is_thinking())
}

pub async fn handle_image(ctx: &AppContext, analysis: ImageAnalysis) -> Result<()> {
    let request = analysis.build().context("Failed to build image request")?;

    if !request.is_stream() {
        let completion = with_spinner("Analyzing image...", async {
            ctx.until_cancelled(ctx.client.complete(&request))
                .await
                .map_err(anyhow::Error::from)
        })
        .await?;
        return print_json(&completion);
    }

    let stream = ctx
        .until_cancelled(ctx.client.stream(&request))
        .await
        .context("Failed to start image analysis")?;

    let thinking = request.is_thinking();
    let mut accumulator = accumulator_for(&request);
    let mut sink = ConsoleSink::stdout();
    if !thinking {
        sink.on_answer_start();
    }

    consume_stream(stream, &mut accumulator, &mut sink, &ctx.cancel)
        .await
        .context("Image analysis stream failed")?;

    print_outcome(&accumulator.finish(), thinking);
    Ok(())
}
