use anyhow::{Context, Result};
use dashvl::builders::{RequestProcessor, VideoAnalysis};
use dashvl::providers::base::Transport;

use super::{with_spinner, AppContext};
use crate::render::print_json;

pub const DEMO_FRAMES: [&str; 4] = [
    "https://img.alicdn.com/imgextra/i3/O1CN01K3SgGo1eqmlUgeE9b_!!6000000003923-0-tps-3840-2160.jpg",
    "https://img.alicdn.com/imgextra/i4/O1CN01BjZvwg1Y23CF5qIRB_!!6000000003000-0-tps-3840-2160.jpg",
    "https://img.alicdn.com/imgextra/i4/O1CN01Ib0clU27vTgBdbVLQ_!!6000000007859-0-tps-3840-2160.jpg",
    "https://img.alicdn.com/imgextra/i1/O1CN01aygPLW1s3EXCdSN4X_!!6000000005710-0-tps-3840-2160.jpg",
];
pub const DEMO_PROMPT: &str = "Describe the specific process shown in this video.";

/// The demo frames when none are given
pub fn frames_or_demo(frames: Vec<String>) -> Vec<String> {
    if frames.is_empty() {
        DEMO_FRAMES.iter().map(|frame| frame.to_string()).collect()
    } else {
        frames
    }
}

pub async fn handle_video(ctx: &AppContext, analysis: VideoAnalysis) -> Result<()> {
    let request = analysis.build().context("Failed to build video request")?;

    let completion = with_spinner("Analyzing video frames...", async {
        ctx.until_cancelled(ctx.client.complete(&request))
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;

    print_json(&completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_frames_fill_in() {
        assert_eq!(frames_or_demo(vec![]).len(), 4);

        let own = vec!["https://example.com/1.jpg".to_string()];
        assert_eq!(frames_or_demo(own.clone()), own);
    }
}
