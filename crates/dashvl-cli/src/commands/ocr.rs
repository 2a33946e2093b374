use anyhow::{Context, Result};
use dashvl::builders::{OcrExtraction, RequestProcessor};
use dashvl::providers::base::Transport;
use serde_json::Value;

use super::{with_spinner, AppContext};
use crate::configuration::ModelSettings;
use crate::render::print_markdown;

pub const INVOICE_URL: &str =
    "https://prism-test-data.oss-cn-hangzhou.aliyuncs.com/image/car_invoice/car-invoice-img00040.jpg";
pub const TRAIN_TICKET_URL: &str =
    "https://img.alicdn.com/imgextra/i2/O1CN01ktT8451iQutqReELT_!!6000000004408-0-tps-689-487.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OcrPreset {
    /// Seller, buyer, pre-tax price and codes from an invoice
    Invoice,
    /// Journey and passenger details from a train ticket
    TrainTicket,
}

impl OcrPreset {
    pub fn demo_url(self) -> &'static str {
        match self {
            OcrPreset::Invoice => INVOICE_URL,
            OcrPreset::TrainTicket => TRAIN_TICKET_URL,
        }
    }

    pub fn extraction(self, models: &ModelSettings, image_url: Option<String>) -> OcrExtraction {
        let image_url = image_url.unwrap_or_else(|| self.demo_url().to_string());
        match self {
            OcrPreset::Invoice => OcrExtraction::new(&models.ocr, image_url),
            OcrPreset::TrainTicket => OcrExtraction::train_ticket(&models.ocr, image_url),
        }
    }
}

/// A schema from the command line; text that is not JSON is embedded as written
pub fn parse_schema(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Prints only the extracted content, not the full response
pub async fn handle_ocr(ctx: &AppContext, extraction: OcrExtraction) -> Result<()> {
    let request = extraction.build().context("Failed to build OCR request")?;

    let completion = with_spinner("Extracting text...", async {
        ctx.until_cancelled(ctx.client.complete(&request))
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;

    let content = completion
        .text()
        .context("The response contained no extracted content")?;
    print_markdown(content)
}
