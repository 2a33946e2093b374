use anyhow::{Context, Result};
use dashvl::builders::{RequestProcessor, TextChat};
use dashvl::models::message::Message;
use dashvl::providers::base::Transport;

use super::{with_spinner, AppContext};
use crate::render::print_json;

pub const DEFAULT_SYSTEM: &str = "You are a helpful assistant.";
pub const DEFAULT_MESSAGE: &str = "Who are you?";

pub fn conversation(system: &str, message: &str) -> Vec<Message> {
    vec![Message::system(system), Message::user(message)]
}

pub async fn handle_chat(ctx: &AppContext, chat: TextChat) -> Result<()> {
    let request = chat.build().context("Failed to build chat request")?;

    let completion = with_spinner("Awaiting reply...", async {
        ctx.until_cancelled(ctx.client.complete(&request))
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;

    print_json(&completion)
}
