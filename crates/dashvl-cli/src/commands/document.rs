use anyhow::Result;
use dashvl::builders::document::{run_document, DocumentAnswer};
use dashvl::builders::DocumentQuery;
use dashvl::stream::{NullSink, StreamSink};

use super::{with_spinner, AppContext};
use crate::render::{print_json, print_outcome, ConsoleSink};

/// Upload, ask and clean up; streamed answers print as they arrive
pub async fn handle_document(ctx: &AppContext, query: DocumentQuery) -> Result<()> {
    query.validate()?;

    let streaming = query
        .options
        .get("stream")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    if streaming {
        let mut sink = ConsoleSink::stdout();
        sink.on_answer_start();
        if let DocumentAnswer::Streamed(outcome) =
            run_document(&ctx.client, &query, &mut sink, &ctx.cancel).await?
        {
            print_outcome(&outcome, false);
        }
        return Ok(());
    }

    let answer = with_spinner("Uploading and reading the document...", async {
        run_document(&ctx.client, &query, &mut NullSink, &ctx.cancel)
            .await
            .map_err(anyhow::Error::from)
    })
    .await?;

    match answer {
        DocumentAnswer::Complete(completion) => print_json(&completion),
        DocumentAnswer::Streamed(outcome) => {
            print_outcome(&outcome, false);
            Ok(())
        }
    }
}
