//! Accumulation of streamed responses.
//!
//! A streamed completion interleaves two channels: the model's reasoning trace
//! and its answer. [`StreamAccumulator`] separates them, builds each into a
//! complete string and hands every fragment to a [`StreamSink`] as soon as it
//! arrives, in arrival order.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::errors::{ClientError, Result};
use crate::providers::base::Usage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Reasoning,
    Answer,
}

/// One incremental unit of a streamed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Delta { channel: Channel, text: String },
    /// Terminal token counts, sent after the last delta
    Usage(Usage),
}

impl StreamChunk {
    pub fn reasoning<S: Into<String>>(text: S) -> Self {
        StreamChunk::Delta {
            channel: Channel::Reasoning,
            text: text.into(),
        }
    }

    pub fn answer<S: Into<String>>(text: S) -> Self {
        StreamChunk::Delta {
            channel: Channel::Answer,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    AwaitingContent,
    Reasoning,
    Answering,
}

/// Receives output from a [`StreamAccumulator`] as chunks arrive.
pub trait StreamSink {
    /// Called once, before the first reasoning fragment
    fn on_reasoning_start(&mut self) {}

    fn on_reasoning(&mut self, fragment: &str);

    /// Called once, before the first non-empty answer fragment, when the
    /// stream moves into the answer
    fn on_answer_start(&mut self) {}

    fn on_answer(&mut self, fragment: &str);

    fn on_usage(&mut self, _usage: &Usage) {}
}

/// A sink that discards everything.
pub struct NullSink;

impl StreamSink for NullSink {
    fn on_reasoning(&mut self, _fragment: &str) {}

    fn on_answer(&mut self, _fragment: &str) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub reasoning: String,
    pub answer: String,
    pub usage: Option<Usage>,
}

#[derive(Debug)]
pub struct StreamAccumulator {
    state: AccumulatorState,
    reasoning_enabled: bool,
    reasoning: String,
    answer: String,
    usage: Option<Usage>,
}

impl StreamAccumulator {
    /// With reasoning disabled the accumulator starts out answering and drops
    /// any reasoning fragments the service sends anyway.
    pub fn new(reasoning_enabled: bool) -> Self {
        Self {
            state: if reasoning_enabled {
                AccumulatorState::AwaitingContent
            } else {
                AccumulatorState::Answering
            },
            reasoning_enabled,
            reasoning: String::new(),
            answer: String::new(),
            usage: None,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    pub fn push(&mut self, chunk: StreamChunk, sink: &mut impl StreamSink) {
        match chunk {
            StreamChunk::Delta {
                channel: Channel::Reasoning,
                text,
            } => self.push_reasoning(&text, sink),
            StreamChunk::Delta {
                channel: Channel::Answer,
                text,
            } => self.push_answer(&text, sink),
            StreamChunk::Usage(usage) => {
                sink.on_usage(&usage);
                self.usage = Some(usage);
            }
        }
    }

    fn push_reasoning(&mut self, text: &str, sink: &mut impl StreamSink) {
        if !self.reasoning_enabled {
            tracing::debug!(
                len = text.len(),
                "ignoring reasoning fragment, reasoning is disabled"
            );
            return;
        }

        if self.state == AccumulatorState::AwaitingContent {
            self.state = AccumulatorState::Reasoning;
            sink.on_reasoning_start();
        }

        self.reasoning.push_str(text);
        if !text.is_empty() {
            sink.on_reasoning(text);
        }
    }

    fn push_answer(&mut self, text: &str, sink: &mut impl StreamSink) {
        if text.is_empty() {
            return;
        }

        if self.state != AccumulatorState::Answering {
            tracing::debug!(from = ?self.state, "stream moved to answering");
            self.state = AccumulatorState::Answering;
            sink.on_answer_start();
        }

        self.answer.push_str(text);
        sink.on_answer(text);
    }

    pub fn finish(self) -> StreamOutcome {
        StreamOutcome {
            reasoning: self.reasoning,
            answer: self.answer,
            usage: self.usage,
        }
    }
}

/// Drive `stream` to the end, feeding every chunk through `accumulator`.
///
/// Stops with [`ClientError::Cancelled`] once `cancel` fires; whatever was
/// accumulated up to that point stays in `accumulator`. Errors from the
/// stream are returned unchanged.
pub async fn consume_stream<S>(
    mut stream: S,
    accumulator: &mut StreamAccumulator,
    sink: &mut impl StreamSink,
    cancel: &CancellationToken,
) -> Result<()>
where
    S: Stream<Item = Result<StreamChunk>> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            next = stream.next() => match next {
                Some(chunk) => accumulator.push(chunk?, sink),
                None => return Ok(()),
            },
        }
    }
}
