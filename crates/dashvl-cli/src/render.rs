use std::io::{self, Write};

use anyhow::{Context, Result};
use bat::WrappingMode;
use console::style;
use dashvl::providers::base::Usage;
use dashvl::stream::{StreamOutcome, StreamSink};
use serde::Serialize;

const THEME: &str = "zenburn";

fn banner(title: &str) -> String {
    format!("\n{} {} {}\n", "=".repeat(20), title, "=".repeat(20))
}

pub fn print_banner(title: &str) {
    println!("{}", style(banner(title)).cyan().bold());
}

/// Pretty JSON with syntax highlighting
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("Failed to serialize response")?;
    print_highlighted(&content, "JSON")
}

pub fn print_markdown(content: &str) -> Result<()> {
    print_highlighted(content, "Markdown")
}

fn print_highlighted(content: &str, language: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language(language)
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow::anyhow!("Failed to render output: {e}"))?;
    println!();
    Ok(())
}

/// Writes stream fragments to stdout as they arrive
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Terminal write failures are not worth aborting a stream over
    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl<W: Write> StreamSink for ConsoleSink<W> {
    fn on_reasoning_start(&mut self) {
        self.write(&banner("Reasoning"));
    }

    fn on_reasoning(&mut self, fragment: &str) {
        self.write(fragment);
    }

    fn on_answer_start(&mut self) {
        self.write(&banner("Answer"));
    }

    fn on_answer(&mut self, fragment: &str) {
        self.write(fragment);
    }

    fn on_usage(&mut self, usage: &Usage) {
        self.write(&format!("\n\nUsage: {}\n", usage));
    }
}

/// The complete texts after a stream has ended
pub fn print_outcome(outcome: &StreamOutcome, reasoning_enabled: bool) {
    if reasoning_enabled {
        print_banner("Full reasoning");
        println!("{}", outcome.reasoning);
    }
    print_banner("Full answer");
    println!("{}", outcome.answer);
}
