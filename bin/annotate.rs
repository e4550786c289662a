//! # Annotate
//!
//! Run the full detect → convert → present pipeline over an HTML file and
//! print what was found, tier-colored, with the annotated markup on request.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin annotate -- --file page.html --wage 25
//! cargo run --bin annotate -- --file page.html --wage 25 --mode replace --emit-html
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::json;

use wagelens::session::DocumentSession;
use wagelens::storage::{keys, MemoryStore, SettingsStore};
use wagelens::tiers::TierColor;
use wagelens::{Document, Settings};

#[derive(Parser, Debug)]
#[command(name = "annotate", about = "Annotate prices in an HTML file with work-hours")]
struct Args {
    /// HTML file to annotate
    #[arg(long)]
    file: PathBuf,

    /// Page address, used by the shopping-site gate
    #[arg(long, default_value = "https://shop.example.com/product/1")]
    url: String,

    /// Hourly wage; zero disables conversion
    #[arg(long, default_value_t = 0.0)]
    wage: f64,

    /// Display mode: side-by-side or replace
    #[arg(long, default_value = "side-by-side")]
    mode: String,

    /// Print the annotated HTML after the summary
    #[arg(long)]
    emit_html: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = Settings::new().unwrap_or_else(|err| {
        eprintln!("failed to load settings ({err}), using defaults");
        Settings::default()
    });

    let html = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let mut doc = Document::parse_html(&html).context("failed to parse HTML")?;

    let store = Arc::new(MemoryStore::new());
    store.set(keys::HOURLY_WAGE, json!(args.wage)).await?;
    store.set(keys::DISPLAY_MODE, json!(args.mode)).await?;

    let Some(mut session) = DocumentSession::attach(&args.url, &settings, store) else {
        println!("{} does not look like a shopping site, nothing to do", args.url);
        return Ok(());
    };

    let stats = session.process(&mut doc).await;

    println!(
        "{} candidate(s), {} badge(s) injected, {} price(s) replaced in {}ms",
        stats.candidates, stats.badges_injected, stats.prices_replaced, stats.duration_ms
    );
    for report in session.current_prices() {
        let line = format!(
            "  {:>12}  ->  {:<8} ({})",
            report.original_text, report.formatted, report.tier.as_str()
        );
        let colored_line = match report.tier {
            TierColor::Green => line.green(),
            TierColor::Yellow => line.yellow(),
            TierColor::Red => line.red(),
        };
        println!("{}", colored_line);
    }

    if args.emit_html {
        println!("{}", doc.to_html());
    }

    Ok(())
}
