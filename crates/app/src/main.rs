use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use strata_layout::{CancelToken, LayoutDirection};
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

mod document;

use document::GraphDocument;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

impl From<Direction> for LayoutDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::TopToBottom => LayoutDirection::TopToBottom,
            Direction::BottomToTop => LayoutDirection::BottomToTop,
            Direction::LeftToRight => LayoutDirection::LeftToRight,
            Direction::RightToLeft => LayoutDirection::RightToLeft,
        }
    }
}

/// Lay out a directed graph in layers
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document (RON)
    input: PathBuf,

    /// Override the direction of the document
    #[arg(long, value_enum)]
    direction: Option<Direction>,

    /// Override the seed of the tie breaking shuffles
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut document: GraphDocument = ron::from_str(&text)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    if let Some(direction) = args.direction {
        document.layout.direction = direction.into();
    }
    if let Some(seed) = args.seed {
        document.layout.seed = seed;
    }
    debug!("Layout parameters: {:?}", document.layout);

    let cancel = CancelToken::new();
    if let Some(timeout) = args.timeout_ms {
        let watchdog = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(timeout));
            watchdog.cancel();
        });
    }

    let result = document.lay_out(&cancel).context("Layout failed")?;
    info!(
        "Laid out {} nodes with {} crossings",
        result.nodes.len(),
        result.crossings
    );

    let text = ron::ser::to_string_pretty(&result, ron::ser::PrettyConfig::default())?;
    match args.output {
        Some(path) => std::fs::write(&path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}
