use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chess_openings::chess::filter::DEFAULT_KEYWORD;
use chess_openings::{CompressionMode, Dashboard, Dataset, ExportSettings, Reply};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse chess openings and play through them", long_about = None)]
struct Args {
    /// Openings CSV (ECO,Name,Moves,Description); a glob pattern loads several files
    #[arg(long, default_value = "chess_openings.csv")]
    dataset: String,

    /// Force decompression of the dataset: 'zstd'. By default only `.zst` files are decompressed
    #[arg(long)]
    compression: Option<String>,

    /// Word counted across opening names in `stats`
    #[arg(long, default_value = DEFAULT_KEYWORD)]
    keyword: String,

    /// Event tag for exported games
    #[arg(long)]
    event: Option<String>,

    /// Site tag for exported games
    #[arg(long)]
    site: Option<String>,

    /// Round tag for exported games
    #[arg(long)]
    round: Option<String>,

    /// White player name for exported games
    #[arg(long)]
    white: Option<String>,

    /// Black player name for exported games
    #[arg(long)]
    black: Option<String>,

    /// Do not print the prompt (for piped input)
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn export_settings(&self) -> ExportSettings {
        let defaults = ExportSettings::default();
        ExportSettings {
            event: self.event.clone().unwrap_or(defaults.event),
            site: self.site.clone().unwrap_or(defaults.site),
            round: self.round.clone().unwrap_or(defaults.round),
            white: self.white.clone().unwrap_or(defaults.white),
            black: self.black.clone().unwrap_or(defaults.black),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("OPENINGS_LOG", "warn"))
        .init();

    let args = Args::parse();

    let compression = args
        .compression
        .as_deref()
        .map(CompressionMode::parse)
        .transpose()?;
    let dataset = Dataset::load_or_empty(&args.dataset, compression);

    let mut dashboard = Dashboard::new(dataset)
        .with_keyword(&args.keyword)
        .with_context(|| format!("invalid keyword '{}'", args.keyword))?
        .with_export_settings(args.export_settings());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    write!(stdout, "{}", dashboard.welcome())?;

    let mut lines = stdin.lock().lines();
    loop {
        if !args.quiet {
            write!(stdout, "> ")?;
            stdout.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read command")?;

        match dashboard.handle_line(&line) {
            Reply::Continue(text) if text.is_empty() => {}
            Reply::Continue(text) => writeln!(stdout, "{text}")?,
            Reply::Quit => break,
        }
    }

    Ok(())
}
