use std::fs;

use anyhow::Context as _;
use bibfetch::{Downloader, Settings, sniff};
use clap::Parser;
use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Source};

mod cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BIBFETCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    match args.command {
        Command::Fetch { from } => fetch(&from, &settings),
        Command::Sniff { files } => {
            for path in files {
                let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                match sniff::guess(&data) {
                    Some(kind) => println!("{}\t{}\t{}", path.display(), kind.extension, kind.mime),
                    None => println!("{}\tunknown", path.display()),
                }
            }
            Ok(())
        }
    }
}

fn fetch(from: &[Source], settings: &Settings) -> anyhow::Result<()> {
    let mut uris = Vec::new();
    for src in from {
        uris.extend(src.uris().with_context(|| format!("reading {src:?}"))?);
    }

    let (mut ok, mut failed) = (0usize, 0usize);
    for uri in &uris {
        let spinner = ProgressBar::new_spinner().with_message(uri.clone());
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        let result = Downloader::for_uri(uri, settings).and_then(|mut d| {
            d.fetch()?;
            Ok(d.into_context())
        });
        spinner.finish_and_clear();

        match result {
            Ok(ctx) => {
                ok += 1;
                println!("{}", serde_json::to_string(&ctx)?);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {uri}: {e}", "error:".red());
            }
        }
    }

    eprintln!("{} {ok}  {} {failed}", "✓".green(), "✗".red());
    Ok(())
}
