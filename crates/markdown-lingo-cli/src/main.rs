//! markdown-lingo - re-render Markdown, translating prose on the way

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use markdown_lingo_config::{Config, load_translations};
use markdown_lingo_engine::{Renderer, TableExtension, parse_document};

#[derive(Parser)]
#[command(name = "markdown-lingo")]
#[command(version, about = "Render Markdown back to Markdown, translating prose", long_about = None)]
#[command(after_help = "EXAMPLES:
    markdown-lingo README.md                     Normalise to stdout
    markdown-lingo -t zh.toml README.md -o zh.md Translate into a file
    cat notes.md | markdown-lingo -c lingo.toml  Read stdin with a config")]
struct Cli {
    /// Markdown file to render; stdin when omitted
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Config file (defaults to ~/.config/markdown-lingo/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Translation file, overlaid on the configured translations
    #[arg(short, long, value_name = "PATH")]
    translations: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load_from_path(path)? {
            Some(config) => config,
            None => bail!("config file not found: {}", path.display()),
        },
        None => Config::load()?.unwrap_or_default(),
    };

    let mut translations = config.translations()?;
    if let Some(path) = &cli.translations {
        translations.extend(load_translations(path)?);
    }
    log::debug!("rendering with {} translations", translations.len());

    let source = read_input(cli.input.as_ref())?;
    let document = parse_document(&source);

    let mut renderer = Renderer::new(config.policy).with_extension(TableExtension);
    if !translations.is_empty() {
        renderer = renderer.with_transform(translations);
    }

    let mut out: BufWriter<Box<dyn Write>> = BufWriter::new(match &cli.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    });
    renderer
        .render(&mut out, &source, &document)
        .context("failed to write output")?;
    out.flush().context("failed to write output")?;
    Ok(())
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            Ok(source)
        }
    }
}
