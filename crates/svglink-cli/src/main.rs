use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use svglink_core::{
    BufferTokens, ClickError, MarkupDialect, PreviewSession, SourceRope, TagPath, TextBuffer,
    Tokenizer, find_tag_in,
};

mod config;
mod report;

use config::Config;
use report::{DesyncReport, human_position, located};

#[derive(Parser)]
#[command(version, about = "svglink - map preview elements back to their source tags", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a KDL config file [default: <config dir>/svglink/config.kdl]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `svglink::walker=trace`
    #[arg(long, env = "SVGLINK_LOG", global = true)]
    log_level: Option<String>,

    /// Markup dialect (svg, xml, html); guessed from the file extension if unset
    #[arg(long, env = "SVGLINK_DIALECT", global = true)]
    dialect: Option<MarkupDialect>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a tag path such as `g[1]/circle[0]` against a source file
    Locate {
        file: PathBuf,

        /// Root-relative path; `/` is the root element
        path: String,
    },
    /// Simulate a click on an element of the rendered preview
    Pick {
        file: PathBuf,

        /// `id` attribute of the element to click
        #[arg(long)]
        id: String,

        /// Click the rendered instance of this `<use>` element instead
        #[arg(long)]
        instance: bool,
    },
    /// Dump the token stream with nesting depths
    Tokens { file: PathBuf },
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    init_tracing(&log_level);

    match &cli.command {
        Commands::Locate { file, path } => {
            let dialect = resolve_dialect(&cli, &config, file);
            locate(file, path, dialect)
        }
        Commands::Pick { file, id, instance } => {
            let dialect = resolve_dialect(&cli, &config, file);
            pick(file, id, *instance, dialect)
        }
        Commands::Tokens { file } => {
            let dialect = resolve_dialect(&cli, &config, file);
            tokens(file, dialect)
        }
    }
}

/// Flag or environment, then config file, then file extension.
fn resolve_dialect(cli: &Cli, config: &Config, file: &Path) -> MarkupDialect {
    cli.dialect
        .or(config.dialect)
        .or_else(|| MarkupDialect::from_path(file))
        .unwrap_or_default()
}

fn read_source(file: &Path) -> Result<SourceRope> {
    let text = std::fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", file.display()))?;
    Ok(SourceRope::from(text))
}

fn locate(file: &Path, path: &str, dialect: MarkupDialect) -> Result<()> {
    let rope = read_source(file)?;
    let chain: TagPath = path.parse()?;
    tracing::debug!(%chain, %dialect, "locating");

    match find_tag_in(&BufferTokens::new(&rope, dialect), &chain, dialect) {
        Ok(token) => {
            println!("{}", located(&token));
            Ok(())
        }
        Err(desync) => Err(DesyncReport::new(&file.display().to_string(), &rope, chain, desync).into()),
    }
}

fn pick(file: &Path, id: &str, instance: bool, dialect: MarkupDialect) -> Result<()> {
    let rope = read_source(file)?;
    let mut session = PreviewSession::attach(rope, dialect);
    if session.preview().is_none() {
        session.refresh_preview()?;
    }

    let (node, chain) = {
        let preview = session
            .preview()
            .ok_or_else(|| miette::miette!("no preview for {}", file.display()))?;
        let mut node = preview
            .find_by_id(id)
            .ok_or_else(|| miette::miette!("no element with id \"{id}\""))?;
        if instance {
            node = node.instance().ok_or_else(|| {
                miette::miette!("<{}> \"{id}\" has no rendered instance", node.name())
            })?;
        }
        let chain = preview
            .path_of(node.id())
            .ok_or_else(|| miette::miette!("element vanished from the preview"))?;
        (node.id(), chain)
    };
    println!("path {chain}");

    match session.handle_click(node) {
        Ok(selection) => {
            let buffer = session.buffer();
            let start = buffer
                .char_to_position(selection.start())
                .ok_or_else(|| miette::miette!("selection outside the buffer"))?;
            let text = buffer.slice(selection.to_range()).unwrap_or_default();
            println!("{} <{}>", human_position(start), text);
            Ok(())
        }
        Err(ClickError::Desync(desync)) => {
            let name = file.display().to_string();
            let rope = session.detach();
            Err(DesyncReport::new(&name, &rope, chain, desync).into())
        }
        Err(other) => Err(other.into()),
    }
}

fn tokens(file: &Path, dialect: MarkupDialect) -> Result<()> {
    let rope = read_source(file)?;
    let tokenizer = Tokenizer::new(&rope.to_string()).with_dialect(dialect);
    for token in tokenizer {
        println!("{token}");
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn init_miette() {
    let hook = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if hook.is_ok() {
        miette::set_panic_hook();
    }
}
