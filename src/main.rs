use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use photobooth::capture::{CaptureSource, FileSource};
use photobooth::gateway::{GeminiGateway, GifAssembler};
use photobooth::{AssemblyState, BoothConfig, ModeSelection, Orchestrator, PhotoStatus};

#[derive(Parser, Debug)]
#[command(name = "photobooth", version, about = "Restyle photos with AI and turn them into a GIF")]
struct Cli {
    /// Config file (defaults to <config dir>/photobooth/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available modes.
    Modes,
    /// Capture image files, transform them and optionally make a GIF.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Mode id: a catalog id, `custom` or `random`.
    #[arg(long)]
    mode: Option<String>,

    /// Custom prompt; selects `custom` mode unless --mode is given.
    #[arg(long)]
    prompt: Option<String>,

    /// Directory for transformed photos.
    #[arg(long, default_value = "photobooth-out")]
    out: PathBuf,

    /// Also assemble the ready photos into this GIF.
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Image files to capture, in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BoothConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match BoothConfig::default_path() {
            Some(path) => path,
            None => return Ok(BoothConfig::default()),
        },
    };
    BoothConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn list_modes(config: &BoothConfig) -> anyhow::Result<()> {
    let catalog = config.catalog()?;
    for entry in catalog.selector() {
        let selection = catalog.parse_selection(&entry.id)?;
        println!(
            "{} {:<12} {:<12} {}",
            entry.icon,
            entry.id,
            entry.name,
            catalog.hint(&selection, "")
        );
    }
    Ok(())
}

async fn run(config: BoothConfig, args: RunArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(config.catalog()?);
    let initial_mode = config.initial_mode(&catalog)?;

    let transformer = GeminiGateway::new(&config.gemini);
    if !transformer.has_api_key() {
        anyhow::bail!("no Gemini API key: set GEMINI_API_KEY or gemini.api_key in the config");
    }
    tracing::info!(model = transformer.model(), "Using Gemini model");

    let booth = Orchestrator::new(
        catalog,
        initial_mode,
        Arc::new(transformer),
        Arc::new(GifAssembler::from_config(&config.gif)),
    );

    if let Some(prompt) = args.prompt {
        booth.set_custom_prompt(prompt);
        if args.mode.is_none() {
            booth.set_mode(ModeSelection::Custom)?;
        }
    }
    if let Some(mode) = &args.mode {
        booth.set_mode_id(mode)?;
    }

    // Step 1: Capture every file; transformations start immediately
    let mut source = FileSource::new(&args.files, config.capture.clone());
    while source.remaining() > 0 {
        let frame = source.grab()?;
        booth.capture(frame)?;
    }

    // Step 2: Wait for all transformations and save what succeeded
    let state = booth.settled().await;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    for (index, photo) in state.photos().iter().enumerate() {
        match &photo.status {
            PhotoStatus::Ready { output } => {
                let path = args
                    .out
                    .join(format!("{:02}-{}.png", index + 1, photo.mode.label()));
                output
                    .image()
                    .save(&path)
                    .with_context(|| format!("saving {}", path.display()))?;
                println!("{} {}", booth.catalog().icon_for(&photo.mode), path.display());
            }
            PhotoStatus::Failed { reason } => {
                eprintln!("❌ photo {} failed: {reason}", index + 1);
            }
            PhotoStatus::Pending => {}
        }
    }

    // Step 3: Optionally make the GIF
    let Some(gif_path) = args.gif else {
        return Ok(());
    };
    if !state.can_assemble() {
        eprintln!(
            "⚠️  Need at least 2 transformed photos for a GIF, have {}",
            state.ready_count()
        );
        return Ok(());
    }

    booth.assemble()?;
    let state = booth.settled().await;
    match state.assembly() {
        AssemblyState::Ready(artifact) => {
            tokio::fs::write(&gif_path, artifact.data.as_slice())
                .await
                .with_context(|| format!("writing {}", gif_path.display()))?;
            println!("🎞️ {} ({} frames)", gif_path.display(), artifact.frame_count);
            Ok(())
        }
        _ => anyhow::bail!(
            "assembly failed: {}",
            state.assembly_error().unwrap_or("unknown error")
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("photobooth=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Modes => list_modes(&config),
        Command::Run(args) => run(config, args).await,
    }
}
