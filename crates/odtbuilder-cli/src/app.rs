//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use odtbuilder_ast::NodeTree;
use odtbuilder_core::{BuilderConfig, DocumentBuilder, LocalUploadStore};

#[derive(Parser)]
#[command(name = "odtbuilder")]
#[command(author, version, about = "Page-builder documents to OpenDocument Text", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an .odt file from an editor payload
    Build {
        /// Payload JSON file ("-" reads stdin)
        input: PathBuf,

        /// Output ODT file (defaults to the configured filename)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Upload directory backing /static/images/
        #[arg(long)]
        uploads: Option<PathBuf>,

        /// Do not fetch remote images
        #[arg(long)]
        offline: bool,
    },

    /// Store an image in the upload directory and print its static path
    Upload {
        /// Image file
        image: PathBuf,

        /// Upload directory
        #[arg(long)]
        uploads: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            uploads,
            offline,
        } => {
            build_command(
                &input,
                output.as_deref(),
                config.as_deref(),
                uploads.as_deref(),
                offline,
            )?;
        }
        Commands::Upload {
            image,
            uploads,
            config,
        } => {
            let path = upload_command(&image, uploads.as_deref(), config.as_deref())?;
            println!("{}", path);
        }
    }

    Ok(())
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // A subscriber may already be installed (e.g. by a test harness)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the configuration file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<BuilderConfig> {
    match path {
        Some(path) => BuilderConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(BuilderConfig::default()),
    }
}

/// Execute the build command
///
/// Returns the path of the written document.
pub fn build_command(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    uploads: Option<&Path>,
    offline: bool,
) -> Result<PathBuf> {
    let mut config = load_config(config)?;
    if let Some(uploads) = uploads {
        config.uploads.dir = uploads.to_path_buf();
    }
    if offline {
        config.images.remote = false;
    }

    let payload = read_payload(input)?;
    let tree = NodeTree::from_json_str(&payload)
        .with_context(|| format!("Invalid payload: {}", input.display()))?;
    log::info!("Building {} ({} nodes)", input.display(), tree.len());

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.output.filename));

    let builder = DocumentBuilder::new(config);
    let bytes = builder
        .render(&tree)
        .context("Failed to generate document")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    println!("Created: {} ({} bytes)", output.display(), bytes.len());
    Ok(output)
}

/// Execute the upload command
///
/// Returns the static path under which the image is served.
pub fn upload_command(image: &Path, uploads: Option<&Path>, config: Option<&Path>) -> Result<String> {
    let config = load_config(config)?;
    let dir = uploads
        .map(Path::to_path_buf)
        .unwrap_or(config.uploads.dir);

    if !image.exists() {
        anyhow::bail!("Image file not found: {}", image.display());
    }
    let bytes = fs::read(image)
        .with_context(|| format!("Failed to read image: {}", image.display()))?;
    let original_name = image
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let store = LocalUploadStore::new(dir);
    store
        .save(&bytes, original_name)
        .with_context(|| format!("Failed to store upload in {}", store.root().display()))
}

fn read_payload(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("Failed to read payload from stdin")?;
        return Ok(payload);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    fs::read_to_string(input)
        .with_context(|| format!("Failed to read payload: {}", input.display()))
}
