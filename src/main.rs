use clap::{Parser, Subcommand};
use photo_mirror::{config, output, process};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "photo-mirror")]
#[command(about = "Mirror a photo tree into resized images and thumbnails")]
#[command(long_about = "\
Mirror a photo tree into resized images and thumbnails

Every directory of the input tree is recreated under the output root. Each
image gets a resized copy, a thumbnail and, optionally, an unresized copy:

  input/                         output/
  ├── config.toml                ├── album_description
  ├── album_description          ├── a.jpg               # resized
  ├── a.jpg             ──▶      ├── thumbnails/a.jpg
  └── trip/                      ├── original/a.jpg      # big_images.enabled
      └── b.jpg                  └── trip/...

Images whose resized file and thumbnail already exist are skipped.

Settings are read from config.toml in the input directory (or --config).
Run 'photo-mirror gen-config' to generate a documented config.toml.
Set RUST_LOG=debug for diagnostics.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror the input tree into the output directory
    Build {
        /// Directory of source images
        input: PathBuf,
        /// Directory to write the mirrored tree into
        output: PathBuf,
        /// Config file (default: <input>/config.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reprocess images even if their outputs exist
        #[arg(long)]
        force: bool,
    },
    /// List the images a build would process, without writing anything
    Check {
        /// Directory of source images
        input: PathBuf,
        /// Config file (default: <input>/config.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output: output_dir,
            config: config_path,
            force,
        } => {
            let settings = load_settings(&input, config_path.as_deref())?;
            init_thread_pool(&settings.processing);

            println!("==> Mirroring {} -> {}", input.display(), output_dir.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });

            let gallery = process::Gallery::new(process::ProcessConfig::from_settings(&settings), &input)
                .with_events(tx);
            let result = gallery.build(&output_dir, force);
            // Closes the event channel so the printer drains and exits
            drop(gallery);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            let summary = result?;
            output::print_summary(&summary);
            if summary.has_failures() {
                return Err(format!(
                    "{} images and {} directories failed",
                    summary.failed, summary.directory_failures
                )
                .into());
            }
        }
        Command::Check {
            input,
            config: config_path,
        } => {
            let settings = load_settings(&input, config_path.as_deref())?;
            println!("==> Checking {}", input.display());
            let gallery =
                process::Gallery::new(process::ProcessConfig::from_settings(&settings), &input);

            let mut listings = Vec::new();
            let mut errors = Vec::new();
            for item in gallery.walker().listings() {
                match item {
                    Ok(listing) => listings.push(listing),
                    Err(e) => errors.push(e),
                }
            }
            output::print_check_output(&listings, &errors, &input);
            if !errors.is_empty() {
                return Err(format!("{} walk errors", errors.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`), so
/// they never interleave with the progress lines on stdout.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_settings(
    input: &Path,
    config_path: Option<&Path>,
) -> Result<config::GallerySettings, config::ConfigError> {
    match config_path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(input),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
