/// BDC command-line tool: inspect, validate, encode, decode, and analyse
/// BodyCap sample capsules (`.bdc`) and bare sensor frames.
///
/// # Command overview
///
/// ```text
/// bdc <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print a per-frame summary of a capsule
///   validate   Check a capsule (or bare frame) for correctness
///   encode     Create a capsule from a JSON manifest
///   decode     Decompress to CSV or JSON
///   stats      Print sample and compression statistics
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decoder activity to stderr (RUST_LOG overrides)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid file, etc.) |
///
/// All error details and logs are written to stderr so stdout can be
/// piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod cmd_decode;
mod cmd_encode;
mod cmd_inspect;
mod cmd_stats;
mod cmd_validate;
mod manifest;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// BodyCap sample decompression tool.
#[derive(Parser)]
#[command(name = "bdc", version, about = "BodyCap sample capsule CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decoder and encoder activity at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print a per-frame summary of a capsule.
    Inspect(InspectArgs),
    /// Check a capsule or bare frame for correctness.
    Validate(ValidateArgs),
    /// Create a capsule from a JSON manifest.
    Encode(EncodeArgs),
    /// Decompress a capsule or bare frame to CSV or JSON.
    Decode(DecodeArgs),
    /// Print sample and compression statistics.
    Stats(StatsArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `bdc inspect`.
///
/// ```text
/// ┌─────────────┬──────────────────────────────────────────────┐
/// │ Flag        │ Effect                                       │
/// ├─────────────┼──────────────────────────────────────────────┤
/// │ --show-hex  │ Hex dump of each frame's bitstream           │
/// │ --frame N   │ Show only the frame at index N               │
/// └─────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the capsule to inspect.
    pub file: PathBuf,

    /// Show a hex dump of each frame (16 bytes per line).
    #[arg(long)]
    pub show_hex: bool,

    /// Inspect only the frame at this zero-based index.
    #[arg(long)]
    pub frame: Option<usize>,
}

/// Arguments for `bdc validate`.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the capsule or bare frame to validate.
    pub file: PathBuf,
}

/// Arguments for `bdc encode`.
///
/// ```text
/// ┌────────────────┬──────────────────────────────────────────────┐
/// │ Flag           │ Effect                                       │
/// ├────────────────┼──────────────────────────────────────────────┤
/// │ --frame-size N │ Frame capacity in bytes (default 244)        │
/// │ --period P     │ Sampling period, overrides the manifest      │
/// │ --no-checksum  │ Omit the sample count + BLAKE3 trailer       │
/// └────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Path to the JSON manifest describing the records.
    pub input: PathBuf,

    /// Output capsule path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum frame size in bytes.
    #[arg(long, default_value_t = bdc_encoder::encoder::DEFAULT_FRAME_CAPACITY)]
    pub frame_size: usize,

    /// Sampling period in seconds.
    #[arg(long)]
    pub period: Option<u16>,

    /// Do not append the checksum trailer.
    #[arg(long)]
    pub no_checksum: bool,
}

/// Output format of `bdc decode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `time,temperature,celsius` rows with a header line.
    Csv,
    /// A manifest object, which `bdc encode` accepts back.
    Json,
}

/// Arguments for `bdc decode`.
///
/// ```text
/// ┌───────────────┬──────────────────────────────────────────────┐
/// │ Flag          │ Values / default                             │
/// ├───────────────┼──────────────────────────────────────────────┤
/// │ --format      │ csv (default) | json                         │
/// │ --stream      │ decode frame by frame from the file          │
/// │ --no-verify   │ skip the checksum comparison                 │
/// │ -o / --output │ write to file instead of stdout              │
/// └───────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Path to the capsule or bare frame to decode.
    pub file: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Use the streaming decoder (capsules only).
    #[arg(long)]
    pub stream: bool,

    /// Do not compare the decoded records with the capsule checksum.
    #[arg(long)]
    pub no_verify: bool,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `bdc stats`.
#[derive(clap::Args)]
pub struct StatsArgs {
    /// Path to the capsule or bare frame to analyse.
    pub file: PathBuf,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Encode(args) => cmd_encode::run(&args),
        Commands::Decode(args) => cmd_decode::run(&args),
        Commands::Stats(args) => cmd_stats::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` selects `debug`, and the
/// default only shows warnings (dropped samples, reserved codes).
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
