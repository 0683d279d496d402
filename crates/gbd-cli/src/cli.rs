//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use gbd_domain::InstanceFormat;
use std::path::PathBuf;

/// GBD - identify, analyze and transform SAT-family instance files.
#[derive(Debug, Parser)]
#[command(name = "gbd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Configuration file path (default: ~/.gbd/config.toml)
    #[arg(short, long, global = true, env = "GBD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Human-readable (default)
    Plain,
    /// JSON, one object per line
    Json,
    /// Comma-separated values
    Csv,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the gbdhash of a file, detecting its format from the name
    Id(FileArgs),

    /// Print the gbdhash of a file as an instance of the given kind
    Hash(HashArgs),

    /// Print the isohash of a CNF file (invariant under renaming and polarity flips)
    Isohash(FileArgs),

    /// Extract base features of a single file
    Extract(ExtractArgs),

    /// Extract base features of many files in a memory-bounded pool
    Batch(BatchArgs),

    /// Print a CNF file without comments under a recomputed header
    Normalize(FileArgs),

    /// Print a CNF file without duplicate literals and tautologies
    Sanitize(FileArgs),

    /// Check that a CNF file has no duplicate literals and no tautologies
    CheckSanitized(FileArgs),

    /// Reduce a CNF file to a k-independent-set problem
    Cnf2kis(KisArgs),
}

/// A single instance file.
#[derive(Debug, Parser)]
pub struct FileArgs {
    /// Instance file (optionally .gz, .xz, .lzma or .bz2 compressed)
    pub file: PathBuf,
}

/// Arguments for the hash command.
#[derive(Debug, Parser)]
pub struct HashArgs {
    /// Instance kind
    #[arg(short, long, value_enum)]
    pub kind: KindArg,

    /// Instance file
    pub file: PathBuf,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Feature extractor (default: detected from the file name)
    #[arg(short, long, value_enum)]
    pub kind: Option<ExtractorArg>,

    /// Instance file
    pub file: PathBuf,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Memory ceiling for all jobs together, in MiB
    #[arg(short, long)]
    pub mem_max: Option<usize>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Feature extractor
    #[arg(short, long, value_enum, default_value = "cnf")]
    pub kind: ExtractorArg,

    /// Instance files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the cnf2kis command.
#[derive(Debug, Parser)]
pub struct KisArgs {
    /// Skip the reduction if it would have more edges (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_edges: u64,

    /// Skip the reduction if it would have more nodes (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_nodes: u64,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// CNF instance file
    pub file: PathBuf,
}

/// Instance kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// DIMACS CNF
    Cnf,
    /// Weighted CNF (MaxSAT)
    Wcnf,
    /// Pseudo-Boolean
    Opb,
    /// QDIMACS
    Qbf,
}

/// Feature extractor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExtractorArg {
    /// CNF base features
    Cnf,
    /// WCNF base features
    Wcnf,
    /// OPB base features
    Opb,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Plain => crate::config::OutputFormat::Plain,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Csv => crate::config::OutputFormat::Csv,
        }
    }
}

impl From<KindArg> for InstanceFormat {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cnf => InstanceFormat::Cnf,
            KindArg::Wcnf => InstanceFormat::Wcnf,
            KindArg::Opb => InstanceFormat::Opb,
            KindArg::Qbf => InstanceFormat::Qbf,
        }
    }
}
