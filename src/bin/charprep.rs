use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use charprep::bytes::{bytes_to_text, display_char, text_to_bytes};
use charprep::config::{
    CodeWidth, Compression, InputConfig, NormalizationMode, OutputConfig, PipelineConfig,
};
use charprep::corpus::load_raw_dump;
use charprep::normalize;
use charprep::pipeline::load_token_file;
use charprep::serialization::{self, Metadata};
use charprep::Pipeline;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

const DEFAULT_OUTPUT_DIR: &str = ".";

#[derive(Parser, Debug)]
#[command(author, version, about = "Character-level corpus preparation", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepare train/val token files and metadata from a raw dump
    Prepare(PrepareArgs),
    /// Run only the normalizer and write the cleaned text
    Clean(CleanArgs),
    /// Decode a token file back into text
    Decode(DecodeArgs),
    /// Inspect vocabulary metadata
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Raw dump to read (plain, .bz2 or .zip)
    input: PathBuf,

    /// Directory receiving the token and metadata files
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Fraction of codes placed in the training split
    #[arg(long, value_name = "RATIO")]
    train_ratio: Option<f64>,

    /// Width of each code in the token files
    #[arg(long, value_enum, default_value_t = WidthArg::U16)]
    code_width: WidthArg,

    /// Encode the decoded dump verbatim instead of stripping wiki markup
    #[arg(long)]
    raw: bool,

    /// Input compression
    #[arg(long, value_enum, default_value_t = CompressionArg::Auto)]
    compression: CompressionArg,

    /// Archive member to extract from a zip input
    #[arg(long, value_name = "NAME")]
    member: Option<String>,

    /// Training token file name
    #[arg(long, value_name = "NAME")]
    train_file: Option<String>,

    /// Validation token file name
    #[arg(long, value_name = "NAME")]
    val_file: Option<String>,

    /// Metadata file name
    #[arg(long, value_name = "NAME")]
    meta_file: Option<String>,

    /// Optional path for a JSON report of per-stage metrics
    #[arg(long, value_name = "PATH")]
    metrics: Option<PathBuf>,

    /// Disable the progress spinner and per-stage logging
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Raw dump to read (plain, .bz2 or .zip)
    input: PathBuf,

    /// Output file for the cleaned text (defaults to stdout)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Input compression
    #[arg(long, value_enum, default_value_t = CompressionArg::Auto)]
    compression: CompressionArg,

    /// Archive member to extract from a zip input
    #[arg(long, value_name = "NAME")]
    member: Option<String>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Metadata file describing the vocabulary
    #[arg(short = 'm', long, value_name = "PATH")]
    meta: PathBuf,

    /// Token file to decode
    tokens: PathBuf,

    /// Skip this many codes before decoding
    #[arg(long, value_name = "COUNT", default_value_t = 0)]
    offset: usize,

    /// Decode at most this many codes
    #[arg(long, value_name = "COUNT")]
    limit: Option<usize>,

    /// Output file for decoded bytes (defaults to stdout)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Metadata file to inspect
    #[arg(short = 'm', long, value_name = "PATH")]
    meta: PathBuf,

    /// Emit machine-readable JSON summary
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum WidthArg {
    /// 16-bit codes (up to 65536 characters)
    U16,
    /// 32-bit codes
    U32,
}

impl From<WidthArg> for CodeWidth {
    fn from(arg: WidthArg) -> Self {
        match arg {
            WidthArg::U16 => CodeWidth::U16,
            WidthArg::U32 => CodeWidth::U32,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CompressionArg {
    /// Detect from the file extension (.bz2, .zip)
    Auto,
    /// Read the file as-is
    None,
    /// Decompress bzip2
    Bzip2,
    /// Extract a zip archive member
    Zip,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Auto => Compression::Auto,
            CompressionArg::None => Compression::None,
            CompressionArg::Bzip2 => Compression::Bzip2,
            CompressionArg::Zip => Compression::Zip,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Prepare(args) => run_prepare(args),
        Commands::Clean(args) => run_clean(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let defaults = PipelineConfig::default();
    let output = OutputConfig {
        train_file: args.train_file.unwrap_or(defaults.output.train_file),
        val_file: args.val_file.unwrap_or(defaults.output.val_file),
        meta_file: args.meta_file.unwrap_or(defaults.output.meta_file),
    };
    let normalization = if args.raw {
        NormalizationMode::Raw
    } else {
        NormalizationMode::Wiki
    };
    let cfg = PipelineConfig::builder()
        .train_ratio(args.train_ratio.unwrap_or(defaults.train_ratio))
        .code_width(args.code_width.into())
        .normalization(normalization)
        .show_progress(!args.no_progress)
        .output(output)
        .build()?;
    let ingest = InputConfig {
        compression: args.compression.into(),
        member: args.member,
    };

    let spinner = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} preparing corpus... {elapsed}")
            .context("invalid progress template")?;
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let pipeline = Pipeline::new(cfg);
    let start = Instant::now();
    let result = pipeline.run(&args.input, &ingest, &args.output_dir);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let (artifacts, paths) = result.with_context(|| {
        format!("failed to prepare corpus from {}", args.input.display())
    })?;
    let elapsed = start.elapsed();
    debug!("{artifacts}");

    if let Some(path) = &args.metrics {
        write_json(path, &artifacts.metrics)?;
        info!("wrote stage metrics to {}", path.display());
    }

    let corpus = &artifacts.corpus;
    info!(
        "preparation complete: vocab={} train={} val={} duration={elapsed:.2?}",
        corpus.vocab.len(),
        corpus.train.len(),
        corpus.val.len()
    );
    println!(
        "wrote {} train / {} val tokens (vocab {}) to {}, {} and {}",
        corpus.train.len(),
        corpus.val.len(),
        corpus.vocab.len(),
        paths.train.display(),
        paths.val.display(),
        paths.meta.display()
    );
    if let Some(peak) = artifacts.metrics.peak_rss_kb() {
        println!(
            "   duration {elapsed:.2?} | peak rss {:.2} MiB",
            peak as f64 / 1024.0
        );
    }
    Ok(())
}

fn run_clean(args: CleanArgs) -> Result<()> {
    let ingest = InputConfig {
        compression: args.compression.into(),
        member: args.member,
    };
    let raw = load_raw_dump(&args.input, &ingest)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let cleaned = normalize::normalize(&bytes_to_text(&raw))
        .with_context(|| format!("failed to normalize {}", args.input.display()))?;
    let bytes = text_to_bytes(&cleaned)?;
    write_output(args.output.as_deref(), &bytes)
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let (vocab, code_width) = serialization::load_metadata(&args.meta)
        .with_context(|| format!("failed to load metadata from {}", args.meta.display()))?;
    let codes = load_token_file(&args.tokens, code_width, &vocab)
        .with_context(|| format!("failed to load tokens from {}", args.tokens.display()))?;

    if args.offset > codes.len() {
        return Err(anyhow!(
            "offset {} exceeds the {} codes in {}",
            args.offset,
            codes.len(),
            args.tokens.display()
        ));
    }
    let end = args
        .limit
        .map_or(codes.len(), |limit| args.offset.saturating_add(limit).min(codes.len()));
    let text = vocab.decode(&codes[args.offset..end])?;
    let bytes = text_to_bytes(&text)?;
    write_output(args.output.as_deref(), &bytes)
}

fn run_info(args: InfoArgs) -> Result<()> {
    let (vocab, code_width) = serialization::load_metadata(&args.meta)
        .with_context(|| format!("failed to load metadata from {}", args.meta.display()))?;

    if args.json {
        let summary = Metadata::new(&vocab, code_width);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Metadata: {}", args.meta.display());
    println!("Vocab size: {}", vocab.len());
    println!("Code width: {code_width}");
    let listing: String = vocab.chars().iter().map(|&ch| display_char(ch)).collect();
    println!("Characters: {listing}");
    Ok(())
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    if let Some(path) = path {
        let mut file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {} bytes to {}", bytes.len(), path.display());
    } else {
        io::stdout().write_all(bytes)?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("failed to serialise {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
