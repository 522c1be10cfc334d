//! openrisk — thin command-line front end for the detection and scoring
//! engine. Reads one file or a directory of files, builds a
//! `NormalizedContext` from flags, runs the orchestrator and scorer, and
//! prints one `ScoringResult` per file as JSON. Everything heavier than
//! that (config files, cloud SDKs, a real filesystem walker, reports) is
//! out of scope for this binary; `openrisk-core` is where the behavior
//! lives.

use clap::{Parser, ValueEnum};
use openrisk_core::{
    Encryption, EngineConfig, Exposure, LabelSet, NormalizedContext, Orchestrator, StructuredKind, WireOptions,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "openrisk", version, about = "Scan a file or directory for sensitive data and print a risk score", long_about = None)]
struct Cli {
    /// File or directory to scan.
    path: PathBuf,

    /// Exposure level of the storage location this content lives in.
    #[arg(long, value_enum, default_value = "private")]
    exposure: ExposureArg,

    /// Encryption-at-rest state of the storage location.
    #[arg(long, value_enum, default_value = "platform")]
    encryption: EncryptionArg,

    /// Access logging is enabled for the storage location.
    #[arg(long)]
    access_logging: bool,

    /// Versioning is enabled for the storage location.
    #[arg(long)]
    versioning: bool,

    /// Days since the content was last modified.
    #[arg(long, default_value_t = 0)]
    staleness_days: u32,

    /// The storage location is accessible cross-account.
    #[arg(long)]
    cross_account: bool,

    /// Comma-separated list of already-known entity values to pre-tag.
    #[arg(long, value_delimiter = ',')]
    known_entity: Vec<String>,

    /// Treat input as structured data of this kind before detector fan-out.
    #[arg(long, value_enum)]
    structured: Option<StructuredArg>,

    /// Per-scan deadline in milliseconds.
    #[arg(long, default_value_t = 2_000)]
    timeout_ms: u64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExposureArg {
    Private,
    Internal,
    OverExposed,
    Public,
}

impl From<ExposureArg> for Exposure {
    fn from(value: ExposureArg) -> Self {
        match value {
            ExposureArg::Private => Exposure::Private,
            ExposureArg::Internal => Exposure::Internal,
            ExposureArg::OverExposed => Exposure::OverExposed,
            ExposureArg::Public => Exposure::Public,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EncryptionArg {
    None,
    Platform,
    CustomerManaged,
}

impl From<EncryptionArg> for Encryption {
    fn from(value: EncryptionArg) -> Self {
        match value {
            EncryptionArg::None => Encryption::None,
            EncryptionArg::Platform => Encryption::Platform,
            EncryptionArg::CustomerManaged => Encryption::CustomerManaged,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StructuredArg {
    Json,
    Csv,
}

impl From<StructuredArg> for StructuredKind {
    fn from(value: StructuredArg) -> Self {
        match value {
            StructuredArg::Json => StructuredKind::Json,
            StructuredArg::Csv => StructuredKind::Csv,
        }
    }
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("openrisk: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let context = NormalizedContext {
        exposure: cli.exposure.into(),
        encryption: cli.encryption.into(),
        access_logging: cli.access_logging,
        versioning: cli.versioning,
        staleness_days: cli.staleness_days,
        cross_account: cli.cross_account,
        has_classification: false,
        classification_source: String::new(),
    };

    let orchestrator = Orchestrator::new(EngineConfig::default());
    let deadline = Duration::from_millis(cli.timeout_ms);
    let known_entities = if cli.known_entity.is_empty() { None } else { Some(cli.known_entity.as_slice()) };
    let structured_kind = cli.structured.map(Into::into);

    for path in files_under(&cli.path)? {
        scan_one(&orchestrator, &path, deadline, known_entities, structured_kind, &context)?;
    }
    Ok(())
}

/// Single file, or every regular file under a directory, one level of
/// `walkdir` enumeration -- no symlink following, no ignore-file parsing.
fn files_under(path: &std::path::Path) -> Result<Vec<PathBuf>, String> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| format!("walking {}: {e}", path.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn scan_one(
    orchestrator: &Orchestrator,
    path: &std::path::Path,
    deadline: Duration,
    known_entities: Option<&[String]>,
    structured_kind: Option<StructuredKind>,
    context: &NormalizedContext,
) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => {
            warn!(path = %path.display(), "skipping non-UTF-8 file");
            return Ok(());
        }
    };

    let detect_result = orchestrator
        .detect(&text, deadline, known_entities, structured_kind)
        .map_err(|e| format!("scanning {}: {e}", path.display()))?;

    let now = chrono::Utc::now().timestamp();
    let labels = LabelSet::from_spans(&detect_result.spans, "openrisk-cli:0.1", now);
    let result = openrisk_core::score(&labels, context);

    info!(path = %path.display(), score = result.score, degraded = detect_result.degraded, "scanned");

    let wire = result.to_wire(WireOptions {
        content: &text,
        filtered: detect_result.filtered_entity_types.clone(),
        algorithm: "openrisk-scoring-v1",
        confidence_threshold: orchestrator.config().rescan_confidence,
        mode: "batch",
        generator: "openrisk-cli:0.1",
        generated_at: now,
    });

    let output = serde_json::json!({
        "path": path.display().to_string(),
        "degraded": detect_result.degraded,
        "result": wire,
    });
    println!("{}", serde_json::to_string(&output).map_err(|e| e.to_string())?);
    Ok(())
}

