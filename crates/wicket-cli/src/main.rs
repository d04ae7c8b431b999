//! Scripted access-session emulator and deployment checker.
//!
//! Runs the full controller pipeline against an emulated keypad and
//! vision stack, so a deployment's configuration, user cache, and
//! audit trail can be exercised without device hardware.
//!
//! ```text
//! wicket run --cache users.json --keys "1234#" [--config wicket.json] [--score 42.5]
//! wicket check --config wicket.json [--cache users.json]
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wicket_audit::{EventLogger, FileAppender};
use wicket_core::{ControllerConfig, KeyEvent, Symbol};
use wicket_directory::{DirectorySnapshot, UserDirectory, cache};
use wicket_engine::{AccessPipeline, DecisionEngine};
use wicket_hardware::mock::{MockCamera, MockDetector, MockMatcher, MockReferenceLoader};
use wicket_hardware::types::RawImage;
use wicket_vision::FaceVerifier;

const USAGE: &str = "usage:
  wicket run --cache <users.json> --keys <entry> [--config <path>] [--score <f32>]
  wicket check --config <path> [--cache <users.json>]

  --cache   user directory cache (JSON array of user records)
  --keys    keypad entry script, e.g. \"1234#\" or \"99*1234#\"
  --config  controller configuration (JSON); defaults apply if omitted
  --score   matcher score the emulated vision stack reports
            (defaults to the configured threshold, which passes)";

struct Args {
    command: String,
    config: Option<PathBuf>,
    cache: Option<PathBuf>,
    keys: Option<String>,
    score: Option<f32>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut argv = env::args().skip(1);
    let command = argv.next().context(USAGE)?;

    let mut args = Args {
        command,
        config: None,
        cache: None,
        keys: None,
        score: None,
    };

    while let Some(flag) = argv.next() {
        let mut value = || argv.next().with_context(|| format!("{flag} needs a value"));
        match flag.as_str() {
            "--config" => args.config = Some(PathBuf::from(value()?)),
            "--cache" => args.cache = Some(PathBuf::from(value()?)),
            "--keys" => args.keys = Some(value()?),
            "--score" => args.score = Some(value()?.parse().context("--score must be a number")?),
            _ => bail!("unknown flag {flag}\n{USAGE}"),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ControllerConfig> {
    let config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ControllerConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn load_directory(path: &PathBuf) -> anyhow::Result<DirectorySnapshot> {
    cache::load(path).with_context(|| format!("loading user cache {}", path.display()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    match args.command.as_str() {
        "run" => run(args).await,
        "check" => check(args),
        other => bail!("unknown command {other}\n{USAGE}"),
    }
}

/// Drive one scripted keypad session through the full pipeline and
/// print the audit records it produced.
async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let cache_path = args.cache.context(format!("--cache is required\n{USAGE}"))?;
    let keys = args.keys.context(format!("--keys is required\n{USAGE}"))?;

    let snapshot = load_directory(&cache_path)?;
    let directory = Arc::new(UserDirectory::with_snapshot(snapshot));

    let verifier = config
        .face_verification
        .then(|| emulated_verifier(&config, &directory, args.score));

    let appender = FileAppender::open(&config.audit_log_path).with_context(|| {
        format!("opening audit log {}", config.audit_log_path.display())
    })?;
    let lines_before = audit_line_count(&config);

    let engine = DecisionEngine::new(
        &config,
        directory,
        verifier,
        EventLogger::local_only(appender),
    );
    let pipeline = AccessPipeline::new(&config, engine);

    // The whole script is queued before the pipeline drains it.
    let (tx, rx) = mpsc::channel(keys.len().max(1));
    for c in keys.chars() {
        let symbol = Symbol::from_char(c)
            .with_context(|| format!("key {c:?} is not on the keypad"))?;
        tx.send(KeyEvent::pressed(symbol)).await?;
    }
    drop(tx);

    pipeline.run(rx).await?;
    info!("session complete");

    let log = fs::read_to_string(&config.audit_log_path)?;
    for line in log.lines().skip(lines_before) {
        println!("{line}");
    }
    Ok(())
}

/// Validate a deployment's configuration and, optionally, its user
/// cache.
fn check(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    println!("config ok");
    println!("  pin_length: {}", config.pin_length);
    println!(
        "  face_verification: {} (threshold {}, {:?})",
        config.face_verification, config.match_threshold, config.score_direction
    );
    println!("  audit_log_path: {}", config.audit_log_path.display());

    if let Some(cache_path) = &args.cache {
        let snapshot = load_directory(cache_path)?;
        println!("cache ok: {} users", snapshot.len());
        let mut records = snapshot.records();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        for record in records {
            println!("  {} ({})", record.id, record.name);
        }
    }
    Ok(())
}

/// Build the emulated vision stack: every cached user enrolled, a
/// camera that always delivers, and a matcher pinned to one score.
fn emulated_verifier(
    config: &ControllerConfig,
    directory: &UserDirectory,
    score: Option<f32>,
) -> FaceVerifier<MockReferenceLoader, MockCamera, MockDetector, MockMatcher> {
    let mut loader = MockReferenceLoader::new();
    for record in directory.snapshot().records() {
        loader.enroll(&record.reference_image);
    }

    // The threshold itself passes in either score direction, so the
    // default emulates a cooperative subject.
    let score = score.unwrap_or(config.match_threshold);

    FaceVerifier::new(
        config,
        loader,
        MockCamera::repeating(RawImage::new(vec![127; 64 * 64], 64, 64), 256),
        MockDetector::always(),
        MockMatcher::with_score(score),
    )
}

fn audit_line_count(config: &ControllerConfig) -> usize {
    fs::read_to_string(&config.audit_log_path)
        .map(|log| log.lines().count())
        .unwrap_or(0)
}
