use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::GenericImageView;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use garment_proto::report::{CropRecord, CropReport, DetectionReport, FailureRecord, ItemRecord, Rect};
use garment_session::{Session, SessionSettings, ViewState};
use garment_vision::crop::{BatchPolicy, CroppedImage, ImageCropper, DEFAULT_PADDING};
use garment_vision::detector::ReplayDetector;
use garment_vision::item::DEFAULT_CONF_THRESHOLD;
use garment_vision::prepare::DEFAULT_MAX_DIMENSION;
use garment_vision::{doctor, ClothingItem};

type CliSession = Session<ReplayDetector, ImageCropper>;

#[derive(Debug, Parser)]
#[command(name = "garment", version, about = "garment - clothing detection and region cropping")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the config file.
    Doctor,
    /// Detect clothing and print the kept items as JSON.
    Detect {
        #[arg(long)]
        image: PathBuf,
        /// Recorded detections (overrides detection.detections_file).
        #[arg(long)]
        detections: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Detect, then crop one item (by index) or all of them into PNG files.
    Crop {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        detections: Option<PathBuf>,
        #[arg(long)]
        item: Option<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    detection: DetectionCfg,
    #[serde(default)]
    crop: CropCfg,
}

#[derive(Debug, serde::Deserialize)]
struct DetectionCfg {
    #[serde(default = "default_threshold")]
    confidence_threshold: f32,
    #[serde(default = "default_max_dimension")]
    max_dimension: u32,
    detections_file: Option<PathBuf>,
}

#[derive(Debug, serde::Deserialize)]
struct CropCfg {
    #[serde(default = "default_padding")]
    padding: f64,
    #[serde(default)]
    policy: BatchPolicy,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
}

impl Default for CropCfg {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            policy: BatchPolicy::default(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_threshold() -> f32 { DEFAULT_CONF_THRESHOLD }
fn default_max_dimension() -> u32 { DEFAULT_MAX_DIMENSION }
fn default_padding() -> f64 { DEFAULT_PADDING }
fn default_output_dir() -> PathBuf { PathBuf::from("crops") }

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    parse_config(&s)
}

fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor_cmd(&cfg)?,
        Command::Detect { image, detections, threshold } => detect_cmd(&cfg, &image, detections, threshold).await?,
        Command::Crop { image, detections, item, out } => crop_cmd(&cfg, &image, detections, item, out).await?,
    }
    Ok(())
}

fn doctor_cmd(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    doctor::check_detection(cfg.detection.confidence_threshold, cfg.detection.max_dimension)?;
    doctor::check_crop(cfg.crop.padding)?;

    match &cfg.detection.detections_file {
        Some(p) => anyhow::ensure!(p.is_file(), "detection.detections_file not found: {}", p.display()),
        None => warn!("doctor: no detection.detections_file; pass --detections on each run"),
    }

    info!("doctor: OK");
    println!("OK");
    Ok(())
}

async fn detect_cmd(cfg: &Config, image: &Path, detections: Option<PathBuf>, threshold: Option<f32>) -> Result<()> {
    let mut settings = settings_from(cfg);
    if let Some(t) = threshold {
        settings.confidence_threshold = t;
    }
    validate_settings(&settings)?;
    let session = run_detection(cfg, settings, image, detections).await?;

    let report = detection_report(&session, image);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn crop_cmd(
    cfg: &Config,
    image: &Path,
    detections: Option<PathBuf>,
    item: Option<usize>,
    out: Option<PathBuf>,
) -> Result<()> {
    let settings = settings_from(cfg);
    validate_settings(&settings)?;
    let policy = settings.batch_policy;
    let session = run_detection(cfg, settings, image, detections).await?;
    let out_dir = out.unwrap_or_else(|| cfg.crop.output_dir.clone());

    // Cropping and PNG encoding are CPU/disk bound; keep them off the runtime.
    let (requested, cropped, failures) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut session = session;
        let items = session.items().to_vec();
        let (requested, failures) = crop_items(&mut session, item)?;
        let cropped = write_crops(session.cropped_images(), &items, &out_dir)?;
        Ok((requested, cropped, failures))
    })
    .await
    .context("crop task")??;

    eprintln!("{}", batch_summary(policy, cropped.len(), requested));

    let report = CropReport {
        ts_unix_ms: now_ms(),
        image: image.display().to_string(),
        policy: policy_name(policy).to_string(),
        requested,
        cropped,
        failures,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Same checks as `doctor`, applied to the settings a run will actually use.
fn validate_settings(s: &SessionSettings) -> Result<()> {
    doctor::check_detection(s.confidence_threshold, s.max_dimension)?;
    doctor::check_crop(s.padding)?;
    Ok(())
}

/// Crop item `item` (by detection index), or every item when `None`.
/// Returns how many crops were requested and the per-item failures.
fn crop_items(session: &mut CliSession, item: Option<usize>) -> Result<(usize, Vec<FailureRecord>)> {
    match item {
        Some(idx) => {
            let found = session.items().len();
            let id = session
                .items()
                .get(idx)
                .map(|i| i.id())
                .with_context(|| format!("no item {} (found {})", idx, found))?;
            session.select_item(id);
            session.crop_selected().context("crop item")?;
            Ok((1, Vec::new()))
        }
        None => {
            let batch = session.crop_all().context("crop all items")?;
            let failures = batch
                .failures
                .iter()
                .map(|f| FailureRecord { index: f.index, item_id: f.item_id, error: f.error.to_string() })
                .collect();
            Ok((batch.requested, failures))
        }
    }
}

/// Save each crop as `<index>-<label>.png` under `out_dir`, where index is
/// the source item's position in `items`.
fn write_crops(cropped: &[CroppedImage], items: &[ClothingItem], out_dir: &Path) -> Result<Vec<CropRecord>> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let mut records = Vec::with_capacity(cropped.len());
    for c in cropped {
        let src = c.source_item();
        let index = items
            .iter()
            .position(|i| i.id() == src.id())
            .with_context(|| format!("crop {} has no matching item ({})", c.id(), src.label()))?;
        let path = out_dir.join(crop_file_name(index, src.label()));
        c.image().save(&path).with_context(|| format!("write {}", path.display()))?;

        let r = c.crop_rect();
        let (width, height) = c.image().dimensions();
        records.push(CropRecord {
            item_id: src.id(),
            label: src.label().to_string(),
            rect: Rect { x: r.x, y: r.y, w: r.w, h: r.h },
            width,
            height,
            path: path.display().to_string(),
        });
    }
    Ok(records)
}

fn batch_summary(policy: BatchPolicy, cropped: usize, requested: usize) -> String {
    let rule = match policy {
        BatchPolicy::BestEffort => "failed items are skipped and listed under failures",
        BatchPolicy::AllOrNothing => "any failure aborts the batch",
    };
    format!("cropped {} of {} ({}: {})", cropped, requested, policy_name(policy), rule)
}

fn settings_from(cfg: &Config) -> SessionSettings {
    SessionSettings {
        confidence_threshold: cfg.detection.confidence_threshold,
        padding: cfg.crop.padding,
        max_dimension: cfg.detection.max_dimension,
        batch_policy: cfg.crop.policy,
    }
}

/// Build the session and run detection on the blocking pool.
async fn run_detection(
    cfg: &Config,
    settings: SessionSettings,
    image: &Path,
    detections: Option<PathBuf>,
) -> Result<CliSession> {
    let source = detections
        .or_else(|| cfg.detection.detections_file.clone())
        .context("no detections source: set detection.detections_file or pass --detections")?;
    let detector = ReplayDetector::from_file(&source).context("load detector")?;

    let bytes = tokio::fs::read(image).await.with_context(|| format!("read {}", image.display()))?;
    let session = tokio::task::spawn_blocking(move || {
        let mut session = Session::new(detector, ImageCropper, settings);
        session.select_image_bytes(&bytes);
        session
    })
    .await
    .context("detection task")?;

    if let ViewState::Error(e) = session.state() {
        anyhow::bail!("detection failed: {}", e);
    }
    Ok(session)
}

fn detection_report(session: &CliSession, image: &Path) -> DetectionReport {
    let (image_width, image_height) = session.image().map(|i| i.dimensions()).unwrap_or((0, 0));
    let processing_ms = match session.state() {
        ViewState::Loaded(res) => res.processing_time.as_millis() as u64,
        _ => 0,
    };
    DetectionReport {
        ts_unix_ms: now_ms(),
        image: image.display().to_string(),
        image_width,
        image_height,
        confidence_threshold: session.settings().confidence_threshold,
        processing_ms,
        items: session.items().iter().enumerate().map(|(i, it)| item_record(i, it)).collect(),
    }
}

fn item_record(index: usize, item: &ClothingItem) -> ItemRecord {
    let b = item.bbox();
    ItemRecord {
        index,
        id: item.id(),
        label: item.label().to_string(),
        confidence: item.confidence(),
        bbox: Rect { x: b.x, y: b.y, w: b.w, h: b.h },
    }
}

fn crop_file_name(index: usize, label: &str) -> String {
    let slug: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("{}-{}.png", index, slug)
}

fn policy_name(p: BatchPolicy) -> &'static str {
    match p {
        BatchPolicy::BestEffort => "best-effort",
        BatchPolicy::AllOrNothing => "all-or-nothing",
    }
}

fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
