use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, fmt};
use zip::ZipArchive;

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,swimstat={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

/// Handle that keeps a tempdir alive if we extracted a ZIP.
pub struct SourceHandle {
    path: PathBuf,
    _tmp: Option<TempDir>,
}

impl SourceHandle {
    /// A `.json` file or a directory to scan for them.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case(ext))
}

pub fn is_json_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, "json")
}

/// Accepts either:
/// - a `.json` file holding records (or a records/goals/achievements bundle)
/// - a directory, scanned recursively for `.json` files
/// - a `.zip` file which we extract to a temp dir
pub fn open_source(path: &Path) -> Result<SourceHandle> {
    if path.is_dir() || is_json_file(path) {
        tracing::info!(path = %path.display(), "using source");
        return Ok(SourceHandle {
            path: path.to_path_buf(),
            _tmp: None,
        });
    }

    if !path.exists() {
        bail!("Source does not exist: {}", path.display());
    }

    if !has_extension(path, "zip") {
        bail!(
            "Source must be a .json file, a directory or a .zip file: {}",
            path.display()
        );
    }

    let zip_file = File::open(path).with_context(|| format!("opening zip: {}", path.display()))?;
    let mut zip =
        ZipArchive::new(zip_file).with_context(|| format!("reading zip: {}", path.display()))?;

    let tmp = tempfile::tempdir().context("creating tempdir for source zip")?;
    tracing::info!(
        zip = %path.display(),
        tmp = %tmp.path().display(),
        entries = zip.len(),
        "extracting source zip"
    );

    for i in 0..zip.len() {
        let mut f = zip.by_index(i).context("reading zip entry")?;

        // Prevent Zip Slip / path traversal.
        let Some(rel) = f.enclosed_name() else {
            tracing::warn!(name = %f.name(), "skipping unsafe zip entry path");
            continue;
        };

        let out_path = tmp.path().join(&rel);

        if f.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("creating dir: {}", out_path.display()))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating dir: {}", parent.display()))?;
        }

        let mut out = File::create(&out_path)
            .with_context(|| format!("creating file: {}", out_path.display()))?;
        io::copy(&mut f, &mut out)
            .with_context(|| format!("extracting file: {}", out_path.display()))?;
    }

    tracing::info!(source_root = %tmp.path().display(), "source ready");

    Ok(SourceHandle {
        path: tmp.path().to_path_buf(),
        _tmp: Some(tmp),
    })
}

/// Minutes as `1h 05m` or `45m`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_minutes(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    let h = total / 60;
    let m = total % 60;
    if h > 0 {
        format!("{h}h {m:02}m")
    } else {
        format!("{m}m")
    }
}

/// Meters as `1.5km` from 1000 m up, `800m` below.
pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1}km", meters / 1000.0)
    } else {
        format!("{meters:.0}m")
    }
}

pub fn format_speed(meters_per_minute: f64) -> String {
    format!("{meters_per_minute:.2} m/min")
}

/// Minutes per 100 m as `1:45 /100m`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_pace(minutes_per_100m: f64) -> String {
    let secs = (minutes_per_100m.max(0.0) * 60.0).round() as u64;
    format!("{}:{:02} /100m", secs / 60, secs % 60)
}
