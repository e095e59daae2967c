use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::ingest::STAGING_PREFIX;

/// Removes stale staged uploads left behind by crashed requests. Only regular
/// files carrying the staging prefix are considered; anything else in the
/// directory is left alone. Returns how many files were removed and how many
/// bytes that freed.
pub async fn sweep_staging(staging_dir: &Path, max_age: Duration) -> anyhow::Result<(usize, u64)> {
    let now = SystemTime::now();
    let mut deleted = 0usize;
    let mut bytes_freed = 0u64;

    if !staging_dir.exists() {
        return Ok((0, 0));
    }

    let mut entries = fs::read_dir(staging_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
            continue;
        }
        let path = entry.path();

        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => {
                warn!("[cleanup] Failed to get metadata for {:?}: {}", path, e);
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(m) => m,
            Err(e) => {
                warn!("[cleanup] Failed to get modification time for {:?}: {}", path, e);
                continue;
            }
        };
        let age = match now.duration_since(modified) {
            Ok(d) => d,
            Err(_) => continue,
        };
        if age <= max_age {
            continue;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                deleted += 1;
                bytes_freed += metadata.len();
                info!(
                    "[cleanup] 🧹 Removed stale staged file {:?} (age: {:.1} min)",
                    path,
                    age.as_secs_f64() / 60.0
                );
            }
            Err(e) => {
                error!("[cleanup] ❌ Failed to remove {:?}: {}", path, e);
            }
        }
    }

    Ok((deleted, bytes_freed))
}

/// Start a background task that periodically sweeps the staging directory
pub fn start_cleanup_task(config: &Config) -> tokio::task::JoinHandle<()> {
    let staging_dir = config.staging_dir.clone();
    let max_age = Duration::from_secs(config.cleanup_max_age_secs);
    let period = Duration::from_secs(config.cleanup_interval_secs);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            "[cleanup] 🧹 Starting staging sweeper (interval: {:.1} min, max age: {:.1} min)",
            period.as_secs_f64() / 60.0,
            max_age.as_secs_f64() / 60.0
        );

        loop {
            interval.tick().await;

            match sweep_staging(&staging_dir, max_age).await {
                Ok((0, _)) => {}
                Ok((deleted, bytes_freed)) => {
                    info!(
                        "[cleanup] ✅ Sweep complete: {} files deleted, {:.2} MB freed",
                        deleted,
                        bytes_freed as f64 / 1024.0 / 1024.0
                    );
                }
                Err(e) => {
                    error!("[cleanup] Sweep error: {}", e);
                }
            }
        }
    })
}
