use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::ai::TrainablePolicy;
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;

const LATEST: &str = "latest";
const BEST: &str = "best";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 3,
        }
    }
}

/// Algorithm-agnostic checkpoint contents. The policy deserializes its own
/// training state.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
    pub training_state_json: String,
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(CheckpointManager { config })
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.config.checkpoint_dir
    }

    /// Save a periodic checkpoint, move `latest` to it and prune.
    pub fn save_checkpoint(
        &self,
        policy: &dyn TrainablePolicy,
        metrics: &CheckpointMetrics,
        episode: usize,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", episode);
        let final_dir = self.write_checkpoint(policy, metrics, episode, &dir_name)?;

        self.update_latest(&dir_name)?;
        self.prune_old_checkpoints()?;

        info!("saved checkpoint {}", final_dir.display());
        Ok(final_dir)
    }

    /// Overwrite the `best/` checkpoint. It is not subject to pruning.
    pub fn save_best(
        &self,
        policy: &dyn TrainablePolicy,
        metrics: &CheckpointMetrics,
        episode: usize,
    ) -> Result<PathBuf, CheckpointError> {
        let final_dir = self.write_checkpoint(policy, metrics, episode, BEST)?;
        info!(
            "new best model (win rate {:.3}) saved to {}",
            metrics.win_rate,
            final_dir.display()
        );
        Ok(final_dir)
    }

    fn write_checkpoint(
        &self,
        policy: &dyn TrainablePolicy,
        metrics: &CheckpointMetrics,
        episode: usize,
        dir_name: &str,
    ) -> Result<PathBuf, CheckpointError> {
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        policy.save_weights_to_dir(&tmp_dir)?;
        fs::write(
            tmp_dir.join("training_state.json"),
            policy.training_state_json()?,
        )?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = policy.build_checkpoint_metadata(metrics, episode, timestamp);
        fs::write(
            tmp_dir.join("metadata.json"),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        // Last write wins
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;
        Ok(final_dir)
    }

    /// Read a checkpoint directory's metadata and training state.
    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        if !dir.is_dir() {
            return Err(CheckpointError::DirNotFound(dir.to_path_buf()));
        }
        let metadata = read_metadata(&dir.join("metadata.json"))?;

        let ts_path = dir.join("training_state.json");
        let training_state_json =
            fs::read_to_string(&ts_path).map_err(|e| CheckpointError::MetadataRead {
                path: ts_path,
                source: e,
            })?;

        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
            training_state_json,
        })
    }

    /// Load the checkpoint `latest` points at.
    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let target = self
            .latest_dir()?
            .ok_or_else(|| CheckpointError::NoLatest(self.config.checkpoint_dir.clone()))?;
        self.load_checkpoint(&target)
    }

    /// Load the `best/` checkpoint.
    pub fn load_best(&self) -> Result<CheckpointData, CheckpointError> {
        self.load_checkpoint(&self.config.checkpoint_dir.join(BEST))
    }

    /// Load a checkpoint's weights and training state into `policy`.
    pub fn restore_into(
        &self,
        data: &CheckpointData,
        policy: &mut dyn TrainablePolicy,
    ) -> Result<(), CheckpointError> {
        policy.load_weights_from_dir(&data.path)?;
        policy.restore_training_state_json(&data.training_state_json)
    }

    /// List all periodic checkpoints sorted by episode (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("checkpoint_") || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join("metadata.json");
            if meta_path.exists() {
                let metadata = read_metadata(&meta_path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.episode);
        Ok(results)
    }

    /// Prune old checkpoints, keeping the union of the last N and best N by win_rate.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = checkpoints.len();
        let mut keep: HashSet<usize> =
            (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_win_rate: Vec<(usize, f32)> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, (_, m))| (i, m.metrics.win_rate))
            .collect();
        by_win_rate.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        for (i, _) in by_win_rate.iter().take(self.config.keep_best_n) {
            keep.insert(*i);
        }

        for (i, (path, _)) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                fs::remove_dir_all(path)?;
            }
        }

        Ok(())
    }

    /// Directory `latest` points at, if any.
    fn latest_dir(&self) -> Result<Option<PathBuf>, CheckpointError> {
        let link_path = self.config.checkpoint_dir.join(LATEST);
        let Ok(meta) = link_path.symlink_metadata() else {
            return Ok(None);
        };
        let target = if meta.file_type().is_symlink() {
            fs::read_link(&link_path)?
        } else {
            PathBuf::from(fs::read_to_string(&link_path)?.trim())
        };
        Ok(Some(if target.is_relative() {
            self.config.checkpoint_dir.join(target)
        } else {
            target
        }))
    }

    /// Point `latest` at the given checkpoint directory name.
    fn update_latest(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let link_path = self.config.checkpoint_dir.join(LATEST);
        if link_path.symlink_metadata().is_ok() {
            fs::remove_file(&link_path)?;
        }
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir_name, &link_path)?;
        #[cfg(not(unix))]
        fs::write(&link_path, dir_name)?;
        Ok(())
    }
}

fn read_metadata(meta_path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    let meta_json = fs::read_to_string(meta_path).map_err(|e| CheckpointError::MetadataRead {
        path: meta_path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&meta_json).map_err(|e| CheckpointError::MetadataParse {
        path: meta_path.to_path_buf(),
        source: e,
    })
}
