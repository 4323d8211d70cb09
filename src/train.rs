use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;

pub const DEFAULT_TRAIN_COMMAND: &str = "caseify-train";

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Unable to create dataset directory {path:?}: {source}")]
    DatasetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to start training command {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Training command exited unsuccessfully: {0}")]
    Failed(ExitStatus),
}

/// Hands a written dataset to an external training program
#[derive(Debug, Clone)]
pub struct TrainJob {
    pub command: String,
    pub dataset_fp: PathBuf,
    pub dataset_dir: PathBuf,
}

impl TrainJob {
    fn command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command
            .arg("--dataset-fp")
            .arg(&self.dataset_fp)
            .arg("--dataset-dir")
            .arg(&self.dataset_dir);
        command
    }

    pub async fn run(&self) -> Result<(), TrainError> {
        fs::create_dir_all(&self.dataset_dir)
            .await
            .map_err(|source| TrainError::DatasetDir {
                path: self.dataset_dir.clone(),
                source,
            })?;
        log::info!(
            "Training on {} (artifacts in {})",
            self.dataset_fp.display(),
            self.dataset_dir.display()
        );
        let status = self
            .command()
            .status()
            .await
            .map_err(|source| TrainError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !status.success() {
            return Err(TrainError::Failed(status));
        }
        log::info!("Training finished");
        Ok(())
    }
}
