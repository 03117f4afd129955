use std::fmt::{self, Debug};
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::elements::Run;
use crate::error::StoreError;

pub const RUN_LOG_FILENAME: &str = "runs.jsonl";

pub fn make_run_log(settings: &StoreSettings) -> Result<Box<dyn RunLog>, StoreError> {
    match settings.backend {
        RunLogType::Memory => Ok(Box::new(MemoryRunLog::default())),
        RunLogType::File => {
            let path = settings.path.clone().unwrap_or_else(|| PathBuf::from("benchwatch.data"));
            Ok(Box::new(FileRunLog::open(path)?))
        },
    }
}

/// Durable, append-only record of accepted runs. The source of truth every index is rebuilt from.
#[async_trait]
pub trait RunLog: Debug + Sync + Send {
    /// Every durably recorded run, in append order.
    async fn replay(&self) -> Result<Vec<Run>, StoreError>;
    async fn append(&self, run: &Run) -> Result<(), StoreError>;

    /// Discards whatever an append abandoned before acknowledgement may still write, so the run is
    /// not replayed later.
    async fn rollback(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: RunLogType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(
        rename = "write_timeout_millis",
        serialize_with = "crate::serde::serialize_duration_millis",
        deserialize_with = "crate::serde::deserialize_duration_millis"
    )]
    pub write_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: RunLogType::Memory,
            path: None,
            write_timeout: Self::default_write_timeout(),
        }
    }
}

impl StoreSettings {
    pub const fn default_write_timeout() -> Duration {
        Duration::from_secs(5)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self { backend: RunLogType::File, path: Some(path.into()), ..Self::default() }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum RunLogType {
    Memory,
    File,
}

impl fmt::Display for RunLogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
        }
    }
}

impl FromStr for RunLogType {
    type Err = StoreError;

    fn from_str(rep: &str) -> Result<Self, Self::Err> {
        match rep.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            s => Err(StoreError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryRunLog(Arc<Mutex<Vec<Run>>>);

#[async_trait]
impl RunLog for MemoryRunLog {
    async fn replay(&self) -> Result<Vec<Run>, StoreError> {
        Ok(self.0.lock().await.clone())
    }

    async fn append(&self, run: &Run) -> Result<(), StoreError> {
        self.0.lock().await.push(run.clone());
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Run log kept as a JSON Lines file. Every append is flushed and synced before it is
/// acknowledged. Bytes past the last acknowledged append are cut away when the log is opened, on
/// rollback, before the next append and on close.
#[derive(Debug)]
pub struct FileRunLog {
    path: PathBuf,
    state: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: tokio::fs::File,
    committed_len: u64,
}

impl FileState {
    /// Settles any write still in flight, then truncates to the acknowledged length.
    async fn discard_unacknowledged(&mut self) -> Result<(), StoreError> {
        self.file.flush().await?;
        let current_len = self.file.metadata().await?.len();
        if self.committed_len < current_len {
            tracing::warn!(
                committed_len=%self.committed_len, %current_len,
                "truncating unacknowledged bytes from run log."
            );
            self.file.set_len(self.committed_len).await?;
        }
        Ok(())
    }
}

impl FileRunLog {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let path = root.join(RUN_LOG_FILENAME);

        let mut file = OpenOptions::new().read(true).append(true).create(true).open(&path)?;
        let committed_len = Self::recover_tail(&mut file, &path)?;

        Ok(Self {
            path,
            state: Mutex::new(FileState { file: tokio::fs::File::from_std(file), committed_len }),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Truncates bytes following the last complete line, which only a torn write leaves behind.
    fn recover_tail(file: &mut std::fs::File, path: &Path) -> Result<u64, StoreError> {
        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut contents)?;

        let total = contents.len() as u64;
        let committed = contents.iter().rposition(|b| *b == b'\n').map(|pos| pos as u64 + 1).unwrap_or(0);

        if committed < total {
            tracing::warn!(
                path=?path, torn_bytes=%(total - committed),
                "discarding partially written run at end of run log."
            );
            file.set_len(committed)?;
        }

        Ok(committed)
    }
}

#[async_trait]
impl RunLog for FileRunLog {
    #[tracing::instrument(level = "info", skip(self), fields(path=?self.path))]
    async fn replay(&self) -> Result<Vec<Run>, StoreError> {
        let committed_len = self.state.lock().await.committed_len as usize;
        let contents = tokio::fs::read(&self.path).await?;
        let contents = &contents[..committed_len.min(contents.len())];

        let mut runs = Vec::new();
        for (position, line) in contents.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            let run: Run = serde_json::from_slice(line)
                .map_err(|err| StoreError::Corrupt { line: position + 1, reason: err.to_string() })?;
            runs.push(run);
        }

        tracing::debug!(nr_runs=%runs.len(), "replayed run log.");
        Ok(runs)
    }

    async fn append(&self, run: &Run) -> Result<(), StoreError> {
        let mut record = serde_json::to_vec(run)?;
        record.push(b'\n');

        let mut state = self.state.lock().await;
        state.discard_unacknowledged().await?;

        let written = async {
            state.file.write_all(&record).await?;
            state.file.flush().await?;
            state.file.sync_data().await
        }
        .await;

        match written {
            Ok(()) => {
                state.committed_len += record.len() as u64;
                Ok(())
            },
            Err(err) => {
                if let Err(rollback_err) = state.file.set_len(state.committed_len).await {
                    tracing::error!(error=?rollback_err, "failed to roll back partial run log write.");
                }
                Err(err.into())
            },
        }
    }

    #[tracing::instrument(level = "info", skip(self), fields(path=?self.path))]
    async fn rollback(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.discard_unacknowledged().await?;
        state.file.sync_data().await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(path=?self.path))]
    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.discard_unacknowledged().await?;
        state.file.sync_all().await?;
        Ok(())
    }
}
