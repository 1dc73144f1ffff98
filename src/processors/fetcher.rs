// photo-prep/src/processors/fetcher.rs
use crate::core::{ProfileRecord, Result};
use crate::utils::OUTPUT_EXTENSION;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The server answered with something other than 200.
    Status(u16),
    /// Connection, timeout, or body read failure.
    Transport(String),
    /// The body arrived but could not be written.
    Write(String),
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Status(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::Transport(msg) => write!(f, "transport error: {}", msg),
            FetchErrorKind::Write(msg) => write!(f, "write error: {}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub record: ProfileRecord,
    pub cause: FetchErrorKind,
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub downloaded: Vec<PathBuf>,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    pub fn failed_records(&self) -> Vec<&ProfileRecord> {
        self.failures.iter().map(|f| &f.record).collect()
    }
}

/// Downloads photos one at a time with a fixed pause before every request.
pub struct Fetcher {
    agent: ureq::Agent,
    delay: Duration,
}

impl Fetcher {
    pub fn new(delay: Duration, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("photo-prep/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, delay }
    }

    /// Fetches every record into `destination`. Only failing to create the
    /// directory is an error; per-record problems land in the report.
    pub fn fetch(&self, records: &[ProfileRecord], destination: &Path) -> Result<FetchReport> {
        std::fs::create_dir_all(destination)?;
        log::info!(
            "Downloading {} photos into {}",
            records.len(),
            destination.display()
        );

        let mut report = FetchReport::default();
        for record in records {
            std::thread::sleep(self.delay);

            match self.fetch_one(record, destination) {
                Ok(path) => report.downloaded.push(path),
                Err(cause) => {
                    log::warn!(
                        "Error downloading {} (ID: {}): {}. URL: {}",
                        record.target_name,
                        record.identifier,
                        cause,
                        record.source_url
                    );
                    report.failures.push(FetchFailure {
                        record: record.clone(),
                        cause,
                    });
                }
            }
        }

        log::info!(
            "Downloaded {} photos, {} failed",
            report.downloaded.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn fetch_one(
        &self,
        record: &ProfileRecord,
        destination: &Path,
    ) -> std::result::Result<PathBuf, FetchErrorKind> {
        let path = destination.join(format!("{}.{}", record.target_name, OUTPUT_EXTENSION));
        if path.parent() != Some(destination) {
            return Err(FetchErrorKind::Write(format!(
                "{} is outside {}",
                path.display(),
                destination.display()
            )));
        }

        let response = match self.agent.get(&record.source_url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(FetchErrorKind::Status(code)),
            Err(e) => return Err(FetchErrorKind::Transport(e.to_string())),
        };

        if response.status() != 200 {
            return Err(FetchErrorKind::Status(response.status()));
        }

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| FetchErrorKind::Transport(e.to_string()))?;

        std::fs::write(&path, &body).map_err(|e| FetchErrorKind::Write(e.to_string()))?;
        log::debug!("Saved {} ({} bytes)", path.display(), body.len());

        Ok(path)
    }
}
