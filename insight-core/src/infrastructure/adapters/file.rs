// insight-core/src/infrastructure/adapters/file.rs
//
// Series stored as files, one per metric: `data/sessions.json`, `data/gsc/clicks.yaml`...
// The file stem is the metric name.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::domain::metrics::range::DateRange;
use crate::domain::metrics::series::{DataPoint, MetricSeries};
use crate::ports::source::{SourceAdapter, SourceError};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Accepts either `{ metric, points }` or a bare list of points.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeriesFile {
    Wrapped {
        #[serde(default)]
        metric: Option<String>,
        points: Vec<DataPoint>,
    },
    Bare(Vec<DataPoint>),
}

pub struct FileSeriesSource {
    data_dir: PathBuf,
    index: HashMap<String, PathBuf>,
}

impl FileSeriesSource {
    /// Scans `data_dir` once. A missing directory yields an unconfigured source.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let index = scan(&data_dir);
        debug!(dir = ?data_dir, files = index.len(), "indexed series files");
        Self { data_dir, index }
    }

    pub fn metrics(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn parse(&self, metric: &str, path: &Path, content: &str) -> Result<MetricSeries, SourceError> {
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let parsed: SeriesFile = if is_json {
            serde_json::from_str(content).map_err(|e| malformed(metric, e))?
        } else {
            serde_yaml::from_str(content).map_err(|e| malformed(metric, e))?
        };

        let points = match parsed {
            SeriesFile::Wrapped {
                metric: Some(declared),
                ..
            } if declared != metric => {
                return Err(SourceError::Malformed {
                    metric: metric.to_string(),
                    reason: format!("file declares metric '{}'", declared),
                });
            }
            SeriesFile::Wrapped { points, .. } => points,
            SeriesFile::Bare(points) => points,
        };
        Ok(MetricSeries::new(metric, points))
    }
}

#[async_trait]
impl SourceAdapter for FileSeriesSource {
    fn name(&self) -> &str {
        "file"
    }

    fn is_configured(&self) -> bool {
        self.data_dir.is_dir()
    }

    #[instrument(skip(self), fields(source = "file"))]
    async fn fetch_series(&self, metric: &str, range: &DateRange) -> Result<MetricSeries, SourceError> {
        if !self.is_configured() {
            return Err(SourceError::NotConfigured {
                source_name: self.name().to_string(),
                reason: format!("data directory {:?} does not exist", self.data_dir),
            });
        }

        let path = self.index.get(metric).ok_or_else(|| SourceError::Upstream {
            metric: metric.to_string(),
            reason: format!("no series file for '{}' in {:?}", metric, self.data_dir),
        })?;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::Upstream {
                metric: metric.to_string(),
                reason: e.to_string(),
            })?;

        let series = self.parse(metric, path, &content)?;
        Ok(series.within(range))
    }
}

fn scan(data_dir: &Path) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    if !data_dir.is_dir() {
        return index;
    }

    let walker = WalkDir::new(data_dir).follow_links(true);
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_file()
            && let Some(ext) = path.extension().and_then(|s| s.to_str())
            && SUPPORTED_EXTENSIONS.contains(&ext)
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            if let Some(previous) = index.insert(stem.to_string(), path.to_path_buf()) {
                warn!(metric = stem, ignored = ?previous, "duplicate series file, keeping the last one found");
            }
        }
    }
    index
}

fn malformed(metric: &str, err: impl std::fmt::Display) -> SourceError {
    SourceError::Malformed {
        metric: metric.to_string(),
        reason: err.to_string(),
    }
}
