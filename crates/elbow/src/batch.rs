//! File-level processing: discovery, per-file outcomes and the aggregate report.

use crate::config::RouteConfig;
use crate::error::{Error, Result};
use crate::rewrite::{Rewrite, rewrite_svg};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File-name filter of the form `<prefix>*<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    prefix: String,
    suffix: String,
}

impl Default for FilePattern {
    fn default() -> Self {
        Self {
            prefix: "diagram-".to_string(),
            suffix: ".svg".to_string(),
        }
    }
}

impl FilePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut parts = pattern.split('*');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            _ => Err(Error::Pattern {
                pattern: pattern.to_string(),
            }),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.len() >= self.prefix.len() + self.suffix.len()
            && file_name.starts_with(&self.prefix)
            && file_name.ends_with(&self.suffix)
    }
}

/// Recursively collects files under `root` whose name matches `pattern`, sorted.
///
/// Only `root` itself must be readable; unreadable subdirectories are logged and skipped.
/// Symlinked directories are not followed.
pub fn discover(root: &Path, pattern: &FilePattern) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = Vec::new();
    let entries = fs::read_dir(root).map_err(|source| Error::Read {
        path: root.to_path_buf(),
        source,
    })?;
    collect_entries(entries, pattern, &mut stack, &mut files);
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %err,
                    "skipping unreadable directory"
                );
                continue;
            }
        };
        collect_entries(entries, pattern, &mut stack, &mut files);
    }
    files.sort();
    Ok(files)
}

fn collect_entries(
    entries: fs::ReadDir,
    pattern: &FilePattern,
    dirs: &mut Vec<PathBuf>,
    files: &mut Vec<PathBuf>,
) {
    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(path);
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| pattern.matches(n))
        {
            files.push(path);
        }
    }
}

/// One document to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Job {
    pub fn in_place(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            input: path.clone(),
            output: path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Changed { fixed: usize, not_fixed: usize },
    Skipped { reason: String, not_fixed: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    fn count(&self, f: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|r| f(&r.status)).count()
    }

    pub fn changed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Changed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Compute outcomes without writing anything.
    pub dry_run: bool,
    /// Worker threads; `0` or `1` processes documents sequentially.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
        }
    }
}

/// Writes through a sibling temp file and a rename so the target is never half-written.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out.svg".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.elbow-tmp"));
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Err(source) = fs::write(&tmp, contents).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(())
}

fn process(job: &Job, config: &RouteConfig, dry_run: bool) -> Result<Rewrite> {
    let input = fs::read_to_string(&job.input).map_err(|source| Error::Read {
        path: job.input.clone(),
        source,
    })?;
    let rewrite = rewrite_svg(&input, config)?;
    if dry_run {
        return Ok(rewrite);
    }
    match &rewrite {
        Rewrite::Changed { svg, .. } => write_atomically(&job.output, svg)?,
        // A distinct output still receives the (unchanged) document.
        Rewrite::Unchanged { .. } if job.output != job.input => {
            write_atomically(&job.output, &input)?
        }
        Rewrite::Unchanged { .. } => {}
    }
    Ok(rewrite)
}

/// Processes one document; failures are captured in the report, never propagated.
pub fn process_file(job: &Job, config: &RouteConfig, dry_run: bool) -> FileReport {
    let status = match process(job, config, dry_run) {
        Ok(Rewrite::Changed { counts, .. }) => {
            tracing::info!(
                file = %job.input.display(),
                fixed = counts.fixed,
                not_fixed = counts.not_fixed,
                "rerouted connectors"
            );
            FileStatus::Changed {
                fixed: counts.fixed,
                not_fixed: counts.not_fixed,
            }
        }
        Ok(Rewrite::Unchanged { reason, counts }) => {
            tracing::info!(file = %job.input.display(), %reason, "skipped");
            FileStatus::Skipped {
                reason: reason.to_string(),
                not_fixed: counts.not_fixed,
            }
        }
        Err(err) => {
            tracing::warn!(file = %job.input.display(), error = %err, "failed");
            FileStatus::Failed {
                error: err.to_string(),
            }
        }
    };
    FileReport {
        input: job.input.clone(),
        output: job.output.clone(),
        status,
    }
}

/// Processes every job, in parallel when `options.jobs > 1`. Reports keep the input order.
pub fn run_batch(jobs: &[Job], config: &RouteConfig, options: BatchOptions) -> Result<BatchReport> {
    let files: Vec<FileReport> = if options.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()?;
        pool.install(|| {
            jobs.par_iter()
                .map(|job| process_file(job, config, options.dry_run))
                .collect()
        })
    } else {
        jobs.iter()
            .map(|job| process_file(job, config, options.dry_run))
            .collect()
    };
    Ok(BatchReport { files })
}
