/*!
 * Job Runner
 *
 * Drives job files through a fresh worker pool each. A single file is
 * processed to `<stem>.out` beside it; a directory has every `*.jobs` file
 * processed, at most `max_jobs` at a time.
 */

use crate::core::limits::{JOBS_EXTENSION, OUTPUT_EXTENSION};
use crate::core::{EmsConfig, EmsError, EmsResult};
use crate::protocol::{JobReader, TextSink, WireSink};
use crate::scheduler::{RunSummary, WorkerPool};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{error, info};

/// Output encoding of a job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Binary,
}

/// Result of processing one job file
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: RunSummary,
}

/// Output path for a job file: same directory and stem, `.out` extension
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// Process one job file with its own store
pub fn process_file(input: &Path, config: &EmsConfig, format: OutputFormat) -> EmsResult<JobReport> {
    let output = output_path(input);
    if output == input {
        return Err(EmsError::Configuration(format!(
            "{} is already an output file",
            input.display()
        )));
    }
    let source = JobReader::new(BufReader::new(File::open(input)?));
    let out = BufWriter::new(File::create(&output)?);

    let pool = WorkerPool::from_config(config)?;
    let summary = match format {
        OutputFormat::Text => pool.run(source, TextSink::new(out))?,
        OutputFormat::Binary => pool.run(source, WireSink::new(out))?,
    };

    info!(
        input = %input.display(),
        output = %output.display(),
        commands = summary.stats.commands,
        "Job file processed"
    );

    Ok(JobReport {
        input: input.to_path_buf(),
        output,
        summary,
    })
}

/// Job files of a directory, sorted by name
pub fn job_files(dir: &Path) -> EmsResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == JOBS_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process a job file or a directory of job files
///
/// Every file in a directory is attempted; the first failure is returned
/// after the others have finished.
pub fn process_path(path: &Path, config: &EmsConfig, format: OutputFormat) -> EmsResult<Vec<JobReport>> {
    config.validate()?;

    if !path.is_dir() {
        return Ok(vec![process_file(path, config, format)?]);
    }

    let files = job_files(path)?;
    info!(dir = %path.display(), files = files.len(), max_jobs = config.max_jobs, "Processing job directory");

    let mut reports = Vec::with_capacity(files.len());
    let mut first_error: Option<EmsError> = None;

    for batch in files.chunks(config.max_jobs) {
        let results: Vec<(&PathBuf, EmsResult<JobReport>)> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|file| (file, scope.spawn(move || process_file(file, config, format))))
                .collect();

            handles
                .into_iter()
                .map(|(file, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(EmsError::Io(io::Error::other("job thread panicked")))
                    });
                    (file, result)
                })
                .collect()
        });

        for (file, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(file = %file.display(), error = %e, "Job file failed");
                    first_error.get_or_insert(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}
