use crate::buffer::MutationError;
use crate::havoc::MutationMode;
use crate::mutator::mutate_bytes;
use crate::rng::ChainRng;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while recording or replaying mutations.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Reading or writing the replay log failed.
    #[error("Replay log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of the replay log is not a valid record.
    #[error("Malformed replay record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode replay record: {0}")]
    Encode(#[source] serde_json::Error),

    /// The input handed to `replay` is not the one that was recorded.
    #[error("Input digest {actual} does not match recorded {expected}")]
    InputMismatch { expected: String, actual: String },

    /// Re-running the mutation produced different bytes.
    #[error("Replayed output digest {actual} does not match recorded {expected}")]
    OutputMismatch { expected: String, actual: String },

    #[error("Mutation failed during replay: {0}")]
    Mutation(#[from] MutationError),
}

/// Hex MD5 digest used to identify inputs and outputs.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Everything needed to reproduce one mutation given its input bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ReplayRecord {
    pub worker: usize,
    pub iteration: u64,
    /// Generator state right before the mutation.
    pub state: u64,
    pub mode: MutationMode,
    pub input_md5: String,
    pub output_md5: String,
    pub output_len: usize,
}

impl ReplayRecord {
    pub fn capture(
        worker: usize,
        iteration: u64,
        state: u64,
        mode: MutationMode,
        input: &[u8],
        output: &[u8],
    ) -> Self {
        Self {
            worker,
            iteration,
            state,
            mode,
            input_md5: digest(input),
            output_md5: digest(output),
            output_len: output.len(),
        }
    }
}

/// Re-runs the mutation described by `record` on `input`.
///
/// The input must be byte-identical to the recorded one and the reproduced
/// output must hash to the recorded digest.
pub fn replay(record: &ReplayRecord, input: &[u8]) -> Result<Vec<u8>, ReplayError> {
    let actual = digest(input);
    if actual != record.input_md5 {
        return Err(ReplayError::InputMismatch {
            expected: record.input_md5.clone(),
            actual,
        });
    }

    let mut rng = ChainRng::new(record.state);
    let output = mutate_bytes(&mut rng, input, record.mode)?;

    let actual = digest(&output);
    if actual != record.output_md5 {
        return Err(ReplayError::OutputMismatch {
            expected: record.output_md5.clone(),
            actual,
        });
    }
    Ok(output)
}

/// Append-only JSON-lines log of [`ReplayRecord`]s.
pub struct ReplayLog {
    writer: BufWriter<File>,
}

impl ReplayLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, record: &ReplayRecord) -> Result<(), ReplayError> {
        let line = serde_json::to_string(record).map_err(ReplayError::Encode)?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Loads every record of a replay log. Blank lines are skipped.
pub fn read_replay_log(path: &Path) -> Result<Vec<ReplayRecord>, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| ReplayError::Malformed {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
