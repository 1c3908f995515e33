use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use txbench_sdk::{CodecError, Transaction, TxHash};

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Failed to open output file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write output file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode transaction: {0}")]
    Encode(#[from] CodecError),
    #[error("Malformed record at {path}:{line}: {reason}")]
    Malformed { path: PathBuf, line: usize, reason: String },
}

/// Output file of worker `worker` under `dir`.
pub fn output_path(dir: &Path, worker: u32) -> PathBuf {
    dir.join(format!("invoke_{worker}.txt"))
}

/// A signed transaction as written to an output file: `<hash>,<hex serialized transaction>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionRecord {
    pub hash: TxHash,
    pub serialized: Vec<u8>,
}

impl EmissionRecord {
    pub fn from_transaction(tx: &Transaction) -> Result<Self, CodecError> {
        Ok(Self { hash: tx.hash()?, serialized: tx.to_bytes()? })
    }

    pub fn transaction(&self) -> Result<Transaction, CodecError> {
        Transaction::from_bytes(&self.serialized)
    }

    pub fn to_line(&self) -> String {
        format!("{},{}\n", self.hash, hex::encode(&self.serialized))
    }

    pub fn parse_line(line: &str) -> Result<Self, String> {
        let (hash, serialized) = line.trim_end().split_once(',').ok_or("missing `,` separator")?;
        let hash = hash.parse().map_err(|_| format!("invalid hash `{hash}`"))?;
        let serialized = hex::decode(serialized).map_err(|err| format!("invalid transaction hex: {err}"))?;
        Ok(Self { hash, serialized })
    }
}

/// Append-only, buffered output file owned by a single worker.
#[derive(Debug)]
pub struct EmissionLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl EmissionLog {
    pub fn open(dir: &Path, worker: u32) -> Result<Self, RecorderError> {
        let path = output_path(dir, worker);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| RecorderError::Open { path: path.clone(), source })?;
        Ok(Self { path, writer: BufWriter::new(file), written: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn append(&mut self, tx: &Transaction) -> Result<(), RecorderError> {
        let record = EmissionRecord::from_transaction(tx)?;
        self.writer
            .write_all(record.to_line().as_bytes())
            .map_err(|source| RecorderError::Write { path: self.path.clone(), source })?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and closes the file, returning the number of records written.
    pub fn finish(mut self) -> Result<u64, RecorderError> {
        self.writer.flush().map_err(|source| RecorderError::Write { path: self.path.clone(), source })?;
        Ok(self.written)
    }
}

/// Reads back every record of an output file.
pub fn read_records(path: &Path) -> Result<Vec<EmissionRecord>, RecorderError> {
    let file = File::open(path).map_err(|source| RecorderError::Open { path: path.to_path_buf(), source })?;
    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| RecorderError::Open { path: path.to_path_buf(), source })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = EmissionRecord::parse_line(&line).map_err(|reason| RecorderError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        })?;
        records.push(record);
    }
    Ok(records)
}
