//! blastn 适配器
//!
//! Runs `blastn -task blastn-short` with query and subject FASTA files in the
//! scratch directory and reads tabular output (`-outfmt 6`).

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{Aligner, Hit, SeqRef};
use crate::error::{Result, TrnaError};
use crate::io::fasta;
use crate::util::process;

const OUTFMT: &str = "6 sseqid bitscore length slen";

#[derive(Debug, Clone)]
pub struct BlastnAligner {
    pub program: PathBuf,
    pub task: String,
}

impl Default for BlastnAligner {
    fn default() -> Self {
        Self { program: PathBuf::from("blastn"), task: "blastn-short".to_string() }
    }
}

impl BlastnAligner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), ..Self::default() }
    }
}

fn write_fasta(path: &Path, seqs: &[SeqRef<'_>]) -> Result<()> {
    let fh = std::fs::File::create(path).map_err(|e| TrnaError::io(path, e))?;
    let mut w = BufWriter::new(fh);
    for s in seqs {
        fasta::write_record(&mut w, s.id, s.seq).map_err(|e| TrnaError::io(path, e))?;
    }
    std::io::Write::flush(&mut w).map_err(|e| TrnaError::io(path, e))
}

/// 解析 `6 sseqid bitscore length slen` 表格输出
pub fn parse_tabular(text: &str, command: &str) -> Result<Vec<Hit>> {
    let mut hits = Vec::new();
    for line in text.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let f: Vec<&str> = line.split('\t').collect();
        let bad = || TrnaError::ExternalTool {
            command: command.to_string(),
            code: Some(0),
            stderr: format!("unexpected tabular row: '{}'", line),
        };
        if f.len() < 4 {
            return Err(bad());
        }
        hits.push(Hit {
            subject_id: f[0].to_string(),
            score: f[1].trim().parse().map_err(|_| bad())?,
            align_len: f[2].trim().parse().map_err(|_| bad())?,
            subject_len: f[3].trim().parse().map_err(|_| bad())?,
        });
    }
    Ok(hits)
}

impl Aligner for BlastnAligner {
    fn align(&self, query: SeqRef<'_>, subjects: &[SeqRef<'_>], scratch: &Path) -> Result<Vec<Hit>> {
        let query_fa = scratch.join("query.fa");
        let subject_fa = scratch.join("subject.fa");
        write_fasta(&query_fa, &[query])?;
        write_fasta(&subject_fa, subjects)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("-task")
            .arg(&self.task)
            .arg("-query")
            .arg(&query_fa)
            .arg("-subject")
            .arg(&subject_fa)
            .arg("-outfmt")
            .arg(OUTFMT);
        let output = process::run(&mut cmd)?;
        parse_tabular(&String::from_utf8_lossy(&output.stdout), &process::render(&cmd))
    }
}
