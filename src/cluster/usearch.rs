//! usearch `-cluster_fast` 适配器与 `.uc` 解析

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{ClusterRecord, ClusterRelation, Clusterer};
use crate::error::{Result, TrnaError};
use crate::io::fasta;
use crate::trna::Transcript;
use crate::util::process;

#[derive(Debug, Clone)]
pub struct UsearchClusterer {
    pub program: PathBuf,
}

impl Default for UsearchClusterer {
    fn default() -> Self {
        Self { program: PathBuf::from("usearch") }
    }
}

impl UsearchClusterer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

/// 由 `.uc` 第 8 列（压缩比对串）判断成员与中心的关系
///
/// `=` means identical over the full length; any `I`/`D` operation is an
/// indel; everything else only has substitutions.
pub fn relation_from_cigar(cigar: &str) -> ClusterRelation {
    if cigar == "=" {
        ClusterRelation::Identical
    } else if cigar.contains(['I', 'D']) {
        ClusterRelation::Indel
    } else {
        ClusterRelation::Substitutions
    }
}

pub fn parse_uc(text: &str, source: &Path) -> Result<Vec<ClusterRecord>> {
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let f: Vec<&str> = line.split('\t').collect();
        match f[0] {
            "S" if f.len() >= 9 => records.push(ClusterRecord::Centroid { id: f[8].to_string() }),
            "H" if f.len() >= 10 => records.push(ClusterRecord::Member {
                id: f[8].to_string(),
                centroid: f[9].to_string(),
                relation: relation_from_cigar(f[7]),
            }),
            "S" | "H" => {
                return Err(TrnaError::parse(source, i + 1, format!("truncated {} record ({} columns)", f[0], f.len())))
            }
            // cluster summary rows
            _ => {}
        }
    }
    Ok(records)
}

impl Clusterer for UsearchClusterer {
    fn cluster(&self, members: &[&Transcript], identity: f64, scratch: &Path) -> Result<Vec<ClusterRecord>> {
        let input = scratch.join("allseqs.fa");
        let centroids = scratch.join("centroids.fa");
        let uc = scratch.join("clusters.uc");

        {
            let fh = std::fs::File::create(&input).map_err(|e| TrnaError::io(&input, e))?;
            let mut w = BufWriter::new(fh);
            for tx in members {
                fasta::write_record(&mut w, &tx.id, &tx.sequence).map_err(|e| TrnaError::io(&input, e))?;
            }
            std::io::Write::flush(&mut w).map_err(|e| TrnaError::io(&input, e))?;
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg("-cluster_fast")
            .arg(&input)
            .arg("-id")
            .arg(identity.to_string())
            .arg("-centroids")
            .arg(&centroids)
            .arg("-uc")
            .arg(&uc);
        process::run(&mut cmd)?;

        let text = std::fs::read_to_string(&uc).map_err(|e| TrnaError::io(&uc, e))?;
        parse_uc(&text, &uc)
    }
}
