use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, TrnaError};

/// 一次构建的输入文件
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunInputs {
    pub trnas: String,
    pub trnaout: String,
    pub modomics: String,
    pub modifications: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct RunCounts {
    pub transcripts: usize,
    pub mitochondrial: usize,
    pub modification_records: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub dropped_offsets: usize,
    pub clusters: Option<usize>,
    pub emitted: usize,
    pub snps: usize,
}

/// 构建摘要，写到 `<name>_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub name: String,
    pub tool_version: String,
    pub build_args: Option<String>,
    pub build_timestamp: String,
    pub inputs: RunInputs,
    pub posttrans_mod: bool,
    pub cluster_identity: Option<f64>,
    pub counts: RunCounts,
}

impl RunMeta {
    pub fn new(name: &str, inputs: RunInputs) -> Self {
        Self {
            name: name.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            build_args: None,
            build_timestamp: chrono::Utc::now().to_rfc3339(),
            inputs,
            posttrans_mod: true,
            cluster_identity: None,
            counts: RunCounts::default(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let fh = std::fs::File::create(path).map_err(|e| TrnaError::io(path, e))?;
        let mut w = BufWriter::new(fh);
        serde_json::to_writer_pretty(&mut w, self).map_err(|e| TrnaError::io(path, e.into()))?;
        std::io::Write::flush(&mut w).map_err(|e| TrnaError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exp_summary.json");
        let mut meta = RunMeta::new(
            "exp",
            RunInputs {
                trnas: "hg19-tRNAs.fa".to_string(),
                trnaout: "hg19-tRNAs.out".to_string(),
                modomics: "modomics.fa".to_string(),
                modifications: "modificationSNPs.tsv".to_string(),
            },
        );
        meta.cluster_identity = Some(0.97);
        meta.counts.matched = 12;
        meta.write_json(&path).unwrap();

        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["name"], "exp");
        assert_eq!(v["cluster_identity"], 0.97);
        assert_eq!(v["counts"]["matched"], 12);
        assert!(v["counts"]["clusters"].is_null());
        assert!(chrono::DateTime::parse_from_rfc3339(v["build_timestamp"].as_str().unwrap()).is_ok());
    }
}
