use std::path::{Path, PathBuf};

use crate::error::{Result, TrnaError};

pub const DEFAULT_CLUSTER_ID: f64 = 0.95;

/// 一次 SNP 索引构建的全部参数
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// tRNAscan-SE 输出的基因组 tRNA FASTA
    pub trnas: PathBuf,
    /// tRNAscan-SE `.out` 表（内含子坐标）
    pub trnaout: PathBuf,
    /// MODOMICS 修饰 tRNA 序列
    pub modomics: PathBuf,
    /// 修饰代码表（`name\tabbr\tref\tcode`）
    pub modifications: PathBuf,
    pub name: String,
    pub out_dir: PathBuf,
    pub cluster: bool,
    pub cluster_id: f64,
    /// 加 3'-CCA（及 His 的 5'-G）
    pub posttrans_mod: bool,
    pub threads: usize,
    pub blastn: PathBuf,
    pub usearch: PathBuf,
    /// 保留临时目录
    pub keep_temp: bool,
}

impl BuildConfig {
    pub fn new(
        trnas: impl Into<PathBuf>,
        trnaout: impl Into<PathBuf>,
        modomics: impl Into<PathBuf>,
        modifications: impl Into<PathBuf>,
        name: impl Into<String>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            trnas: trnas.into(),
            trnaout: trnaout.into(),
            modomics: modomics.into(),
            modifications: modifications.into(),
            name: name.into(),
            out_dir: out_dir.into(),
            cluster: false,
            cluster_id: DEFAULT_CLUSTER_ID,
            posttrans_mod: true,
            threads: 0,
            blastn: PathBuf::from("blastn"),
            usearch: PathBuf::from("usearch"),
            keep_temp: false,
        }
    }

    /// 校验参数；不访问输出目录
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.cluster_id) {
            return Err(TrnaError::Config(format!(
                "cluster identity {} not in range 0.0 - 1.0",
                self.cluster_id
            )));
        }
        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            return Err(TrnaError::Config(format!("invalid experiment name '{}'", self.name)));
        }
        for (what, path) in self.inputs() {
            if !path.is_file() {
                return Err(TrnaError::Config(format!("{} file '{}' not found", what, path.display())));
            }
        }
        Ok(())
    }

    pub fn inputs(&self) -> [(&'static str, &Path); 4] {
        [
            ("tRNA FASTA", self.trnas.as_path()),
            ("tRNAscan-SE output", self.trnaout.as_path()),
            ("MODOMICS", self.modomics.as_path()),
            ("modification table", self.modifications.as_path()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_inputs(dir: &Path) -> BuildConfig {
        for f in ["t.fa", "t.out", "m.fa", "mods.tsv"] {
            std::fs::write(dir.join(f), "").unwrap();
        }
        BuildConfig::new(
            dir.join("t.fa"),
            dir.join("t.out"),
            dir.join("m.fa"),
            dir.join("mods.tsv"),
            "exp",
            dir.join("out"),
        )
    }

    #[test]
    fn defaults_validate() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = with_inputs(dir.path());
        assert_eq!(cfg.cluster_id, DEFAULT_CLUSTER_ID);
        assert!(cfg.posttrans_mod);
        cfg.validate().unwrap();
    }

    #[test]
    fn identity_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = with_inputs(dir.path());
        cfg.cluster_id = 1.5;
        assert!(matches!(cfg.validate(), Err(TrnaError::Config(_))));
    }

    #[test]
    fn missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = with_inputs(dir.path());
        cfg.modomics = dir.path().join("absent.fa");
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("MODOMICS"), "{msg}");
    }
}
