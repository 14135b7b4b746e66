//! GSNAP 基因组索引与 SNP 索引构建
//!
//! Three external steps, each logging into the output directory:
//! `gmap_build` (genome index over the padded FASTA), `iit_store` (reads the
//! SNP file on stdin) and `snpindex`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, TrnaError};
use crate::util::process;

#[derive(Debug, Clone)]
pub struct GsnapTools {
    pub gmap_build: PathBuf,
    pub iit_store: PathBuf,
    pub snpindex: PathBuf,
}

impl Default for GsnapTools {
    fn default() -> Self {
        Self {
            gmap_build: PathBuf::from("gmap_build"),
            iit_store: PathBuf::from("iit_store"),
            snpindex: PathBuf::from("snpindex"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsnapIndex {
    pub genome_index_path: PathBuf,
    pub genome_index_name: String,
    pub snp_index_path: PathBuf,
    pub snp_index_name: String,
}

impl GsnapIndex {
    /// 由输出目录与实验名推出索引位置
    pub fn layout(out_dir: &Path, name: &str) -> Self {
        Self {
            genome_index_path: out_dir.join(format!("{}_tRNAgenome", name)),
            genome_index_name: format!("{}_tRNAgenome", name),
            snp_index_path: out_dir.join(format!("{}snp_index", name)),
            snp_index_name: format!("{}_modificationSNPs", name),
        }
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| TrnaError::io(path, e))
}

pub fn build_gsnap_indices(
    tools: &GsnapTools,
    out_dir: &Path,
    name: &str,
    genome_fasta: &Path,
    snp_file: &Path,
) -> Result<GsnapIndex> {
    let idx = GsnapIndex::layout(out_dir, name);
    ensure_dir(&idx.genome_index_path)?;
    ensure_dir(&idx.snp_index_path)?;

    log::info!("building GSNAP genome index {}", idx.genome_index_name);
    let mut gmap = Command::new(&tools.gmap_build);
    gmap.arg("-D").arg(out_dir).arg("-d").arg(&idx.genome_index_name).arg(genome_fasta);
    process::run_logged(&mut gmap, &out_dir.join("genomeindex.log"), None)?;

    log::info!("building GSNAP SNP index {}", idx.snp_index_name);
    let snp_log = out_dir.join("snpindex.log");
    let iit = idx.snp_index_path.join(&idx.snp_index_name);
    let mut store = Command::new(&tools.iit_store);
    store.arg("-o").arg(&iit);
    process::run_logged(&mut store, &snp_log, Some(snp_file))?;

    let mut snp = Command::new(&tools.snpindex);
    snp.arg("-D")
        .arg(&idx.genome_index_path)
        .arg("-d")
        .arg(&idx.genome_index_name)
        .arg("-V")
        .arg(&idx.snp_index_path)
        .arg("-v")
        .arg(&idx.snp_index_name)
        .arg(idx.snp_index_path.join(format!("{}.iit", idx.snp_index_name)));
    process::run_logged(&mut snp, &snp_log, None)?;

    Ok(idx)
}
