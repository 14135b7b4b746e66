//! 输出转录本 FASTA、BED/GFF 注释、聚类表与 SNP 索引输入
//!
//! Every emitted sequence is flanked by [`PAD`] `N`s on both sides and every
//! coordinate written here (BED, GFF, SNP positions) is expressed in that
//! padded frame.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cluster::ClusterSet;
use crate::error::{Result, TrnaError};
use crate::io::fasta;
use crate::trna::Transcript;
use crate::util::dna;

/// 两侧填充 N 的宽度
pub const PAD: usize = 20;
/// SNP 记录的替代碱基占位符
pub const SNP_ALT: char = 'N';
const BED_SCORE: u32 = 1000;
const GFF_SOURCE: &str = "tRNAseq";

/// 一条待输出的序列（转录本或簇代表）
#[derive(Debug, Clone, Copy)]
pub struct EmittedSeq<'a> {
    pub id: &'a str,
    pub sequence: &'a str,
    pub modified: &'a [usize],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnpRecord {
    pub owner: String,
    /// 同一序列内的序号（从 0 开始）
    pub index: usize,
    /// 填充坐标系下的 1-based 位置
    pub position: usize,
    pub reference: char,
}

impl SnpRecord {
    pub fn new(owner: &str, index: usize, offset: usize, reference: char) -> Self {
        Self {
            owner: owner.to_string(),
            index,
            position: offset + PAD + 1,
            reference: reference.to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for SnpRecord {
    /// `>id_snp0 id:29 GN`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ">{}_snp{} {}:{} {}{}",
            self.owner, self.index, self.owner, self.position, self.reference, SNP_ALT
        )
    }
}

pub fn snp_records(seq: &EmittedSeq<'_>) -> Vec<SnpRecord> {
    let bases = seq.sequence.as_bytes();
    seq.modified
        .iter()
        .filter(|&&p| p < bases.len())
        .enumerate()
        .map(|(i, &p)| SnpRecord::new(seq.id, i, p, bases[p] as char))
        .collect()
}

pub fn bed_line(id: &str, len: usize) -> String {
    format!("{}\t{}\t{}\t{}\t{}\t+", id, PAD, len + PAD, id, BED_SCORE)
}

pub fn gff_line(id: &str, len: usize) -> String {
    format!(
        "{}\t{}\texon\t{}\t{}\t.\t+\t0\tgene_id '{}'",
        id,
        GFF_SOURCE,
        PAD + 1,
        len + PAD,
        id
    )
}

/// 输出目录中各文件路径
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub name: String,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { dir: dir.into(), name: name.into() }
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }

    pub fn transcripts_fasta(&self) -> PathBuf {
        self.file("_tRNATranscripts.fa")
    }
    pub fn transcripts_bed(&self) -> PathBuf {
        self.file("_maturetRNA.bed")
    }
    pub fn cluster_fasta(&self) -> PathBuf {
        self.file("_clusterTranscripts.fa")
    }
    pub fn cluster_bed(&self) -> PathBuf {
        self.file("_clusters.bed")
    }
    pub fn cluster_info(&self) -> PathBuf {
        self.file("clusterInfo.txt")
    }
    pub fn gff(&self) -> PathBuf {
        self.file("_tRNA.gff")
    }
    pub fn snps(&self) -> PathBuf {
        self.file("_modificationSNPs.txt")
    }
    pub fn summary(&self) -> PathBuf {
        self.file("_summary.json")
    }
}

/// 新建输出目录；目录已存在时报错，保证每次运行都从空目录开始
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    match std::fs::create_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(TrnaError::OutputConflict(dir.to_path_buf())),
        Err(e) => Err(TrnaError::io(dir, e)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitSummary {
    /// 覆盖度统计用 BED（聚类模式下为簇 BED）
    pub coverage_bed: PathBuf,
    /// 构建基因组索引用 FASTA
    pub genome_fasta: PathBuf,
    pub emitted: usize,
    pub snps: usize,
}

struct Out {
    path: PathBuf,
    w: BufWriter<File>,
}

impl Out {
    fn create(path: PathBuf) -> Result<Self> {
        let fh = File::create(&path).map_err(|e| TrnaError::io(&path, e))?;
        Ok(Self { path, w: BufWriter::new(fh) })
    }

    fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.w, "{}", line).map_err(|e| TrnaError::io(&self.path, e))
    }

    fn fasta(&mut self, id: &str, seq: &str) -> Result<()> {
        fasta::write_record(&mut self.w, id, &dna::pad_sequence(seq, PAD)).map_err(|e| TrnaError::io(&self.path, e))
    }

    fn finish(mut self) -> Result<PathBuf> {
        self.w.flush().map_err(|e| TrnaError::io(&self.path, e))?;
        Ok(self.path)
    }
}

fn write_sequences(fa: PathBuf, bed: PathBuf, seqs: &[EmittedSeq<'_>]) -> Result<(PathBuf, PathBuf)> {
    let mut fa = Out::create(fa)?;
    let mut bed = Out::create(bed)?;
    for s in seqs {
        fa.fasta(s.id, s.sequence)?;
        bed.line(&bed_line(s.id, s.sequence.len()))?;
    }
    Ok((fa.finish()?, bed.finish()?))
}

fn write_annotations(paths: &OutputPaths, seqs: &[EmittedSeq<'_>]) -> Result<usize> {
    let mut gff = Out::create(paths.gff())?;
    let mut snp = Out::create(paths.snps())?;
    let mut n_snps = 0usize;
    for s in seqs {
        gff.line(&gff_line(s.id, s.sequence.len()))?;
        for rec in snp_records(s) {
            snp.line(&rec.to_string())?;
            n_snps += 1;
        }
    }
    gff.finish()?;
    snp.finish()?;
    Ok(n_snps)
}

/// 写出全部注释与索引输入文件
///
/// The per-transcript FASTA and BED are always written. With `clusters`,
/// the cluster FASTA/BED/membership table are added and the GFF and SNP
/// records describe cluster representatives instead of single transcripts.
pub fn emit_index(paths: &OutputPaths, transcripts: &[Transcript], clusters: Option<&ClusterSet>) -> Result<EmitSummary> {
    let per_tx: Vec<EmittedSeq<'_>> = transcripts
        .iter()
        .map(|t| EmittedSeq { id: &t.id, sequence: &t.sequence, modified: &t.modified })
        .collect();
    let (tx_fasta, tx_bed) = write_sequences(paths.transcripts_fasta(), paths.transcripts_bed(), &per_tx)?;

    let Some(set) = clusters else {
        let snps = write_annotations(paths, &per_tx)?;
        log::info!("{} modifications written to SNP index", snps);
        return Ok(EmitSummary { coverage_bed: tx_bed, genome_fasta: tx_fasta, emitted: per_tx.len(), snps });
    };

    let mut reps: Vec<EmittedSeq<'_>> = Vec::with_capacity(set.clusters.len());
    for c in &set.clusters {
        let tx = transcripts.iter().find(|t| t.id == c.representative).ok_or_else(|| {
            TrnaError::Config(format!("cluster representative '{}' is not a known transcript", c.representative))
        })?;
        reps.push(EmittedSeq { id: &tx.id, sequence: &tx.sequence, modified: &c.modified });
    }

    let (cl_fasta, cl_bed) = write_sequences(paths.cluster_fasta(), paths.cluster_bed(), &reps)?;

    let mut info = Out::create(paths.cluster_info())?;
    for (id, number) in &set.assignments {
        info.line(&format!("{}\t{}", id, number))?;
    }
    info.finish()?;

    let snps = write_annotations(paths, &reps)?;
    log::info!("{} modifications written to SNP index", snps);
    Ok(EmitSummary { coverage_bed: cl_bed, genome_fasta: cl_fasta, emitted: reps.len(), snps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::trna::{Category, Isotype};
    use std::collections::HashMap;

    fn tx(id: &str, seq: &str, modified: Vec<usize>) -> Transcript {
        let mut t = Transcript::new(id.to_string(), seq.to_string(), Category::Cytosolic, Isotype::Other);
        t.modified = modified;
        t
    }

    #[test]
    fn snp_line_format() {
        let rec = SnpRecord::new("Homo_sapiens_nmt_tRNA-Leu-TAA-1-1", 0, 8, 'g');
        assert_eq!(rec.to_string(), ">Homo_sapiens_nmt_tRNA-Leu-TAA-1-1_snp0 Homo_sapiens_nmt_tRNA-Leu-TAA-1-1:29 GN");
    }

    #[test]
    fn bed_and_gff_cover_unpadded_span() {
        assert_eq!(bed_line("t1", 75), "t1\t20\t95\tt1\t1000\t+");
        assert_eq!(gff_line("t1", 75), "t1\ttRNAseq\texon\t21\t95\t.\t+\t0\tgene_id 't1'");
    }

    #[test]
    fn existing_directory_is_output_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_output_dir(dir.path()).unwrap_err();
        assert!(matches!(err, TrnaError::OutputConflict(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let fresh = dir.path().join("run");
        prepare_output_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
    }

    #[test]
    fn emits_padded_transcripts_and_consistent_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "exp");
        let txs = vec![tx("a-Ala-AGC-1-1", "GGGCCA", vec![0, 3]), tx("b-Gly-CCC-1-1", "ACGTCCA", vec![])];
        let summary = emit_index(&paths, &txs, None).unwrap();
        assert_eq!(summary.snps, 2);
        assert_eq!(summary.coverage_bed, paths.transcripts_bed());

        let fa = std::fs::read_to_string(paths.transcripts_fasta()).unwrap();
        let padded = format!("{}GGGCCA{}", "N".repeat(PAD), "N".repeat(PAD));
        assert!(fa.starts_with(&format!(">a-Ala-AGC-1-1\n{}\n>b-Gly-CCC-1-1\n", padded)));

        let snps = std::fs::read_to_string(paths.snps()).unwrap();
        assert_eq!(snps, ">a-Ala-AGC-1-1_snp0 a-Ala-AGC-1-1:21 GN\n>a-Ala-AGC-1-1_snp1 a-Ala-AGC-1-1:24 CN\n");

        // every SNP owner appears exactly once in BED and GFF with the same length
        let bed = std::fs::read_to_string(paths.transcripts_bed()).unwrap();
        let gff = std::fs::read_to_string(paths.gff()).unwrap();
        let bed_len: HashMap<&str, usize> = bed
            .lines()
            .map(|l| {
                let f: Vec<&str> = l.split('\t').collect();
                (f[0], f[2].parse::<usize>().unwrap() - f[1].parse::<usize>().unwrap())
            })
            .collect();
        assert_eq!(bed_len.len(), 2);
        assert_eq!(bed_len["a-Ala-AGC-1-1"], 6);
        assert_eq!(gff.lines().filter(|l| l.starts_with("a-Ala-AGC-1-1\t")).count(), 1);
        assert!(!paths.cluster_info().exists());
    }

    #[test]
    fn cluster_mode_emits_representatives() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "exp");
        let txs = vec![
            tx("a-Ala-AGC-1-1", "GGGCCA", vec![1]),
            tx("a-Ala-AGC-2-1", "GGGCCA", vec![2]),
        ];
        let set = ClusterSet {
            assignments: vec![("a-Ala-AGC-1-1".to_string(), 1), ("a-Ala-AGC-2-1".to_string(), 1)],
            clusters: vec![Cluster {
                number: 1,
                representative: "a-Ala-AGC-1-1".to_string(),
                members: vec!["a-Ala-AGC-1-1".to_string(), "a-Ala-AGC-2-1".to_string()],
                modified: vec![1, 2],
            }],
        };
        let summary = emit_index(&paths, &txs, Some(&set)).unwrap();
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.snps, 2);
        assert_eq!(summary.coverage_bed, paths.cluster_bed());
        assert_eq!(summary.genome_fasta, paths.cluster_fasta());

        assert_eq!(
            std::fs::read_to_string(paths.cluster_info()).unwrap(),
            "a-Ala-AGC-1-1\t1\na-Ala-AGC-2-1\t1\n"
        );
        assert_eq!(std::fs::read_to_string(paths.cluster_bed()).unwrap(), "a-Ala-AGC-1-1\t20\t26\ta-Ala-AGC-1-1\t1000\t+\n");
        // full per-transcript outputs are still present
        assert_eq!(std::fs::read_to_string(paths.transcripts_bed()).unwrap().lines().count(), 2);
        let gff = std::fs::read_to_string(paths.gff()).unwrap();
        assert_eq!(gff.lines().count(), 1);
    }
}
