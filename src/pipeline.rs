//! SNP 索引构建流程
//!
//! modification table -> intron map -> transcripts -> MODOMICS records ->
//! matching -> (clustering) -> emitted index files and run summary.

use std::path::PathBuf;

use crate::align::{match_transcripts, Aligner, MatchOpt, MatchReport};
use crate::cluster::{resolve_clusters, ClusterSet, Clusterer};
use crate::config::BuildConfig;
use crate::error::{Result, TrnaError};
use crate::index::{emit_index, prepare_output_dir, EmitSummary, OutputPaths, RunInputs, RunMeta};
use crate::io::{fasta, modomics, modtable::ModTable, trnascan};
use crate::trna::{assemble_transcripts, AssembleOpt, Category, Transcript};

#[derive(Debug)]
pub struct BuildSummary {
    pub paths: OutputPaths,
    pub transcripts: Vec<Transcript>,
    pub report: MatchReport,
    pub clusters: Option<ClusterSet>,
    pub emitted: EmitSummary,
    pub meta: RunMeta,
    /// 保留下来的临时目录（仅 `keep_temp`）
    pub scratch: Option<PathBuf>,
}

/// 构建修饰 SNP 索引及其注释文件
///
/// The output directory is created first; if it already exists the run stops
/// with [`TrnaError::OutputConflict`] before anything is read or written.
/// Any later failure removes the directory again, so a failed run can be
/// repeated with the same arguments.
pub fn build_snp_index<A, C>(cfg: &BuildConfig, aligner: &A, clusterer: &C) -> Result<BuildSummary>
where
    A: Aligner + ?Sized,
    C: Clusterer + ?Sized,
{
    cfg.validate()?;
    prepare_output_dir(&cfg.out_dir)?;

    build_in(cfg, aligner, clusterer).map_err(|e| {
        if let Err(rm) = std::fs::remove_dir_all(&cfg.out_dir) {
            log::warn!("cannot remove incomplete output directory {}: {}", cfg.out_dir.display(), rm);
        }
        e
    })
}

fn build_in<A, C>(cfg: &BuildConfig, aligner: &A, clusterer: &C) -> Result<BuildSummary>
where
    A: Aligner + ?Sized,
    C: Clusterer + ?Sized,
{
    let paths = OutputPaths::new(&cfg.out_dir, &cfg.name);

    let scratch = tempfile::Builder::new()
        .prefix("tmp")
        .tempdir_in(&cfg.out_dir)
        .map_err(|e| TrnaError::io(&cfg.out_dir, e))?;

    log::info!("Processing tRNA sequences and modification data...");
    let table = ModTable::from_file(&cfg.modifications)?;
    log::info!("{} modification codes loaded", table.len());
    let introns = trnascan::read_intron_file(&cfg.trnaout)?;
    let genomic = fasta::read_fasta_file(&cfg.trnas)?;
    let mut transcripts = assemble_transcripts(
        &genomic,
        &introns,
        AssembleOpt { posttrans_mod: cfg.posttrans_mod },
        &cfg.trnas,
    )?;
    let records = modomics::read_modomics_file(&cfg.modomics, &table)?;
    log::info!("{} modification database records", records.len());

    log::info!("Matching tRNA sequences to the modification database...");
    let report = match_transcripts(
        &mut transcripts,
        &records,
        aligner,
        scratch.path(),
        MatchOpt { threads: cfg.threads },
    )?;

    let clusters = if cfg.cluster {
        Some(resolve_clusters(&transcripts, clusterer, cfg.cluster_id, scratch.path())?)
    } else {
        None
    };

    let emitted = emit_index(&paths, &transcripts, clusters.as_ref())?;

    let mut meta = RunMeta::new(
        &cfg.name,
        RunInputs {
            trnas: cfg.trnas.display().to_string(),
            trnaout: cfg.trnaout.display().to_string(),
            modomics: cfg.modomics.display().to_string(),
            modifications: cfg.modifications.display().to_string(),
        },
    );
    meta.build_args = Some(std::env::args().collect::<Vec<_>>().join(" "));
    meta.posttrans_mod = cfg.posttrans_mod;
    meta.cluster_identity = cfg.cluster.then_some(cfg.cluster_id);
    meta.counts.transcripts = transcripts.len();
    meta.counts.mitochondrial = transcripts.iter().filter(|t| t.category == Category::Mitochondrial).count();
    meta.counts.modification_records = records.len();
    meta.counts.matched = report.matched;
    meta.counts.unmatched = report.unmatched();
    meta.counts.dropped_offsets = report.dropped_offsets;
    meta.counts.clusters = clusters.as_ref().map(|s| s.clusters.len());
    meta.counts.emitted = emitted.emitted;
    meta.counts.snps = emitted.snps;
    meta.write_json(&paths.summary())?;

    let scratch = if cfg.keep_temp {
        let kept = scratch.keep();
        log::info!("temporary files kept in {}", kept.display());
        Some(kept)
    } else {
        None
    };

    Ok(BuildSummary { paths, transcripts, report, clusters, emitted, meta, scratch })
}
