use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, Level};
use simple_logger::init_with_level;

use trna_index::align::BlastnAligner;
use trna_index::cluster::UsearchClusterer;
use trna_index::config::{BuildConfig, DEFAULT_CLUSTER_ID};
use trna_index::index::{build_gsnap_indices, GsnapTools, OutputPaths};
use trna_index::pipeline::build_snp_index;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "trna-index",
    author,
    version,
    about = "Modification-aware SNP index construction for mature tRNA read mapping",
    arg_required_else_help = true
)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build transcripts, annotations and the modification SNP file
    Build {
        /// Genomic tRNA FASTA from tRNAscan-SE
        #[arg(short = 't', long = "trnas")]
        trnas: PathBuf,
        /// tRNAscan-SE output table (intron coordinates)
        #[arg(short = 'o', long = "trnaout")]
        trnaout: PathBuf,
        /// MODOMICS modified tRNA sequences
        #[arg(short = 'm', long = "modomics")]
        modomics: PathBuf,
        /// Modification code table (name, abbreviation, reference base, code)
        #[arg(long = "modifications")]
        modifications: PathBuf,
        /// Experiment name, used as output file prefix
        #[arg(short = 'n', long = "name")]
        name: String,
        /// Output directory; must not exist
        #[arg(long = "out-dir")]
        out_dir: PathBuf,
        /// Cluster isodecoders sharing an anticodon
        #[arg(long = "cluster")]
        cluster: bool,
        /// Clustering identity threshold (0.0 - 1.0)
        #[arg(long = "cluster-id", default_value_t = DEFAULT_CLUSTER_ID, value_parser = parse_identity)]
        cluster_id: f64,
        /// Do not add 3'-CCA and 5'-G for His
        #[arg(long = "no-posttrans-mod")]
        no_posttrans_mod: bool,
        /// 0 uses all cores
        #[arg(short = 'p', long = "threads", default_value_t = 0)]
        threads: usize,
        #[arg(long = "blastn", default_value = "blastn")]
        blastn: PathBuf,
        #[arg(long = "usearch", default_value = "usearch")]
        usearch: PathBuf,
        /// Keep temporary alignment and clustering files
        #[arg(long = "keep-temp")]
        keep_temp: bool,
    },
    /// Build the GSNAP genome and SNP indices from an existing build directory
    Gsnap {
        #[arg(short = 'n', long = "name")]
        name: String,
        #[arg(long = "out-dir")]
        out_dir: PathBuf,
        /// Index cluster representatives instead of all transcripts
        #[arg(long = "cluster")]
        cluster: bool,
        #[arg(long = "gmap-build", default_value = "gmap_build")]
        gmap_build: PathBuf,
        #[arg(long = "iit-store", default_value = "iit_store")]
        iit_store: PathBuf,
        #[arg(long = "snpindex", default_value = "snpindex")]
        snpindex: PathBuf,
    },
}

fn parse_identity(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{} not in range 0.0 - 1.0", v))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_level(if cli.verbose { Level::Debug } else { Level::Info })?;
    let start = std::time::Instant::now();

    match cli.command {
        Commands::Build {
            trnas,
            trnaout,
            modomics,
            modifications,
            name,
            out_dir,
            cluster,
            cluster_id,
            no_posttrans_mod,
            threads,
            blastn,
            usearch,
            keep_temp,
        } => {
            let mut cfg = BuildConfig::new(trnas, trnaout, modomics, modifications, name, out_dir);
            cfg.cluster = cluster;
            cfg.cluster_id = cluster_id;
            cfg.posttrans_mod = !no_posttrans_mod;
            cfg.threads = threads;
            cfg.keep_temp = keep_temp;
            cfg.blastn = blastn;
            cfg.usearch = usearch;
            run_build(&cfg)?;
        }
        Commands::Gsnap { name, out_dir, cluster, gmap_build, iit_store, snpindex } => {
            let tools = GsnapTools { gmap_build, iit_store, snpindex };
            run_gsnap(&tools, &out_dir, &name, cluster)?;
        }
    }

    info!("Elapsed time: {:?}", start.elapsed());
    Ok(())
}

fn run_build(cfg: &BuildConfig) -> Result<()> {
    let aligner = BlastnAligner::new(&cfg.blastn);
    let clusterer = UsearchClusterer::new(&cfg.usearch);
    let summary = build_snp_index(cfg, &aligner, &clusterer)?;

    println!("transcripts: {}", summary.meta.counts.transcripts);
    println!("matched: {}", summary.meta.counts.matched);
    println!("unmatched: {}", summary.meta.counts.unmatched);
    if let Some(n) = summary.meta.counts.clusters {
        println!("clusters: {}", n);
    }
    println!("snps: {}", summary.emitted.snps);
    println!("coverage bed: {}", summary.emitted.coverage_bed.display());
    Ok(())
}

fn run_gsnap(tools: &GsnapTools, out_dir: &Path, name: &str, cluster: bool) -> Result<()> {
    let paths = OutputPaths::new(out_dir, name);
    let genome = if cluster { paths.cluster_fasta() } else { paths.transcripts_fasta() };
    let snps = paths.snps();
    for p in [&genome, &snps] {
        if !p.is_file() {
            anyhow::bail!("'{}' not found; run `trna-index build` first", p.display());
        }
    }

    let idx = build_gsnap_indices(tools, out_dir, name, &genome, &snps)?;
    println!("genome index: {} ({})", idx.genome_index_path.display(), idx.genome_index_name);
    println!("snp index: {} ({})", idx.snp_index_path.display(), idx.snp_index_name);
    Ok(())
}
