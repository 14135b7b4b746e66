//! # trna-index
//!
//! 面向成熟 tRNA 读段比对的修饰感知 SNP 索引构建工具。
//!
//! tRNA 上的转录后修饰会在逆转录时造成错配。本 crate 把已知的修饰位点
//! 映射到成熟 tRNA 序列上，并以 SNP 的形式写入索引输入，供下游支持
//! SNP 的比对器使用：
//!
//! - **转录本组装**：基因组 tRNA 去内含子，补 3'-CCA 与 His 的 5'-G
//! - **修饰数据库标准化**：MODOMICS 序列还原为未修饰序列并记录修饰位置
//! - **匹配**：按反密码子筛选候选，调用外部局部比对（blastn）选择最佳命中
//! - **聚类**（可选）：同反密码子的转录本按相似度聚类（usearch），合并修饰位置
//! - **输出**：两侧 N 填充的 FASTA、BED/GFF 注释、簇成员表、SNP 记录
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use trna_index::align::BlastnAligner;
//! use trna_index::cluster::UsearchClusterer;
//! use trna_index::config::BuildConfig;
//! use trna_index::pipeline::build_snp_index;
//!
//! let mut cfg = BuildConfig::new(
//!     "hg19-tRNAs.fa",
//!     "hg19-tRNAs_name_map.out",
//!     "modomics_mods.fa",
//!     "modificationSNPs.txt",
//!     "hg19",
//!     "out/hg19",
//! );
//! cfg.cluster = true;
//! let summary = build_snp_index(&cfg, &BlastnAligner::default(), &UsearchClusterer::default())?;
//! println!("{} SNP records, coverage BED {}", summary.emitted.snps, summary.emitted.coverage_bed.display());
//! # Ok::<(), trna_index::error::TrnaError>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`io`]：FASTA、修饰代码表、tRNAscan-SE 内含子表与 MODOMICS 解析
//! - [`trna`]：成熟 tRNA 转录本模型与组装
//! - [`align`]：比对原语接口、最佳命中选择与修饰位置传递
//! - [`cluster`]：相似度聚类与修饰位置合并
//! - [`index`]：索引输入文件、运行摘要与 GSNAP 索引构建
//! - [`pipeline`]：完整构建流程
//! - [`util`]：碱基工具函数与外部命令调用

pub mod align;
pub mod cluster;
pub mod config;
pub mod error;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod trna;
pub mod util;
