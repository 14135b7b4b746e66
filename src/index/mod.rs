//! 索引输入与 GSNAP 索引
//!
//! - [`emit`]: padded FASTA, BED/GFF annotations and the SNP file
//! - [`meta`]: JSON run summary
//! - [`gsnap`]: optional genome/SNP index build through the GSNAP tools

pub mod emit;
pub mod gsnap;
pub mod meta;

pub use emit::{emit_index, prepare_output_dir, EmitSummary, OutputPaths, PAD};
pub use gsnap::{build_gsnap_indices, GsnapIndex, GsnapTools};
pub use meta::{RunCounts, RunInputs, RunMeta};
