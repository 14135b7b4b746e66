//! 从基因组 tRNA 序列构建成熟 tRNA
//!
//! Introns registered by tRNAscan-SE are spliced out, then the
//! post-transcriptional 3'-CCA (and 5'-G for histidine tRNAs) is added.

use std::collections::HashSet;
use std::path::Path;

use super::{Category, Isotype, Transcript, ORGANELLE_MARKER};
use crate::error::{Result, TrnaError};
use crate::io::fasta::FastaRecord;
use crate::io::trnascan::IntronMap;

const SCAN_ID_MARKER: &str = "tRNAscan-SE ID: ";
const CCA_TAIL: &str = "CCA";
const HIS_LEADER: &str = "G";

#[derive(Debug, Clone, Copy)]
pub struct AssembleOpt {
    /// 是否补 3'-CCA / 5'-G
    pub posttrans_mod: bool,
}

impl Default for AssembleOpt {
    fn default() -> Self {
        Self { posttrans_mod: true }
    }
}

/// 从 FASTA 描述中提取 tRNAscan-SE ID
///
/// `(tRNAscan-SE ID: chr6.trna65) Ala (AGC) ...` -> `chr6.trna65`
pub fn scan_id(desc: &str) -> Option<&str> {
    let start = desc.find(SCAN_ID_MARKER)? + SCAN_ID_MARKER.len();
    let len = desc[start..].find(')')?;
    Some(&desc[start..start + len])
}

/// `Homo_sapiens_nmt-tRNA-Leu-TAA-1-1` -> `Homo_sapiens_nmt_tRNA-Leu-TAA-1-1`
pub fn mito_label(label: &str) -> String {
    match label.split_once('-') {
        Some((head, rest)) => format!("{}_{}", head, rest),
        None => format!("{}_", label),
    }
}

/// 切除内含子并补加转录后碱基
pub fn mature_sequence(
    label: &str,
    genomic: &str,
    intron: Option<(usize, usize)>,
    isotype: Isotype,
    opt: AssembleOpt,
) -> std::result::Result<String, String> {
    let mut seq = match intron {
        Some((start, stop)) => {
            if start > stop || stop > genomic.len() {
                return Err(format!(
                    "intron [{}, {}) outside {} ({} bp)",
                    start,
                    stop,
                    label,
                    genomic.len()
                ));
            }
            let mut s = String::with_capacity(genomic.len() - (stop - start) + 4);
            s.push_str(&genomic[..start]);
            s.push_str(&genomic[stop..]);
            s
        }
        None => genomic.to_string(),
    };

    if opt.posttrans_mod {
        if isotype == Isotype::Histidine {
            seq.insert_str(0, HIS_LEADER);
        }
        seq.push_str(CCA_TAIL);
    }
    Ok(seq)
}

pub fn assemble_transcripts(
    records: &[FastaRecord],
    introns: &IntronMap,
    opt: AssembleOpt,
    path: &Path,
) -> Result<Vec<Transcript>> {
    let mut out = Vec::with_capacity(records.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut n_spliced = 0usize;

    for rec in records {
        let intron = match rec.desc.as_deref().and_then(scan_id) {
            Some(id) => introns.get(id).map(|span| (span.start, span.stop)),
            None => {
                log::warn!("{}: no tRNAscan-SE ID in header, intron lookup skipped", rec.id);
                None
            }
        };
        if intron.is_some() {
            n_spliced += 1;
        }

        let isotype = Isotype::from_label(&rec.id);
        let sequence = mature_sequence(&rec.id, &rec.seq, intron, isotype, opt)
            .map_err(|reason| TrnaError::parse(path, rec.line, reason))?;

        let (id, category) = if rec.id.contains(ORGANELLE_MARKER) {
            (mito_label(&rec.id), Category::Mitochondrial)
        } else {
            (rec.id.clone(), Category::Cytosolic)
        };

        if !seen.insert(id.clone()) {
            return Err(TrnaError::parse(path, rec.line, format!("duplicate tRNA label '{}'", id)));
        }
        out.push(Transcript::new(id, sequence, category, isotype));
    }

    log::info!("{} tRNA sequences assembled ({} spliced)", out.len(), n_spliced);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fasta::FastaReader;
    use crate::io::trnascan::IntronSpan;

    fn record(id: &str, desc: &str, seq: &str) -> FastaRecord {
        FastaRecord { id: id.to_string(), desc: Some(desc.to_string()), seq: seq.to_string(), line: 1 }
    }

    #[test]
    fn scan_id_extraction() {
        assert_eq!(scan_id("(tRNAscan-SE ID: chr6.trna65) Ala (AGC) 73 bp"), Some("chr6.trna65"));
        assert_eq!(scan_id("Ala (AGC) 73 bp"), None);
        assert_eq!(scan_id("(tRNAscan-SE ID: chr6.trna65"), None);
    }

    #[test]
    fn histidine_gets_leading_g_and_cca() {
        let seq = mature_sequence("tRNA-His-GTG-1-1", "GCCGTG", None, Isotype::Histidine, AssembleOpt::default()).unwrap();
        assert_eq!(seq, "GGCCGTGCCA");
    }

    #[test]
    fn posttrans_disabled_leaves_sequence() {
        let opt = AssembleOpt { posttrans_mod: false };
        let seq = mature_sequence("tRNA-His-GTG-1-1", "GCCGTG", None, Isotype::Histidine, opt).unwrap();
        assert_eq!(seq, "GCCGTG");
    }

    #[test]
    fn intron_is_excised_half_open() {
        let opt = AssembleOpt { posttrans_mod: false };
        let seq = mature_sequence("t", "AAAATTTTCCCC", Some((4, 8)), Isotype::Other, opt).unwrap();
        assert_eq!(seq, "AAAACCCC");
        assert!(mature_sequence("t", "AAAA", Some((2, 9)), Isotype::Other, opt).is_err());
    }

    #[test]
    fn mito_labels_are_rewritten_in_place() {
        assert_eq!(mito_label("Homo_sapiens_nmt-tRNA-Leu-TAA-1-1"), "Homo_sapiens_nmt_tRNA-Leu-TAA-1-1");

        let recs = vec![
            record("Homo_sapiens_tRNA-Ala-AGC-1-1", "(tRNAscan-SE ID: chr6.trna1) Ala", "GGGG"),
            record("Homo_sapiens_nmt-tRNA-Leu-TAA-1-1", "(tRNAscan-SE ID: chr1.trna9) Leu", "TTTT"),
        ];
        let txs = assemble_transcripts(&recs, &IntronMap::new(), AssembleOpt::default(), Path::new("t.fa")).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].category, Category::Cytosolic);
        assert_eq!(txs[1].id, "Homo_sapiens_nmt_tRNA-Leu-TAA-1-1");
        assert_eq!(txs[1].category, Category::Mitochondrial);
        assert_eq!(txs[1].anticodon.as_deref(), Some("TAA"));
        assert_eq!(txs[1].sequence, "TTTTCCA");
    }

    #[test]
    fn reverse_strand_intron_is_spliced_by_scan_id() {
        let mut introns = IntronMap::new();
        introns.insert("chr1.trna12".to_string(), IntronSpan { start: 50, stop: 71 });
        let genomic = format!("{}{}{}", "A".repeat(50), "T".repeat(21), "C".repeat(10));
        let recs = vec![record("Homo_sapiens_tRNA-Tyr-GTA-1-1", "(tRNAscan-SE ID: chr1.trna12) Tyr (GTA)", &genomic)];
        let txs = assemble_transcripts(&recs, &introns, AssembleOpt::default(), Path::new("t.fa")).unwrap();
        assert_eq!(txs[0].sequence, format!("{}{}CCA", "A".repeat(50), "C".repeat(10)));
    }

    #[test]
    fn duplicate_labels_report_header_line() {
        let text = ">t-Ala-AGC first\nAA\nAA\n>t-Ala-AGC second\nCC\n";
        let mut reader = FastaReader::new(std::io::Cursor::new(text.as_bytes()));
        let mut recs = Vec::new();
        while let Some(rec) = reader.next_record().unwrap() {
            recs.push(rec);
        }
        let err = assemble_transcripts(&recs, &IntronMap::new(), AssembleOpt::default(), Path::new("t.fa")).unwrap_err();
        assert!(matches!(err, TrnaError::Parse { line: 4, .. }), "{err}");
    }
}
