//! MODOMICS 修饰数据库解析与规范化
//!
//! Headers look like
//! `>tdbR00000083 Homo sapiens | Ala | IGC | 9606 1 | cytosolic`; each header
//! is followed by the modified sequence in MODOMICS one-letter codes.
//!
//! Every record is reduced to an unmodified (A/C/G/T/N) sequence plus the
//! 0-based offsets of its modified characters. Records whose anticodon
//! contains the wildcard `N` are expanded into one record per concrete base.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{Result, TrnaError};
use crate::io::modtable::ModTable;
use crate::trna::Category;
use crate::util::dna::{self, GAP, STANDARD_BASES, WILDCARD};

const MIN_HEADER_FIELDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRecord {
    pub id: String,
    /// 修饰序列（U->T，已去除 gap）
    pub sequence: String,
    /// 未修饰序列，用于与成熟 tRNA 比对
    pub unmod_sequence: String,
    /// 修饰位置（0-based，升序）
    pub modified: Vec<usize>,
    pub anticodon: String,
    pub category: Category,
}

/// 解析中的记录头
struct Header {
    line: usize,
    base_id: String,
    anticodon: String,
    category: Category,
}

pub struct ModomicsParser<'a> {
    table: &'a ModTable,
    path: &'a Path,
    records: Vec<ModRecord>,
    /// base id -> 已出现次数，用于重复 id 去重
    seen: HashMap<String, usize>,
}

impl<'a> ModomicsParser<'a> {
    pub fn new(table: &'a ModTable, path: &'a Path) -> Self {
        Self { table, path, records: Vec::new(), seen: HashMap::new() }
    }

    pub fn parse<R: BufRead>(mut self, reader: R) -> Result<Vec<ModRecord>> {
        let mut header: Option<Header> = None;
        let mut seq_line = String::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TrnaError::io(self.path, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('>') {
                if let Some(h) = header.take() {
                    self.finish(h, &seq_line)?;
                }
                seq_line.clear();
                header = Some(self.parse_header(line, i + 1)?);
            } else if header.is_some() {
                seq_line.push_str(line);
            } else {
                return Err(TrnaError::parse(self.path, i + 1, "sequence line before any header"));
            }
        }
        if let Some(h) = header.take() {
            self.finish(h, &seq_line)?;
        }

        log::info!("{} modification records after anticodon expansion", self.records.len());
        Ok(self.records)
    }

    fn parse_header(&self, line: &str, lineno: usize) -> Result<Header> {
        let normalized = line[1..].replace(" | ", "|");
        let fields: Vec<&str> = normalized.split('|').collect();
        if fields.len() < MIN_HEADER_FIELDS {
            return Err(TrnaError::parse(
                self.path,
                lineno,
                format!("expected {} '|'-separated header fields, found {}", MIN_HEADER_FIELDS, fields.len()),
            ));
        }

        let organism: Vec<&str> = fields[0].split_whitespace().collect();
        let id_taxon: Vec<&str> = fields[3].split_whitespace().collect();
        if organism.len() < 2 || id_taxon.len() < 2 {
            return Err(TrnaError::parse(self.path, lineno, "organism or id/taxon field has fewer than 2 tokens"));
        }

        let amino = match fields[1].trim() {
            "Ini" => "iMet",
            a => a,
        };
        let anticodon = self
            .table
            .unmodified_sequence(fields[2].trim())
            .map_err(|e| TrnaError::parse(self.path, lineno, e.to_string()))?;

        let base_id = format!("{}_{}_{}-{}-{}", id_taxon[0], id_taxon[1], organism[1], amino, anticodon);

        Ok(Header {
            line: lineno,
            base_id,
            anticodon,
            category: Category::from_label(fields[4]),
        })
    }

    /// 重复 id 依出现顺序追加 -1, -2, ...
    fn unique_id(&mut self, base_id: String) -> String {
        match self.seen.get_mut(&base_id) {
            Some(n) => {
                *n += 1;
                format!("{}-{}", base_id, n)
            }
            None => {
                self.seen.insert(base_id.clone(), 0);
                base_id
            }
        }
    }

    fn finish(&mut self, header: Header, raw: &str) -> Result<()> {
        let line = dna::rna_to_dna(raw);

        // offsets into the line as written, gaps included
        let modified: Vec<usize> = line
            .chars()
            .enumerate()
            .filter(|&(_, c)| !(c.is_ascii() && dna::is_standard_base(c as u8)) && c != GAP as char)
            .map(|(i, _)| i)
            .collect();

        let sequence: String = line.chars().filter(|&c| c != GAP as char).collect();
        let unmod_sequence = self
            .table
            .unmodified_sequence(&sequence)
            .map_err(|e| TrnaError::parse(self.path, header.line, e.to_string()))?;

        let variants: Vec<(String, String, String)> = if header.anticodon.contains(WILDCARD as char) {
            let prefix = header.base_id.rsplit_once('-').map_or("", |(p, _)| p);
            STANDARD_BASES
                .iter()
                .map(|&base| {
                    let rep = (base as char).to_string();
                    let anticodon = header.anticodon.replace(WILDCARD as char, &rep);
                    (
                        format!("{}-{}", prefix, anticodon),
                        anticodon,
                        unmod_sequence.replace(WILDCARD as char, &rep),
                    )
                })
                .collect()
        } else {
            vec![(header.base_id, header.anticodon, unmod_sequence)]
        };

        for (base_id, anticodon, unmod_sequence) in variants {
            let id = self.unique_id(base_id);
            self.records.push(ModRecord {
                id,
                sequence: sequence.clone(),
                unmod_sequence,
                modified: modified.clone(),
                anticodon,
                category: header.category,
            });
        }
        Ok(())
    }
}

pub fn read_modomics<R: BufRead>(reader: R, table: &ModTable, path: &Path) -> Result<Vec<ModRecord>> {
    ModomicsParser::new(table, path).parse(reader)
}

pub fn read_modomics_file(path: &Path, table: &ModTable) -> Result<Vec<ModRecord>> {
    let fh = std::fs::File::open(path).map_err(|e| TrnaError::io(path, e))?;
    read_modomics(std::io::BufReader::new(fh), table, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table() -> ModTable {
        let rows = "#name\tabbr\tref\tcode\n\
Queuosine\tQ\tpreQ0base\tQ\n\
dihydrouridine\tD\tU\tD\n\
pseudouridine\tY\tU\tP\n\
inosine\tI\tA\tI\n\
unknown modified uridine\tnU\t\tN\n";
        ModTable::from_reader(Cursor::new(rows.as_bytes()), Path::new("mods.tsv")).unwrap()
    }

    fn parse(text: &str) -> Result<Vec<ModRecord>> {
        read_modomics(Cursor::new(text.as_bytes()), &table(), Path::new("modomics.fa"))
    }

    #[test]
    fn queuosine_is_unmodified_to_guanine() {
        let recs = parse(">tdbR00000001 Homo sapiens | Tyr | QUA | 9606 1 | cytosolic\nGCUCAQCCAG\n").unwrap();
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.id, "9606_1_Homo-Tyr-GTA");
        assert_eq!(r.sequence, "GCTCAQCCAG");
        assert_eq!(r.unmod_sequence, "GCTCAGCCAG");
        assert_eq!(r.modified, vec![5]);
        assert_eq!(r.anticodon, "GTA");
        assert_eq!(r.category, Category::Cytosolic);
    }

    #[test]
    fn offsets_count_gap_characters() {
        let recs = parse(">x Homo sapiens|Ala|AGC|9606 2|cytosolic\nGG-DAP\n").unwrap();
        assert_eq!(recs[0].modified, vec![3, 5]);
        assert_eq!(recs[0].sequence, "GGDAP");
        assert_eq!(recs[0].unmod_sequence, "GGTAT");
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let rows = "5-methoxycarbonylmethyluridine\tmcm5U\tU\t\u{2200}\n";
        let table = ModTable::from_reader(Cursor::new(rows.as_bytes()), Path::new("mods.tsv")).unwrap();
        let text = ">x Homo sapiens|Arg|UCU|9606 4|cytosolic\nGG\u{2200}AC-\u{2200}G\n";
        let recs = read_modomics(Cursor::new(text.as_bytes()), &table, Path::new("modomics.fa")).unwrap();
        assert_eq!(recs[0].unmod_sequence, "GGTACTG");
        assert_eq!(recs[0].modified, vec![2, 6]);
    }

    #[test]
    fn initiator_is_renamed_and_mito_category() {
        let recs = parse(">x Homo sapiens|Ini|CAU|9606 3|mitochondrial\nAGCA\n").unwrap();
        assert_eq!(recs[0].id, "9606_3_Homo-iMet-CAT");
        assert_eq!(recs[0].category, Category::Mitochondrial);
    }

    #[test]
    fn duplicate_ids_get_incrementing_suffix() {
        let text = ">a Homo sapiens|Ala|AGC|9606 1|cytosolic\nGGA\n\
>b Homo sapiens|Ala|AGC|9606 1|cytosolic\nGGC\n\
>c Homo sapiens|Ala|AGC|9606 1|cytosolic\nGGT\n";
        let ids: Vec<String> = parse(text).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec!["9606_1_Homo-Ala-AGC", "9606_1_Homo-Ala-AGC-1", "9606_1_Homo-Ala-AGC-2"]
        );
    }

    #[test]
    fn wildcard_anticodon_expands_to_four_records() {
        let recs = parse(">a Homo sapiens|Leu|NAG|9606 7|cytosolic\nCNAGG\n").unwrap();
        assert_eq!(recs.len(), 4);
        let anticodons: Vec<&str> = recs.iter().map(|r| r.anticodon.as_str()).collect();
        assert_eq!(anticodons, vec!["AAG", "CAG", "GAG", "TAG"]);
        assert_eq!(recs[0].id, "9606_7_Homo-Leu-AAG");
        assert_eq!(recs[3].unmod_sequence, "CTAGG");
        for r in &recs {
            assert!(!r.anticodon.contains('N'));
            assert!(!r.unmod_sequence.contains('N'));
            assert_eq!(r.modified, vec![1]);
        }
    }

    #[test]
    fn normalization_is_deterministic() {
        let text = ">a Homo sapiens|Leu|NAG|9606 7|cytosolic\nCNAGG\n>b Homo sapiens|Leu|NAG|9606 7|cytosolic\nCNAGA\n";
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn unknown_code_is_parse_error() {
        let err = parse(">a Homo sapiens|Ala|AGC|9606 1|cytosolic\nGG#A\n").unwrap_err();
        match err {
            TrnaError::Parse { line, reason, .. } => {
                assert_eq!(line, 1);
                assert!(reason.contains("'#'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(matches!(parse(">a Homo sapiens|Ala|AGC\nGG\n"), Err(TrnaError::Parse { .. })));
        assert!(matches!(parse("GGA\n"), Err(TrnaError::Parse { line: 1, .. })));
    }
}
