//! 修饰碱基参考表解析
//!
//! Tab-separated `name, abbreviation, reference base, modification code`
//! rows. Lines starting with `#` are comments.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{Result, TrnaError};

/// queuosine 在参考表中的 reference 写作 preQ0base，按 G 处理
const QUEUOSINE_REFERENCE: &str = "preQ0base";
/// MODOMICS 中插入位置的标记
const INSERTION_MARK: char = '_';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub name: String,
    pub abbr: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModTable {
    entries: HashMap<char, ModEntry>,
}

impl ModTable {
    pub fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut entries = HashMap::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TrnaError::io(path, e))?;
            // only the terminator: trailing empty columns are meaningful
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(TrnaError::parse(
                    path,
                    i + 1,
                    format!("expected 4 tab-separated fields, found {}", fields.len()),
                ));
            }

            let code = fields[3].trim();
            if code.is_empty() {
                continue;
            }
            let mut chars = code.chars();
            let key = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    // sequences are read one character at a time, such a code can never match
                    log::warn!("{}:{}: skipping multi-character modification code '{}'", path.display(), i + 1, code);
                    continue;
                }
            };

            let reference = match fields[2].trim() {
                "" => "N".to_string(),
                r => r.to_string(),
            };
            entries.insert(
                key,
                ModEntry {
                    name: fields[0].trim().to_string(),
                    abbr: fields[1].trim().to_string(),
                    reference,
                },
            );
        }

        log::debug!("{} modification codes loaded from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let fh = std::fs::File::open(path).map_err(|e| TrnaError::io(path, e))?;
        Self::from_reader(std::io::BufReader::new(fh), path)
    }

    pub fn get(&self, code: char) -> Option<&ModEntry> {
        self.entries.get(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 把修饰编码换算回未修饰的标准碱基
    ///
    /// Standard bases and `N` absent from the table map to themselves (`U` -> `T`);
    /// references that are not a single base become `N`.
    pub fn unmodified_base(&self, code: char) -> Result<char> {
        if code == INSERTION_MARK {
            return Ok('N');
        }
        if let Some(entry) = self.entries.get(&code) {
            return Ok(reference_base(&entry.reference));
        }
        match code {
            'A' | 'C' | 'G' | 'T' | 'N' => Ok(code),
            'U' => Ok('T'),
            _ => Err(TrnaError::UnknownModification { code }),
        }
    }

    /// 对整条序列做 `unmodified_base` 换算
    pub fn unmodified_sequence(&self, seq: &str) -> Result<String> {
        seq.chars().map(|c| self.unmodified_base(c)).collect()
    }
}

fn reference_base(reference: &str) -> char {
    if reference == QUEUOSINE_REFERENCE {
        return 'G';
    }
    match reference {
        "A" | "C" | "G" | "T" | "N" => reference.chars().next().unwrap_or('N'),
        "U" => 'T',
        _ => 'N',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load(text: &str) -> Result<ModTable> {
        ModTable::from_reader(Cursor::new(text.as_bytes()), Path::new("mods.tsv"))
    }

    #[test]
    fn parses_rows_and_skips_comments() {
        let t = load("#name\tabbr\tref\tcode\n1-methyladenosine\tm1A\tA\t\"\ndihydrouridine\tD\tU\tD\n").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get('D').unwrap().abbr, "D");
        assert_eq!(t.unmodified_base('"').unwrap(), 'A');
        assert_eq!(t.unmodified_base('D').unwrap(), 'T');
    }

    #[test]
    fn blank_reference_becomes_wildcard() {
        let t = load("unknown modified adenosine\tnA\t \t*\n").unwrap();
        assert_eq!(t.get('*').unwrap().reference, "N");
        assert_eq!(t.unmodified_base('*').unwrap(), 'N');
    }

    #[test]
    fn blank_code_rows_are_skipped() {
        let t = load("adenosine\tA\tA\t\ncytidine\tC\tC\t \n").unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn queuosine_resolves_to_guanine() {
        let t = load("Queuosine\tQ\tpreQ0base\tQ\n").unwrap();
        assert_eq!(t.get('Q').unwrap().reference, "preQ0base");
        assert_eq!(t.unmodified_base('Q').unwrap(), 'G');
    }

    #[test]
    fn wrong_field_count_is_parse_error() {
        let err = load("adenosine\tA\tA\n").unwrap_err();
        match err {
            TrnaError::Parse { line, reason, .. } => {
                assert_eq!(line, 1);
                assert!(reason.contains("found 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn standard_bases_and_insertions_without_entries() {
        let t = ModTable::default();
        assert_eq!(t.unmodified_sequence("ACGU_").unwrap(), "ACGTN");
        assert!(matches!(t.unmodified_base('Q'), Err(TrnaError::UnknownModification { code: 'Q' })));
    }
}
