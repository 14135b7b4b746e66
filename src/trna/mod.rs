//! 成熟 tRNA 转录本模型

pub mod assemble;

pub use assemble::{assemble_transcripts, AssembleOpt};

/// 标签中表示核编码线粒体 tRNA 的标记
pub const ORGANELLE_MARKER: &str = "nmt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Cytosolic,
    Mitochondrial,
}

impl Category {
    /// `mito...` (any case) is mitochondrial, everything else cytosolic
    pub fn from_label(label: &str) -> Self {
        if label.trim().to_ascii_lowercase().starts_with("mito") {
            Category::Mitochondrial
        } else {
            Category::Cytosolic
        }
    }
}

/// 决定 5' 端是否补 G
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isotype {
    Histidine,
    Other,
}

impl Isotype {
    pub fn from_label(label: &str) -> Self {
        if label.contains("His") {
            Isotype::Histidine
        } else {
            Isotype::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: String,
    /// 成熟序列（大写）
    pub sequence: String,
    pub category: Category,
    pub isotype: Isotype,
    pub anticodon: Option<String>,
    /// 修饰位置（0-based，升序且不重复），由比对阶段写入
    pub modified: Vec<usize>,
}

impl Transcript {
    pub fn new(id: String, sequence: String, category: Category, isotype: Isotype) -> Self {
        let anticodon = anticodon_of(&id).map(str::to_string);
        Self { id, sequence, category, isotype, anticodon, modified: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// `Homo_sapiens_tRNA-Ala-AGC-1-1` -> `AGC`
pub fn anticodon_of(id: &str) -> Option<&str> {
    id.split('-').nth(2).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anticodon_is_third_hyphen_token() {
        assert_eq!(anticodon_of("Homo_sapiens_tRNA-Ala-AGC-1-1"), Some("AGC"));
        assert_eq!(anticodon_of("Homo_sapiens_nmt_tRNA-Leu-TAA-1-1"), Some("TAA"));
        assert_eq!(anticodon_of("chr1.trna5"), None);
        assert_eq!(anticodon_of("a-b--c"), None);
    }

    #[test]
    fn category_from_database_labels() {
        assert_eq!(Category::from_label("cytosolic"), Category::Cytosolic);
        assert_eq!(Category::from_label(" Mitochondrial"), Category::Mitochondrial);
        assert_eq!(Category::from_label("plastid"), Category::Cytosolic);
    }

    #[test]
    fn new_transcript_takes_anticodon_from_id() {
        let t = Transcript::new(
            "Homo_sapiens_tRNA-His-GTG-1-1".to_string(),
            "GCCGTGCCA".to_string(),
            Category::Cytosolic,
            Isotype::from_label("Homo_sapiens_tRNA-His-GTG-1-1"),
        );
        assert_eq!(t.anticodon.as_deref(), Some("GTG"));
        assert_eq!(t.isotype, Isotype::Histidine);
        assert!(t.modified.is_empty());
        assert_eq!(t.len(), 9);
    }
}
