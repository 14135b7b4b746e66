//! 成熟 tRNA 与修饰数据库的比对匹配
//!
//! The local-alignment primitive itself is external (blastn); this module
//! defines its contract ([`Aligner`]), best-hit selection and the matcher that
//! propagates modified positions onto transcripts.

pub mod blast;
pub mod matcher;

use std::path::Path;

use crate::error::Result;

pub use blast::BlastnAligner;
pub use matcher::{match_transcripts, MatchOpt, MatchReport};

/// 命中需覆盖 subject 长度的最小比例
pub const MIN_SUBJECT_COVERAGE: f64 = 0.9;

/// 比对输入序列
#[derive(Debug, Clone, Copy)]
pub struct SeqRef<'a> {
    pub id: &'a str,
    pub seq: &'a str,
}

/// 一条局部比对命中（HSP）
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub subject_id: String,
    pub subject_len: usize,
    pub align_len: usize,
    /// bit score
    pub score: f64,
}

impl Hit {
    pub fn subject_coverage(&self) -> f64 {
        if self.subject_len == 0 {
            return 0.0;
        }
        self.align_len as f64 / self.subject_len as f64
    }
}

/// 局部比对原语
///
/// One call aligns a single query against all subjects. `scratch` is a
/// directory owned by the caller for the duration of the call; nothing else
/// writes into it concurrently.
pub trait Aligner: Sync {
    fn align(&self, query: SeqRef<'_>, subjects: &[SeqRef<'_>], scratch: &Path) -> Result<Vec<Hit>>;
}

/// 单条转录本的匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched { record_id: String },
    /// 反密码子在修饰数据库中没有候选
    NoCandidates,
    /// 有候选但无命中达到覆盖度阈值
    BelowThreshold,
    /// id 中取不到反密码子
    NoAnticodon,
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

/// 选出覆盖度达标且得分最高的命中
///
/// Ties keep the hit the aligner reported first.
pub fn select_best_hit(hits: &[Hit]) -> Option<&Hit> {
    let mut best: Option<&Hit> = None;
    for hit in hits {
        if hit.score <= 0.0 || hit.subject_coverage() < MIN_SUBJECT_COVERAGE {
            continue;
        }
        if best.map_or(true, |b| hit.score > b.score) {
            best = Some(hit);
        }
    }
    best
}
