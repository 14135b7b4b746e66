use std::path::Path;

use rayon::prelude::*;

use super::{select_best_hit, Aligner, MatchOutcome, SeqRef};
use crate::error::{Result, TrnaError};
use crate::io::modomics::ModRecord;
use crate::trna::Transcript;

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOpt {
    /// 线程数，0 表示使用全部核心
    pub threads: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    /// 与输入转录本一一对应
    pub outcomes: Vec<MatchOutcome>,
    pub matched: usize,
    pub no_candidates: usize,
    pub below_threshold: usize,
    pub no_anticodon: usize,
    /// 超出转录本长度而被丢弃的修饰位置数
    pub dropped_offsets: usize,
}

impl MatchReport {
    pub fn unmatched(&self) -> usize {
        self.no_candidates + self.below_threshold + self.no_anticodon
    }
}

/// 匹配一条转录本：返回结果与应写入的修饰位置
fn match_one<A: Aligner + ?Sized>(
    tx: &Transcript,
    records: &[ModRecord],
    aligner: &A,
    scratch: &Path,
) -> Result<(MatchOutcome, Vec<usize>)> {
    let Some(anticodon) = tx.anticodon.as_deref() else {
        log::debug!("{}: no anticodon in id", tx.id);
        return Ok((MatchOutcome::NoAnticodon, Vec::new()));
    };

    let candidates: Vec<&ModRecord> = records.iter().filter(|r| r.anticodon.contains(anticodon)).collect();
    if candidates.is_empty() {
        log::warn!("{}: no modification record with anticodon {}", tx.id, anticodon);
        return Ok((MatchOutcome::NoCandidates, Vec::new()));
    }

    // one directory per transcript, removed when `dir` drops
    let prefix = format!("{}.", tx.id.replace(['/', '\\'], "_"));
    let dir = tempfile::Builder::new()
        .prefix(&prefix)
        .tempdir_in(scratch)
        .map_err(|e| TrnaError::io(scratch, e))?;

    let subjects: Vec<SeqRef<'_>> = candidates
        .iter()
        .map(|r| SeqRef { id: &r.id, seq: &r.unmod_sequence })
        .collect();
    let hits = aligner.align(SeqRef { id: &tx.id, seq: &tx.sequence }, &subjects, dir.path())?;

    let Some(best) = select_best_hit(&hits) else {
        log::debug!("{}: {} candidates, no hit above coverage threshold", tx.id, candidates.len());
        return Ok((MatchOutcome::BelowThreshold, Vec::new()));
    };
    let record = candidates
        .iter()
        .find(|r| r.id == best.subject_id)
        .ok_or_else(|| TrnaError::ExternalTool {
            command: format!("align {}", tx.id),
            code: Some(0),
            stderr: format!("hit on unknown subject '{}'", best.subject_id),
        })?;

    Ok((MatchOutcome::Matched { record_id: record.id.clone() }, record.modified.clone()))
}

/// 为每条转录本匹配修饰记录并写入修饰位置
///
/// Runs on a dedicated rayon pool; results keep input order. Alignment
/// failures abort the whole run, match misses never do.
pub fn match_transcripts<A: Aligner + ?Sized>(
    transcripts: &mut [Transcript],
    records: &[ModRecord],
    aligner: &A,
    scratch: &Path,
    opt: MatchOpt,
) -> Result<MatchReport> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(opt.threads).build()?;
    let results: Vec<(MatchOutcome, Vec<usize>)> = pool.install(|| {
        transcripts
            .par_iter()
            .map(|tx| match_one(tx, records, aligner, scratch))
            .collect::<Result<Vec<_>>>()
    })?;

    let mut report = MatchReport { outcomes: Vec::with_capacity(results.len()), ..MatchReport::default() };
    for (tx, (outcome, modified)) in transcripts.iter_mut().zip(results) {
        match &outcome {
            MatchOutcome::Matched { .. } => report.matched += 1,
            MatchOutcome::NoCandidates => report.no_candidates += 1,
            MatchOutcome::BelowThreshold => report.below_threshold += 1,
            MatchOutcome::NoAnticodon => report.no_anticodon += 1,
        }

        let len = tx.len();
        let mut kept: Vec<usize> = modified.into_iter().filter(|&p| p < len).collect();
        kept.sort_unstable();
        kept.dedup();
        if let MatchOutcome::Matched { record_id } = &outcome {
            let n_dropped = records
                .iter()
                .find(|r| &r.id == record_id)
                .map_or(0, |r| r.modified.len().saturating_sub(kept.len()));
            if n_dropped > 0 {
                log::warn!("{}: {} modified positions of {} fall outside the transcript", tx.id, n_dropped, record_id);
                report.dropped_offsets += n_dropped;
            }
        }
        tx.modified = kept;
        report.outcomes.push(outcome);
    }

    if report.unmatched() > 0 {
        log::warn!(
            "{} tRNAs without a modification match ({} no candidate, {} below coverage, {} without anticodon)",
            report.unmatched(),
            report.no_candidates,
            report.below_threshold,
            report.no_anticodon
        );
    }
    log::info!("{} total tRNA gene sequences", transcripts.len());
    log::info!("{} sequences with a match to the modification database", report.matched);
    Ok(report)
}
