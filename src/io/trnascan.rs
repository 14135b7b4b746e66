//! tRNAscan-SE `.out` 表解析：构建内含子位置表
//!
//! Data rows start with a chromosome token (`chr...`). Columns 0, 1, 2, 6 and
//! 7 are used: sequence name, tRNA number, tRNA begin, intron begin, intron
//! end. Intron bounds of `0` mean the tRNA has no intron.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::{Result, TrnaError};

const MIN_FIELDS: usize = 8;

/// 内含子在转录本上的相对位置，半开区间 [start, stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntronSpan {
    pub start: usize,
    pub stop: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

pub type IntronMap = HashMap<String, IntronSpan>;

/// 由基因组坐标换算转录本相对坐标
///
/// Returns `None` when either intron bound is zero (no intron) and an error
/// message when the coordinates would go negative.
pub fn relative_span(
    tx_start: u64,
    intron_start: u64,
    intron_stop: u64,
) -> std::result::Result<Option<(Strand, IntronSpan)>, String> {
    if intron_start == 0 || intron_stop == 0 {
        return Ok(None);
    }

    let (strand, start, stop) = if tx_start > intron_start {
        let start = tx_start - intron_start;
        let stop = (tx_start + 1)
            .checked_sub(intron_stop)
            .ok_or_else(|| format!("intron end {} beyond tRNA begin {}", intron_stop, tx_start))?;
        (Strand::Reverse, start, stop)
    } else {
        let start = intron_start - tx_start;
        let stop = (intron_stop + 1)
            .checked_sub(tx_start)
            .ok_or_else(|| format!("intron end {} before tRNA begin {}", intron_stop, tx_start))?;
        (Strand::Forward, start, stop)
    };

    if stop < start {
        return Err(format!("intron span [{}, {}) is inverted", start, stop));
    }
    Ok(Some((strand, IntronSpan { start: start as usize, stop: stop as usize })))
}

pub fn read_intron_map<R: BufRead>(reader: R, path: &Path) -> Result<IntronMap> {
    let mut map = IntronMap::new();
    let mut n_reverse = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| TrnaError::io(path, e))?;
        if !line.starts_with("chr") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(TrnaError::parse(
                path,
                i + 1,
                format!("expected at least {} columns, found {}", MIN_FIELDS, fields.len()),
            ));
        }

        let num = |idx: usize| -> Result<u64> {
            fields[idx].parse::<u64>().map_err(|_| {
                TrnaError::parse(path, i + 1, format!("column {} is not a coordinate: '{}'", idx + 1, fields[idx]))
            })
        };
        let tx_start = num(2)?;
        let intron_start = num(6)?;
        let intron_stop = num(7)?;

        let id = format!("{}.trna{}", fields[0], fields[1]);
        match relative_span(tx_start, intron_start, intron_stop) {
            Ok(Some((strand, span))) => {
                if strand == Strand::Reverse {
                    n_reverse += 1;
                }
                map.insert(id, span);
            }
            Ok(None) => {}
            Err(reason) => return Err(TrnaError::parse(path, i + 1, reason)),
        }
    }

    log::info!("{} introns registered ({} on reverse strand)...", map.len(), n_reverse);
    Ok(map)
}

pub fn read_intron_file(path: &Path) -> Result<IntronMap> {
    let fh = std::fs::File::open(path).map_err(|e| TrnaError::io(path, e))?;
    read_intron_map(std::io::BufReader::new(fh), path)
}
