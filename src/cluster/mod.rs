//! 同工受体 tRNA 聚类与修饰位置合并
//!
//! Transcripts sharing an anticodon are clustered by an external similarity
//! primitive ([`Clusterer`]). Each resulting cluster carries the union of its
//! members' modified positions; members that differ from their centroid by
//! substitutions also contribute the mismatch positions themselves, members
//! with indels become their own cluster.

pub mod usearch;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{Result, TrnaError};
use crate::trna::Transcript;
use crate::util::dna;

pub use usearch::UsearchClusterer;

/// 成员相对中心序列的差异类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterRelation {
    /// 全长一致
    Identical,
    /// 含插入或缺失
    Indel,
    /// 仅有替换
    Substitutions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterRecord {
    Centroid { id: String },
    Member { id: String, centroid: String, relation: ClusterRelation },
}

/// 相似度聚类原语
pub trait Clusterer {
    /// Partition `members` at `identity` (0.0-1.0). `scratch` belongs to the
    /// call.
    fn cluster(&self, members: &[&Transcript], identity: f64, scratch: &Path) -> Result<Vec<ClusterRecord>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub number: usize,
    /// 代表序列（中心序列或独立成簇的 indel 成员）
    pub representative: String,
    pub members: Vec<String>,
    /// 合并后的修饰位置（升序）
    pub modified: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSet {
    /// (转录本 id, 簇编号)，每条转录本恰好出现一次
    pub assignments: Vec<(String, usize)>,
    pub clusters: Vec<Cluster>,
}

impl ClusterSet {
    pub fn cluster_of(&self, id: &str) -> Option<usize> {
        self.assignments.iter().find(|(t, _)| t == id).map(|&(_, n)| n)
    }
}

/// 聚类过程中的簇
struct Pending {
    number: usize,
    representative: String,
    members: Vec<String>,
    modified: BTreeSet<usize>,
}

impl Pending {
    fn new(number: usize, tx: &Transcript) -> Self {
        Self {
            number,
            representative: tx.id.clone(),
            members: vec![tx.id.clone()],
            modified: tx.modified.iter().copied().collect(),
        }
    }
}

/// 按反密码子分组（保持首次出现顺序）
pub fn group_by_anticodon(transcripts: &[Transcript]) -> Vec<(String, Vec<&Transcript>)> {
    let mut order: Vec<(String, Vec<&Transcript>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for tx in transcripts {
        let key = tx.anticodon.as_deref().unwrap_or("");
        match index.get(key) {
            Some(&i) => order[i].1.push(tx),
            None => {
                index.insert(key, order.len());
                order.push((key.to_string(), vec![tx]));
            }
        }
    }
    order
}

fn lookup<'t>(by_id: &HashMap<&str, &'t Transcript>, anticodon: &str, id: &str) -> Result<&'t Transcript> {
    by_id.get(id).copied().ok_or_else(|| TrnaError::ExternalTool {
        command: format!("cluster {}", anticodon),
        code: Some(0),
        stderr: format!("clustering reported unknown sequence '{}'", id),
    })
}

pub fn resolve_clusters<C: Clusterer + ?Sized>(
    transcripts: &[Transcript],
    clusterer: &C,
    identity: f64,
    scratch: &Path,
) -> Result<ClusterSet> {
    if !(0.0..=1.0).contains(&identity) {
        return Err(TrnaError::Config(format!("cluster identity {} not in range 0.0 - 1.0", identity)));
    }
    log::info!("Clustering tRNA sequences by {:.0}% similarity...", identity * 100.0);

    let mut next_number = 0usize;
    let mut set = ClusterSet::default();

    for (anticodon, members) in group_by_anticodon(transcripts) {
        let by_id: HashMap<&str, &Transcript> = members.iter().map(|t| (t.id.as_str(), *t)).collect();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}.", if anticodon.is_empty() { "none" } else { &anticodon }))
            .tempdir_in(scratch)
            .map_err(|e| TrnaError::io(scratch, e))?;
        let records = clusterer.cluster(&members, identity, dir.path())?;

        // centroids first so member rows may precede their centroid row
        let mut pending: Vec<Pending> = Vec::new();
        let mut slot: HashMap<String, usize> = HashMap::new();
        for rec in &records {
            if let ClusterRecord::Centroid { id } = rec {
                if slot.contains_key(id) {
                    continue;
                }
                next_number += 1;
                slot.insert(id.clone(), pending.len());
                pending.push(Pending::new(next_number, lookup(&by_id, &anticodon, id)?));
            }
        }

        for rec in &records {
            let ClusterRecord::Member { id, centroid, relation } = rec else {
                continue;
            };
            if slot.contains_key(id) {
                log::warn!("{}: reported twice by clustering, keeping first assignment", id);
                continue;
            }
            let member = lookup(&by_id, &anticodon, id)?;
            let Some(&ci) = slot.get(centroid) else {
                return Err(TrnaError::ExternalTool {
                    command: format!("cluster {}", anticodon),
                    code: Some(0),
                    stderr: format!("member '{}' refers to unknown centroid '{}'", id, centroid),
                });
            };
            let centre = lookup(&by_id, &anticodon, centroid)?;

            let relation = match relation {
                ClusterRelation::Substitutions if member.len() != centre.len() => ClusterRelation::Indel,
                r => *r,
            };
            match relation {
                ClusterRelation::Identical => {
                    pending[ci].modified.extend(member.modified.iter().copied());
                    pending[ci].members.push(id.clone());
                    slot.insert(id.clone(), ci);
                }
                ClusterRelation::Substitutions => {
                    let mismatches = dna::mismatch_positions(member.sequence.as_bytes(), centre.sequence.as_bytes());
                    pending[ci].modified.extend(mismatches);
                    pending[ci].modified.extend(member.modified.iter().copied());
                    pending[ci].members.push(id.clone());
                    slot.insert(id.clone(), ci);
                }
                ClusterRelation::Indel => {
                    next_number += 1;
                    slot.insert(id.clone(), pending.len());
                    pending.push(Pending::new(next_number, member));
                }
            }
        }

        // anything the clusterer left out becomes a singleton
        for tx in &members {
            if !slot.contains_key(&tx.id) {
                log::warn!("{}: not assigned by clustering, kept as its own cluster", tx.id);
                next_number += 1;
                slot.insert(tx.id.clone(), pending.len());
                pending.push(Pending::new(next_number, tx));
            }
        }

        for tx in &members {
            set.assignments.push((tx.id.clone(), pending[slot[&tx.id]].number));
        }
        set.clusters.extend(pending.into_iter().map(|p| Cluster {
            number: p.number,
            representative: p.representative,
            members: p.members,
            modified: p.modified.into_iter().collect(),
        }));
    }

    log::info!("{} clusters created from {} tRNA sequences", set.clusters.len(), transcripts.len());
    Ok(set)
}
