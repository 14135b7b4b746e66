pub const STANDARD_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// 未知或模糊碱基
pub const WILDCARD: u8 = b'N';

/// 比对 gap / 缺失标记
pub const GAP: u8 = b'-';

#[inline]
pub fn is_standard_base(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// RNA -> DNA：U 替换为 T（大小写保持）
pub fn rna_to_dna(seq: &str) -> String {
    seq.chars()
        .map(|c| match c {
            'U' => 'T',
            'u' => 't',
            other => other,
        })
        .collect()
}

/// 等长序列逐位比较，返回不一致位置（0-based）
///
/// 只比较较短序列的长度范围；调用方负责保证长度一致。
pub fn mismatch_positions(a: &[u8], b: &[u8]) -> Vec<usize> {
    a.iter()
        .zip(b.iter())
        .enumerate()
        .filter(|(_, (x, y))| !x.eq_ignore_ascii_case(y))
        .map(|(i, _)| i)
        .collect()
}

/// 在序列两侧各加 `width` 个 N
pub fn pad_sequence(seq: &str, width: usize) -> String {
    let mut out = String::with_capacity(seq.len() + 2 * width);
    for _ in 0..width {
        out.push(WILDCARD as char);
    }
    out.push_str(&seq.to_ascii_uppercase());
    for _ in 0..width {
        out.push(WILDCARD as char);
    }
    out
}
