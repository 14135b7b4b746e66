use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::{Result, TrnaError};

/// FASTA 输出每行碱基数
pub const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: String,
    /// 记录头所在行号（1-based）
    pub line: usize,
}

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    lineno: usize,
    peek_header: Option<(String, usize)>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
            lineno: 0,
            peek_header: None,
        }
    }

    pub fn next_record(&mut self) -> std::io::Result<Option<FastaRecord>> {
        if self.done {
            return Ok(None);
        }

        // Find header line
        let (header, line) = if let Some(h) = self.peek_header.take() {
            h
        } else {
            loop {
                self.buf.clear();
                let n = self.reader.read_line(&mut self.buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                self.lineno += 1;
                if let Some(rest) = self.buf.strip_prefix('>') {
                    break (rest.trim().to_string(), self.lineno);
                }
            }
        };

        // Parse id and description
        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // Read sequence lines
        let mut seq = String::new();
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf)?;
            if n == 0 {
                self.done = true;
                break;
            }
            self.lineno += 1;
            if let Some(rest) = self.buf.strip_prefix('>') {
                self.peek_header = Some((rest.trim().to_string(), self.lineno));
                break;
            }
            for c in self.buf.chars() {
                match c {
                    '\n' | '\r' | ' ' | '\t' => {}
                    _ => seq.push(c.to_ascii_uppercase()),
                }
            }
        }

        Ok(Some(FastaRecord { id, desc, seq, line }))
    }
}

/// 读取整个 FASTA 文件（保持输入顺序）
pub fn read_fasta_file(path: &Path) -> Result<Vec<FastaRecord>> {
    let fh = std::fs::File::open(path).map_err(|e| TrnaError::io(path, e))?;
    let mut reader = FastaReader::new(std::io::BufReader::new(fh));
    let mut records = Vec::new();
    while let Some(rec) = reader.next_record().map_err(|e| TrnaError::io(path, e))? {
        records.push(rec);
    }
    Ok(records)
}

/// 写出一条 FASTA 记录，序列按 `LINE_WIDTH` 折行
pub fn write_record<W: Write>(w: &mut W, id: &str, seq: &str) -> std::io::Result<()> {
    writeln!(w, ">{}", id)?;
    let bytes = seq.as_bytes();
    if bytes.is_empty() {
        return writeln!(w);
    }
    for chunk in bytes.chunks(LINE_WIDTH) {
        w.write_all(chunk)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
