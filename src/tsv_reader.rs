use crate::types::{FragmentLengthDistribution, Interval, LinenumPair, ScoreRecord};
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Open an input path for reading. `-` means standard input; `.gz` files are
/// decompressed transparently.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let is_gz = path.extension().map(|ext| ext == "gz").unwrap_or(false);
    if is_gz {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Headerless, unquoted, tab-delimited reader. Rows may have any number of fields.
pub fn tsv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(rdr)
}

fn row_of(record: &csv::StringRecord, fallback: usize) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(fallback as u64)
}

fn parse_field<T>(record: &csv::StringRecord, idx: usize, source: &str, row: u64) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let ctx = || format!("{} row {}: field {}", source, row, idx);
    let value = record
        .get(idx)
        .with_context(|| format!("{} row {}: expected at least {} fields, found {}", source, row, idx + 1, record.len()))?;
    value.trim().parse::<T>().with_context(ctx)
}

/// Lazily parsed score records, one per input row, in input order.
pub struct ScoreRecords<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    score_column: usize,
    source: String,
    count: usize,
}

impl<R: Read> Iterator for ScoreRecords<R> {
    type Item = Result<ScoreRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.count += 1;
        Some(self.parse(record))
    }
}

impl<R: Read> ScoreRecords<R> {
    fn parse(&self, record: csv::Result<csv::StringRecord>) -> Result<ScoreRecord> {
        let record = record.with_context(|| format!("Failed to read {} row {}", self.source, self.count))?;
        let row = row_of(&record, self.count);
        let score = parse_field(&record, self.score_column, &self.source, row)?;
        Ok(ScoreRecord {
            fields: record.iter().map(|f| f.to_string()).collect(),
            score,
        })
    }
}

/// Stream score records from `rdr`, reading the score from `score_column`.
pub fn read_score_records<R: Read>(rdr: R, score_column: usize, source: &str) -> ScoreRecords<R> {
    ScoreRecords {
        records: tsv_reader(rdr).into_records(),
        score_column,
        source: source.to_string(),
        count: 0,
    }
}

/// Read every score in a file into memory.
pub fn load_scores(path: &Path, score_column: usize) -> Result<Vec<f64>> {
    let source = path.display().to_string();
    read_score_records(open_input(path)?, score_column, &source)
        .map(|r| r.map(|rec| rec.score))
        .collect()
}

/// Lazy, forward-only reader over an interval table.
///
/// Intervals are handed out one at a time and never re-read. Once the main
/// pass is over, [`IntervalReader::drain`] consumes whatever is left so a
/// producer writing into a pipe can finish cleanly.
pub struct IntervalReader<R: Read> {
    rdr: csv::Reader<R>,
    record: csv::StringRecord,
    source: String,
    count: usize,
}

impl<R: Read> IntervalReader<R> {
    pub fn new(rdr: R, source: &str) -> Self {
        IntervalReader {
            rdr: tsv_reader(rdr),
            record: csv::StringRecord::new(),
            source: source.to_string(),
            count: 0,
        }
    }

    /// Next interval, or `None` at end of input.
    pub fn next_interval(&mut self) -> Result<Option<Interval>> {
        let more = self
            .rdr
            .read_record(&mut self.record)
            .with_context(|| format!("Failed to read {} row {}", self.source, self.count + 1))?;
        if !more {
            return Ok(None);
        }
        self.count += 1;
        let row = row_of(&self.record, self.count);
        let contig: String = self
            .record
            .get(0)
            .with_context(|| format!("{} row {}: missing contig", self.source, row))?
            .to_string();
        Ok(Some(Interval {
            contig,
            start: parse_field(&self.record, 1, &self.source, row)?,
            end: parse_field(&self.record, 2, &self.source, row)?,
        }))
    }

    /// Number of intervals consumed so far.
    pub fn consumed(&self) -> usize {
        self.count
    }

    /// Read the rest of the stream to end-of-file, discarding it, and hand back
    /// the underlying reader. Returns the number of unread bytes discarded.
    pub fn drain(self) -> Result<(R, u64)> {
        let mut inner = self.rdr.into_inner();
        let discarded = io::copy(&mut inner, &mut io::sink())
            .with_context(|| format!("Failed to drain {}", self.source))?;
        Ok((inner, discarded))
    }
}

/// Lazily parsed (line number, fragment length) pairs.
pub fn read_pairs<R: Read>(rdr: R, source: &str) -> impl Iterator<Item = Result<LinenumPair>> {
    let source = source.to_string();
    tsv_reader(rdr).into_records().enumerate().map(move |(i, record)| {
        let record = record.with_context(|| format!("Failed to read {} row {}", source, i + 1))?;
        let row = row_of(&record, i + 1);
        Ok(LinenumPair {
            line: parse_field(&record, 0, &source, row)?,
            fragment_length: parse_field(&record, 1, &source, row)?,
        })
    })
}

/// Load a (length, weight) table and normalize it.
pub fn load_fragment_lengths(path: &Path) -> Result<FragmentLengthDistribution> {
    let source = path.display().to_string();
    let mut rows = Vec::new();
    for (i, record) in tsv_reader(open_input(path)?).into_records().enumerate() {
        let record = record.with_context(|| format!("Failed to read {} row {}", source, i + 1))?;
        let row = row_of(&record, i + 1);
        let length: i64 = parse_field(&record, 0, &source, row)?;
        let weight: f64 = parse_field(&record, 1, &source, row)?;
        rows.push((length, weight));
    }
    FragmentLengthDistribution::from_weights(rows)
        .with_context(|| format!("Invalid fragment-length distribution in {}", source))
}
