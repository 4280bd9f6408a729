use crate::types::{LinenumPair, QValueResult, TagRecord};
use anyhow::Result;
use csv::Writer;
use std::io::Write;

/// Headerless, unquoted, tab-delimited writer.
pub fn tsv_writer<W: Write>(wtr: W) -> Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(wtr)
}

/// Observed record followed by its q-value with four decimals.
pub fn write_q_value<W: Write>(wtr: &mut Writer<W>, result: &QValueResult) -> Result<()> {
    let q = format!("{:.4}", result.q_value);
    wtr.write_record(result.record.fields.iter().map(String::as_str).chain(std::iter::once(q.as_str())))?;
    Ok(())
}

pub fn write_tag<W: Write>(wtr: &mut Writer<W>, tag: &TagRecord) -> Result<()> {
    let start = tag.start.to_string();
    let end = tag.end.to_string();
    wtr.write_record([tag.contig.as_str(), start.as_str(), end.as_str()])?;
    Ok(())
}

pub fn write_pair<W: Write>(wtr: &mut Writer<W>, pair: &LinenumPair) -> Result<()> {
    wtr.write_record(&[pair.line.to_string(), pair.fragment_length.to_string()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreRecord;

    fn written<F: FnOnce(&mut Writer<Vec<u8>>) -> Result<()>>(f: F) -> String {
        let mut wtr = tsv_writer(Vec::new());
        f(&mut wtr).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_q_value_line() {
        let result = QValueResult {
            record: ScoreRecord {
                fields: vec!["chr1".to_string(), "a \"quoted\" field".to_string(), "2.0".to_string()],
                score: 2.0,
            },
            q_value: 2.0 / 3.0,
        };
        let out = written(|w| write_q_value(w, &result));
        assert_eq!(out, "chr1\ta \"quoted\" field\t2.0\t0.6667\n");
    }

    #[test]
    fn test_zero_q_formatting() {
        let result = QValueResult {
            record: ScoreRecord {
                fields: vec!["x".to_string()],
                score: 9.0,
            },
            q_value: 0.0,
        };
        assert_eq!(written(|w| write_q_value(w, &result)), "x\t0.0000\n");
    }

    #[test]
    fn test_tag_and_pair_lines() {
        let out = written(|w| {
            write_tag(w, &TagRecord::at("chrX", 41))?;
            write_pair(w, &LinenumPair { line: 7, fragment_length: 180 })
        });
        assert_eq!(out, "chrX\t41\t42\n7\t180\n");
    }
}
