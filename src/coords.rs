use crate::tsv_reader::IntervalReader;
use crate::types::{Interval, LinenumPair, TagRecord};
use anyhow::Result;
use std::io::Read;

/// What happened during a mapping pass, for the stderr report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapSummary {
    pub pairs_mapped: u64,
    pub intervals_consumed: usize,
    /// Bytes of the interval stream left unread by the main pass and drained.
    pub bytes_drained: u64,
    /// First line number that needed an interval after the table ran out.
    pub exhausted_at_line: Option<i64>,
    /// First (previous, current) pair of line numbers that went backwards.
    pub first_decrease: Option<(i64, i64)>,
}

/// Single forward pass mapping virtual line numbers onto interval coordinates.
///
/// `pos` is the virtual position of the last base of the most recently read
/// interval, starting at -1. Intervals are read only while the requested line
/// lies beyond `pos`, so line numbers must arrive in non-decreasing order.
pub struct CoordMapper<R: Read> {
    intervals: IntervalReader<R>,
    current: Option<Interval>,
    pos: i64,
    exhausted: bool,
    last_line: Option<i64>,
    summary: MapSummary,
}

impl<R: Read> CoordMapper<R> {
    pub fn new(intervals: IntervalReader<R>) -> Self {
        CoordMapper {
            intervals,
            current: None,
            pos: -1,
            exhausted: false,
            last_line: None,
            summary: MapSummary::default(),
        }
    }

    /// Current cumulative virtual position.
    pub fn position(&self) -> i64 {
        self.pos
    }

    /// Physical coordinate of virtual line `line`, advancing through the
    /// interval table as needed.
    ///
    /// When the table runs out the last interval stays in effect, so lines past
    /// the end of the table map beyond that interval's end.
    pub fn locate(&mut self, line: i64) -> Result<(&Interval, i64)> {
        if let Some(prev) = self.last_line {
            if line < prev && self.summary.first_decrease.is_none() {
                self.summary.first_decrease = Some((prev, line));
            }
        }
        self.last_line = Some(line);

        while line > self.pos && !self.exhausted {
            match self.intervals.next_interval()? {
                Some(interval) => {
                    self.pos += interval.len();
                    self.current = Some(interval);
                }
                None => {
                    self.exhausted = true;
                    self.summary.exhausted_at_line = Some(line);
                }
            }
        }
        let pos = self.pos;
        match self.current.as_ref() {
            Some(interval) => Ok((interval, interval.end - (pos - line + 1))),
            None => anyhow::bail!("Interval table is empty; cannot map line {}", line),
        }
    }

    /// Left and right tags for one fragment.
    pub fn map_pair(&mut self, pair: LinenumPair) -> Result<[TagRecord; 2]> {
        let (interval, s) = self.locate(pair.line)?;
        let left = TagRecord::at(&interval.contig, s);
        let right = TagRecord::at(&interval.contig, s + pair.fragment_length);
        self.summary.pairs_mapped += 1;
        Ok([left, right])
    }

    /// Drain the rest of the interval stream and report what happened.
    pub fn finish(self) -> Result<MapSummary> {
        let mut summary = self.summary;
        summary.intervals_consumed = self.intervals.consumed();
        let (_, drained) = self.intervals.drain()?;
        summary.bytes_drained = drained;
        Ok(summary)
    }
}

/// Map every pair, handing each tag to `emit` in order (left tag first), then
/// drain the interval stream.
pub fn map_to_coords<R, I, F>(intervals: IntervalReader<R>, pairs: I, mut emit: F) -> Result<MapSummary>
where
    R: Read,
    I: IntoIterator<Item = Result<LinenumPair>>,
    F: FnMut(&TagRecord) -> Result<()>,
{
    let mut mapper = CoordMapper::new(intervals);
    for pair in pairs {
        let [left, right] = mapper.map_pair(pair?)?;
        emit(&left)?;
        emit(&right)?;
    }
    mapper.finish()
}
