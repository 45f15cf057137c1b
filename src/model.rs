//! Static order-0 frequency model.
//!
//! A [`FrequencyTable`] counts bytes once per input. An [`IntervalTable`]
//! turns those counts into cumulative slices of `[0, total)`, laid out in
//! ascending symbol order, with a width-1 END slice appended last when the
//! stream is self-terminating. Encoder and decoder must derive the exact same
//! layout from the same table, so ordering comes from a `BTreeMap` and never
//! from hash iteration.

use std::collections::BTreeMap;

use crate::coder::precision_for_total;
use crate::error::{Error, Result};

/// Symbol occurrence counts, keyed by byte value.
///
/// Only symbols with a non-zero count are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<u8, u64>,
}

impl FrequencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every byte of `data`.
    pub fn from_data(data: &[u8]) -> Self {
        let mut raw = [0u64; 256];
        for &b in data {
            raw[b as usize] += 1;
        }
        raw.iter().enumerate().map(|(s, &c)| (s as u8, c)).collect()
    }

    /// Set the count for `symbol`, returning the previous count.
    ///
    /// A zero count removes the symbol.
    pub fn insert(&mut self, symbol: u8, count: u64) -> Option<u64> {
        if count == 0 {
            self.counts.remove(&symbol)
        } else {
            self.counts.insert(symbol, count)
        }
    }

    /// Count for `symbol` (zero when absent).
    pub fn get(&self, symbol: u8) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Whether `symbol` occurs at least once.
    pub fn contains(&self, symbol: u8) -> bool {
        self.counts.contains_key(&symbol)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when no symbol occurs.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }

    /// Sum of all counts, i.e. the length of the data the table describes.
    ///
    /// Saturates instead of wrapping; a saturated total is rejected later as
    /// [`Error::TotalTooLarge`].
    pub fn total(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Shannon entropy of the table in bits per symbol.
    ///
    /// This is the lower bound on what any order-0 coder can achieve for
    /// the data the table was built from.
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        self.counts
            .values()
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

impl FromIterator<(u8, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for (symbol, count) in iter {
            table.insert(symbol, count);
        }
        table
    }
}

/// Pick a byte value for END that does not occur in `table`.
///
/// Tries `0x00`, then `0xFF`, then scans `0x00..=0xFE`. Returns `None` when
/// all 256 values are in use.
pub fn choose_unused_symbol(table: &FrequencyTable) -> Option<u8> {
    [0x00, 0xFF]
        .into_iter()
        .chain(0x00..0xFF)
        .find(|&s| !table.contains(s))
}

/// A symbol as seen by the coder: a data byte or the END marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A literal data byte.
    Byte(u8),
    /// End of stream.
    End,
}

/// One symbol's slice `[start, end)` of the cumulative frequency range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeInterval {
    /// Byte value (for END, the value chosen by [`choose_unused_symbol`]).
    pub symbol: u8,
    /// Inclusive lower bound.
    pub start: u64,
    /// Exclusive upper bound.
    pub end: u64,
    /// Whether this slice belongs to the END marker.
    pub is_end: bool,
}

impl CumulativeInterval {
    /// `end - start`.
    pub fn width(&self) -> u64 {
        self.end - self.start
    }

    /// Whether `value` falls inside the slice.
    pub fn contains(&self, value: u64) -> bool {
        self.start <= value && value < self.end
    }

    /// The coder-level symbol this slice stands for.
    pub fn as_symbol(&self) -> Symbol {
        if self.is_end {
            Symbol::End
        } else {
            Symbol::Byte(self.symbol)
        }
    }
}

/// Cumulative intervals derived from a [`FrequencyTable`].
///
/// Immutable once built, so one table can be shared by reference between
/// any number of encoders and decoders.
#[derive(Debug, Clone)]
pub struct IntervalTable {
    intervals: Vec<CumulativeInterval>,
    by_symbol: [Option<u16>; 256],
    end: Option<usize>,
    total: u64,
}

impl IntervalTable {
    /// Build intervals in ascending symbol order, appending END last when
    /// `include_end` is set.
    ///
    /// # Errors
    /// - [`Error::AlphabetFull`] if END is requested and every byte occurs.
    /// - [`Error::EmptyModel`] if the resulting total is zero.
    /// - [`Error::TotalTooLarge`] if no register width can hold the total.
    pub fn new(table: &FrequencyTable, include_end: bool) -> Result<Self> {
        let end_symbol = if include_end {
            Some(choose_unused_symbol(table).ok_or(Error::AlphabetFull)?)
        } else {
            None
        };

        let mut intervals = Vec::with_capacity(table.len() + 1);
        let mut by_symbol = [None; 256];
        let mut start = 0u64;
        for (symbol, count) in table.iter() {
            let end = start
                .checked_add(count)
                .ok_or(Error::TotalTooLarge(u64::MAX))?;
            by_symbol[symbol as usize] = Some(intervals.len() as u16);
            intervals.push(CumulativeInterval {
                symbol,
                start,
                end,
                is_end: false,
            });
            start = end;
        }

        let end = match end_symbol {
            Some(symbol) => {
                let end = start.checked_add(1).ok_or(Error::TotalTooLarge(u64::MAX))?;
                intervals.push(CumulativeInterval {
                    symbol,
                    start,
                    end,
                    is_end: true,
                });
                start = end;
                Some(intervals.len() - 1)
            }
            None => None,
        };

        if start == 0 {
            return Err(Error::EmptyModel);
        }
        precision_for_total(start)?;

        Ok(Self {
            intervals,
            by_symbol,
            end,
            total: start,
        })
    }

    /// Sum of all widths, END included.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Byte value reserved for END, if the table has one.
    pub fn end_symbol(&self) -> Option<u8> {
        self.end.map(|i| self.intervals[i].symbol)
    }

    /// Interval of a data byte.
    pub fn interval_for(&self, byte: u8) -> Option<&CumulativeInterval> {
        self.by_symbol[byte as usize].map(|i| &self.intervals[i as usize])
    }

    /// Interval of the END marker.
    pub fn end_interval(&self) -> Option<&CumulativeInterval> {
        self.end.map(|i| &self.intervals[i])
    }

    /// Interval of a coder symbol.
    ///
    /// # Errors
    /// [`Error::UnknownSymbol`] or [`Error::MissingEnd`] if the model has no
    /// slice for `symbol`.
    pub fn lookup(&self, symbol: Symbol) -> Result<&CumulativeInterval> {
        match symbol {
            Symbol::Byte(b) => self.interval_for(b).ok_or(Error::UnknownSymbol(b)),
            Symbol::End => self.end_interval().ok_or(Error::MissingEnd),
        }
    }

    /// Interval containing `value`, if any.
    pub fn find(&self, value: u64) -> Option<&CumulativeInterval> {
        // starts are strictly increasing in layout order
        let idx = self.intervals.partition_point(|iv| iv.end <= value);
        self.intervals.get(idx).filter(|iv| iv.contains(value))
    }

    /// Intervals in layout order.
    pub fn iter(&self) -> impl Iterator<Item = &CumulativeInterval> {
        self.intervals.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_total() {
        let table = FrequencyTable::from_data(b"BACABACA");
        assert_eq!(table.get(b'A'), 4);
        assert_eq!(table.get(b'B'), 2);
        assert_eq!(table.get(b'C'), 2);
        assert_eq!(table.get(b'Z'), 0);
        assert_eq!(table.len(), 3);
        assert_eq!(table.total(), 8);
    }

    #[test]
    fn test_zero_count_removes_symbol() {
        let mut table = FrequencyTable::from_data(b"ab");
        assert_eq!(table.insert(b'a', 0), Some(1));
        assert!(!table.contains(b'a'));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_end_symbol_preference() {
        let table = FrequencyTable::from_data(b"AABB");
        assert_eq!(choose_unused_symbol(&table), Some(0x00));

        let table = FrequencyTable::from_data(&[0x00, 0x41]);
        assert_eq!(choose_unused_symbol(&table), Some(0xFF));

        let table = FrequencyTable::from_data(&[0x00, 0x01, 0xFF]);
        assert_eq!(choose_unused_symbol(&table), Some(0x02));

        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(choose_unused_symbol(&FrequencyTable::from_data(&all)), None);
    }

    #[test]
    fn test_intervals_ascending_with_end_last() {
        let table = FrequencyTable::from_data(b"AABB");
        let model = IntervalTable::new(&table, true).unwrap();
        let got: Vec<_> = model
            .iter()
            .map(|iv| (iv.symbol, iv.start, iv.end, iv.is_end))
            .collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0], (b'A', 0, 2, false));
        assert_eq!(got[1], (b'B', 2, 4, false));
        assert_eq!(got[2], (0x00, 4, 5, true));
        assert_eq!(model.total(), 5);
        assert_eq!(model.end_symbol(), Some(0x00));
    }

    #[test]
    fn test_find() {
        let table = FrequencyTable::from_data(b"BACABACA");
        let model = IntervalTable::new(&table, true).unwrap();
        assert_eq!(model.find(0).unwrap().symbol, b'A');
        assert_eq!(model.find(3).unwrap().symbol, b'A');
        assert_eq!(model.find(4).unwrap().symbol, b'B');
        assert_eq!(model.find(7).unwrap().symbol, b'C');
        assert!(model.find(8).unwrap().is_end);
        assert!(model.find(9).is_none());
    }

    #[test]
    fn test_empty_table_with_end_only() {
        let model = IntervalTable::new(&FrequencyTable::new(), true).unwrap();
        assert_eq!(model.total(), 1);
        assert_eq!(model.lookup(Symbol::End).unwrap().width(), 1);
    }

    #[test]
    fn test_model_errors() {
        assert_eq!(
            IntervalTable::new(&FrequencyTable::new(), false).unwrap_err(),
            Error::EmptyModel
        );
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(
            IntervalTable::new(&FrequencyTable::from_data(&all), true).unwrap_err(),
            Error::AlphabetFull
        );
        let model = IntervalTable::new(&FrequencyTable::from_data(b"x"), false).unwrap();
        assert_eq!(model.lookup(Symbol::End).unwrap_err(), Error::MissingEnd);
        assert_eq!(
            model.lookup(Symbol::Byte(b'y')).unwrap_err(),
            Error::UnknownSymbol(b'y')
        );
    }

    #[test]
    fn test_entropy() {
        assert_eq!(FrequencyTable::new().entropy(), 0.0);
        assert_eq!(FrequencyTable::from_data(b"aaaa").entropy(), 0.0);
        let h = FrequencyTable::from_data(b"AABB").entropy();
        assert!((h - 1.0).abs() < 1e-12);
    }
}
