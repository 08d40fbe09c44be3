//! Header-keyed access to CSV rows shared by the per-atom and kinetics tables.

use super::error::Error;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::warn;
use std::collections::HashMap;
use std::io::Read;

/// One data row with its columns looked up by header name.
pub(crate) struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
    /// One-based line of the row in its file.
    pub line: u64,
}

impl<'a> Row<'a> {
    /// Trimmed cell text; empty and `null` cells are absent.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        let cell = self.record.get(*self.columns.get(name)?)?.trim();
        (!cell.is_empty() && !cell.eq_ignore_ascii_case("null")).then_some(cell)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        let raw = self.text(name)?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                warn!("line {}: {name} = {raw:?} is not a number; ignored", self.line);
                None
            }
        }
    }

    /// A non-negative whole number, also accepted when written as `3.0`.
    pub fn index(&self, name: &str) -> Option<usize> {
        let value = self.number(name)?;
        if value < 0.0 || value.fract() != 0.0 {
            warn!("line {}: {name} = {value} is not an index; ignored", self.line);
            return None;
        }
        Some(value as usize)
    }
}

/// Calls `visit` for every data row of a headed CSV stream.
pub(crate) fn for_each_row<R: Read>(
    reader: R,
    mut visit: impl FnMut(&Row<'_>),
) -> Result<(), Error> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);
    let columns: HashMap<String, usize> = csv
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i))
        .collect();

    let mut record = StringRecord::new();
    while csv.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        visit(&Row {
            columns: &columns,
            record: &record,
            line,
        });
    }
    Ok(())
}
