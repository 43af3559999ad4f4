// Transform engine: deduplicate raw rows and derive computed columns
// Author: Gabriel Demetrios Lafis

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use crate::data::{
    column_index, format_margin, gross_margin, processing_days, DataError, Priority,
    DERIVED_COLUMNS, ORDER_DATE, ORDER_ID, ORDER_PRIORITY, SHIP_DATE, TOTAL_PROFIT,
    TOTAL_REVENUE,
};
use crate::utils::TransformConfig;
use super::{delimiter_byte, TransformError};

/// Counters for one transform pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
    pub rows_read: u64,
    pub rows_written: u64,
    pub duplicates_skipped: u64,
    pub malformed_skipped: u64,
}

/// State of one transform pass.
///
/// The seen-key set lives here and nowhere else, so two passes never share
/// deduplication state. Feeding cleaned output back in is not idempotent:
/// the derived columns would be treated as raw columns and appended again.
pub struct TransformEngine {
    raw_header: Vec<String>,
    key_index: usize,
    priority_index: Option<usize>,
    order_date_index: Option<usize>,
    ship_date_index: Option<usize>,
    profit_index: Option<usize>,
    revenue_index: Option<usize>,
    seen_keys: HashSet<String>,
    summary: TransformSummary,
}

impl TransformEngine {
    /// Create an engine from the cells of the raw header line
    pub fn new<S: AsRef<str>>(raw_header: &[S]) -> Result<Self, TransformError> {
        let raw_header: Vec<String> = raw_header.iter().map(|h| h.as_ref().to_string()).collect();

        let key_index = column_index(&raw_header, ORDER_ID)
            .ok_or_else(|| TransformError::MissingColumn(ORDER_ID.to_string()))?;

        Ok(TransformEngine {
            key_index,
            priority_index: column_index(&raw_header, ORDER_PRIORITY),
            order_date_index: column_index(&raw_header, ORDER_DATE),
            ship_date_index: column_index(&raw_header, SHIP_DATE),
            profit_index: column_index(&raw_header, TOTAL_PROFIT),
            revenue_index: column_index(&raw_header, TOTAL_REVENUE),
            raw_header,
            seen_keys: HashSet::new(),
            summary: TransformSummary::default(),
        })
    }

    /// The raw header with the derived column names appended
    pub fn cleaned_header(&self) -> Vec<String> {
        let mut header = self.raw_header.clone();
        header.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
        header
    }

    /// Transform one raw row, or return `None` when the row is dropped.
    ///
    /// Short rows and repeated business keys are skipped; any other failure
    /// drops the row without affecting the rest of the pass. Empty cells past
    /// the end of the header are ignored, other extra cells drop the row.
    pub fn transform_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Option<Vec<String>> {
        self.summary.rows_read += 1;

        // A line ending in the delimiter carries empty cells past the header
        let mut len = cells.len();
        while len > self.raw_header.len() && cells[len - 1].as_ref().trim().is_empty() {
            len -= 1;
        }
        let cells = &cells[..len];

        if cells.len() < self.raw_header.len() {
            self.summary.malformed_skipped += 1;
            return None;
        }

        // The first occurrence claims the key even if it fails below.
        let key = cells[self.key_index].as_ref();
        if !self.seen_keys.insert(key.to_string()) {
            self.summary.duplicates_skipped += 1;
            return None;
        }

        match self.clean_row(cells) {
            Ok(row) => {
                self.summary.rows_written += 1;
                Some(row)
            }
            Err(err) => {
                debug!("Dropping row {}: {}", self.summary.rows_read, err);
                self.summary.malformed_skipped += 1;
                None
            }
        }
    }

    fn clean_row<S: AsRef<str>>(&self, cells: &[S]) -> Result<Vec<String>, DataError> {
        if cells.len() > self.raw_header.len() {
            return Err(DataError::RowShape {
                expected: self.raw_header.len(),
                found: cells.len(),
            });
        }

        let mut row: Vec<String> = Vec::with_capacity(cells.len() + DERIVED_COLUMNS.len());
        for (i, cell) in cells.iter().enumerate() {
            if Some(i) == self.priority_index {
                row.push(Priority::from_code(cell.as_ref()).label().to_string());
            } else {
                row.push(cell.as_ref().to_string());
            }
        }

        let order_date = self.cell(cells, self.order_date_index, ORDER_DATE)?;
        let ship_date = self.cell(cells, self.ship_date_index, SHIP_DATE)?;
        row.push(processing_days(order_date, ship_date).to_string());

        let profit = self.cell(cells, self.profit_index, TOTAL_PROFIT)?;
        let revenue = self.cell(cells, self.revenue_index, TOTAL_REVENUE)?;
        row.push(format_margin(gross_margin(profit, revenue)));

        Ok(row)
    }

    fn cell<'a, S: AsRef<str>>(
        &self,
        cells: &'a [S],
        index: Option<usize>,
        name: &str,
    ) -> Result<&'a str, DataError> {
        index
            .and_then(|i| cells.get(i))
            .map(|c| c.as_ref())
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Counters accumulated so far
    pub fn summary(&self) -> &TransformSummary {
        &self.summary
    }

    pub fn into_summary(self) -> TransformSummary {
        self.summary
    }
}

/// Lazy adaptor from raw lines to cleaned lines.
///
/// The first line is the header. Cells are split on the delimiter with no
/// quoting rules. A header without the business key yields one error and
/// then ends the sequence.
pub struct CleanedLines<I> {
    lines: I,
    delimiter: char,
    engine: Option<TransformEngine>,
    finished: bool,
}

impl<I> CleanedLines<I> {
    /// Counters of the pass, once the header has been read
    pub fn summary(&self) -> Option<&TransformSummary> {
        self.engine.as_ref().map(|e| e.summary())
    }
}

/// Transform a sequence of raw lines into a lazy sequence of cleaned lines
pub fn clean_lines<I>(lines: I, config: &TransformConfig) -> CleanedLines<I::IntoIter>
where
    I: IntoIterator<Item = String>,
{
    CleanedLines {
        lines: lines.into_iter(),
        delimiter: config.delimiter,
        engine: None,
        finished: false,
    }
}

impl<I> Iterator for CleanedLines<I>
where
    I: Iterator<Item = String>,
{
    type Item = Result<String, TransformError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut buf = [0u8; 4];
        let separator: &str = self.delimiter.encode_utf8(&mut buf);

        loop {
            let line = match self.lines.next() {
                Some(line) => line,
                None => {
                    self.finished = true;
                    return None;
                }
            };
            let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
            let cells: Vec<&str> = line.split(self.delimiter).collect();

            if let Some(engine) = self.engine.as_mut() {
                if let Some(row) = engine.transform_row(&cells) {
                    return Some(Ok(row.join(separator)));
                }
                continue;
            }

            return match TransformEngine::new(&cells) {
                Ok(engine) => {
                    let header = engine.cleaned_header().join(separator);
                    self.engine = Some(engine);
                    Some(Ok(header))
                }
                Err(err) => {
                    self.finished = true;
                    Some(Err(err))
                }
            };
        }
    }
}

/// Run one transform pass from a raw table stream to a cleaned table stream.
///
/// Cells are read and written with the csv crate, so quoted cells containing
/// the delimiter survive the pass. Bytes that are not valid UTF-8 are
/// replaced rather than failing the row.
pub fn transform_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    config: &TransformConfig,
) -> Result<TransformSummary, TransformError> {
    let delimiter = delimiter_byte(config.delimiter)
        .ok_or(TransformError::InvalidDelimiter(config.delimiter))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut records = csv_reader.byte_records();

    let header = match records.next() {
        Some(header) => header?,
        None => {
            warn!("Raw table is empty, nothing to transform");
            return Ok(TransformSummary::default());
        }
    };
    let header: Vec<Cow<str>> = header.iter().map(String::from_utf8_lossy).collect();

    let mut engine = TransformEngine::new(&header)?;
    csv_writer.write_record(&engine.cleaned_header())?;

    for record in records {
        let record = record?;
        let cells: Vec<Cow<str>> = record.iter().map(String::from_utf8_lossy).collect();

        if let Some(row) = engine.transform_row(&cells) {
            csv_writer.write_record(&row)?;
        }
    }

    csv_writer.flush()?;

    let summary = engine.into_summary();
    info!(
        "Transformed {} rows: {} written, {} duplicates, {} malformed",
        summary.rows_read, summary.rows_written, summary.duplicates_skipped, summary.malformed_skipped
    );

    Ok(summary)
}

/// Transform a raw table file into a cleaned table file
pub fn transform_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &TransformConfig,
) -> Result<TransformSummary, TransformError> {
    info!(
        "Transforming {} into {}",
        input.as_ref().display(),
        output.as_ref().display()
    );

    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);

    transform_stream(reader, writer, config)
}
