//! Header-indexed decoding of feed tables.
//!
//! The first row names the columns. Each [`Schema`] column is looked up in
//! it once, and every following row is projected onto those positions
//! before being deserialized, so column order in the file does not matter.
//! Quotes and carriage returns are stripped from every field; quoted
//! delimiters are not supported.

use std::borrow::Cow;
use std::fs::File;
use std::io;
use std::marker::PhantomData;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::{LoadError, Result};
use crate::gtfs::{Record, Schema};

pub struct TableReader<T, R> {
    schema: Schema,
    reader: csv::Reader<R>,
    /// Position in the header row of each schema column.
    positions: Vec<usize>,
    columns: StringRecord,
    raw: StringRecord,
    _record: PhantomData<T>,
}

impl<T: Record> TableReader<T, File> {
    /// Open a table file. A file that cannot be opened, or has no header
    /// row, yields `Ok(None)`.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        match File::open(path) {
            Ok(file) => Self::from_reader(file),
            Err(err) => {
                warn!(
                    table = T::SCHEMA.table,
                    path = %path.display(),
                    %err,
                    "Cannot open table, loading nothing from it"
                );
                Ok(None)
            }
        }
    }
}

impl<T: Record, R: io::Read> TableReader<T, R> {
    pub fn from_reader(reader: R) -> Result<Option<Self>> {
        let schema = T::SCHEMA;
        let mut reader = csv::ReaderBuilder::new()
            .quoting(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: StringRecord = reader
            .headers()
            .map_err(|source| LoadError::Read {
                table: schema.table,
                source,
            })?
            .iter()
            .map(clean_field)
            .collect();

        if headers.is_empty() {
            warn!(table = schema.table, "Table has no header row, loading nothing from it");
            return Ok(None);
        }

        let positions = schema
            .columns
            .iter()
            .map(|&column| {
                headers
                    .iter()
                    .position(|header| header == column)
                    .ok_or(LoadError::MissingColumn {
                        table: schema.table,
                        column,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(table = schema.table, ?positions, "Resolved table columns");

        Ok(Some(Self {
            schema,
            reader,
            positions,
            columns: schema.columns.iter().collect(),
            raw: StringRecord::new(),
            _record: PhantomData,
        }))
    }

    fn decode(&self) -> Result<T> {
        let table = self.schema.table;
        let line = self.raw.position().map_or(0, |position| position.line());

        let mut fields = StringRecord::with_capacity(self.raw.as_slice().len(), self.positions.len());
        for (&column, &position) in self.schema.columns.iter().zip(&self.positions) {
            let raw = self.raw.get(position).ok_or(LoadError::MissingField {
                table,
                line,
                column,
            })?;
            fields.push_field(&clean_field(raw));
        }

        fields
            .deserialize(Some(&self.columns))
            .map_err(|source| LoadError::MalformedRow {
                table,
                line,
                source,
            })
    }
}

impl<T: Record, R: io::Read> Iterator for TableReader<T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.raw) {
            Ok(false) => None,
            Ok(true) => Some(self.decode()),
            Err(source) => Some(Err(LoadError::Read {
                table: self.schema.table,
                source,
            })),
        }
    }
}

fn clean_field(raw: &str) -> Cow<'_, str> {
    if raw.contains(['"', '\r']) {
        Cow::Owned(raw.chars().filter(|&c| c != '"' && c != '\r').collect())
    } else {
        Cow::Borrowed(raw)
    }
}
