use super::codec::{self, WORD_SIZE};
use crate::types::{DatabaseError, ScalarType, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// One field of a table bound to its backing files.
///
/// Every column has a data file; varchar columns also have an offset-index
/// file of cumulative end offsets into the data file, one per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub table: String,
    pub field: String,
    pub scalar_type: ScalarType,
    pub ordinal: usize,
    pub data_path: PathBuf,
    pub pointers_path: Option<PathBuf>,
}

impl Column {
    #[must_use]
    pub fn new(table: &str, dir: &Path, field: &str, scalar_type: ScalarType, ordinal: usize) -> Self {
        let (data_file, pointers_file) = Self::file_names(field, scalar_type);
        Self {
            table: table.to_string(),
            field: field.to_string(),
            scalar_type,
            ordinal,
            data_path: dir.join(data_file),
            pointers_path: pointers_file.map(|name| dir.join(name)),
        }
    }

    /// `<field>.col` and, for varchar, `<field>.pointers`.
    #[must_use]
    pub fn file_names(field: &str, scalar_type: ScalarType) -> (String, Option<String>) {
        let pointers = (scalar_type == ScalarType::Varchar).then(|| format!("{field}.pointers"));
        (format!("{field}.col"), pointers)
    }

    /// Creates empty backing files.
    pub fn create_files(&self) -> Result<(), DatabaseError> {
        File::create(&self.data_path)?;
        if let Some(pointers) = &self.pointers_path {
            File::create(pointers)?;
        }
        Ok(())
    }

    /// Opens the column for a forward scan from the first record.
    pub fn open_reader(&self) -> Result<ColumnReader, DatabaseError> {
        let data = BufReader::new(File::open(&self.data_path)?);
        let pointers = match &self.pointers_path {
            Some(path) => Some(BufReader::new(File::open(path)?)),
            None => None,
        };
        Ok(ColumnReader {
            column: self.clone(),
            data,
            pointers,
            previous_end: 0,
        })
    }

    /// Opens the column for appending records at the end of its files.
    pub fn open_writer(&self) -> Result<ColumnWriter, DatabaseError> {
        let data = OpenOptions::new().append(true).open(&self.data_path)?;
        let data_start = data.metadata()?.len();
        let (pointers, pointers_start) = match &self.pointers_path {
            Some(path) => {
                let file = OpenOptions::new().append(true).open(path)?;
                let len = file.metadata()?.len();
                (Some(BufWriter::new(file)), len)
            }
            None => (None, 0),
        };
        Ok(ColumnWriter {
            column: self.clone(),
            data: BufWriter::new(data),
            pointers,
            data_start,
            pointers_start,
            end_offset: data_start,
            records: 0,
        })
    }

    fn corrupt(&self, path: &Path, reason: impl Into<String>) -> DatabaseError {
        DatabaseError::CorruptColumn {
            path: path.to_path_buf(),
            reason: format!("{}.{}: {}", self.table, self.field, reason.into()),
        }
    }
}

/// Streams decoded values of one column, translating sentinels to NULL.
///
/// File handles are released when the reader is dropped.
pub struct ColumnReader {
    column: Column,
    data: BufReader<File>,
    pointers: Option<BufReader<File>>,
    previous_end: u64,
}

impl ColumnReader {
    #[must_use]
    pub const fn column(&self) -> &Column {
        &self.column
    }

    fn read_scalar(&mut self) -> Result<Option<Value>, DatabaseError> {
        let word = read_word(&mut self.data).map_err(|reason| {
            self.column.corrupt(&self.column.data_path, reason)
        })?;
        word.map(|word| codec::decode_scalar(word, self.column.scalar_type))
            .transpose()
    }

    fn read_varchar(&mut self) -> Result<Option<Value>, DatabaseError> {
        let Some(pointers) = self.pointers.as_mut() else {
            return Err(self.column.corrupt(&self.column.data_path, "missing offset index"));
        };
        let pointers_path = self.column.pointers_path.clone().unwrap_or_default();
        let Some(word) = read_word(pointers).map_err(|reason| self.column.corrupt(&pointers_path, reason))?
        else {
            return Ok(None);
        };

        let end = u64::from_le_bytes(word);
        let len = end.checked_sub(self.previous_end).ok_or_else(|| {
            self.column.corrupt(
                &pointers_path,
                format!("offset {end} precedes previous offset {}", self.previous_end),
            )
        })?;
        let mut bytes = Vec::new();
        (&mut self.data).take(len).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < len {
            return Err(self.column.corrupt(
                &self.column.data_path,
                format!("record ends at {end}, past end of file"),
            ));
        }
        self.previous_end = end;

        let text = String::from_utf8(bytes)
            .map_err(|err| self.column.corrupt(&self.column.data_path, err.to_string()))?;
        Ok(Some(Value::Varchar(text)))
    }
}

impl Iterator for ColumnReader {
    type Item = Result<Value, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = if self.column.scalar_type == ScalarType::Varchar {
            self.read_varchar()
        } else {
            self.read_scalar()
        };
        record.transpose()
    }
}

/// Reads one 8-byte word. `Ok(None)` at a clean end of file; a partial word
/// is an error.
fn read_word(reader: &mut impl Read) -> Result<Option<[u8; WORD_SIZE]>, String> {
    let mut word = [0u8; WORD_SIZE];
    let mut filled = 0;
    while filled < WORD_SIZE {
        match reader.read(&mut word[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err.to_string()),
        }
    }
    match filled {
        0 => Ok(None),
        WORD_SIZE => Ok(Some(word)),
        n => Err(format!("truncated record ({n} of {WORD_SIZE} bytes)")),
    }
}

/// Appends encoded records to one column.
///
/// Writes are buffered; `finish` flushes them and `rollback` discards them
/// and truncates the files back to their length at open time.
pub struct ColumnWriter {
    column: Column,
    data: BufWriter<File>,
    pointers: Option<BufWriter<File>>,
    data_start: u64,
    pointers_start: u64,
    end_offset: u64,
    records: u64,
}

impl ColumnWriter {
    #[must_use]
    pub const fn records(&self) -> u64 {
        self.records
    }

    /// Parses a delimited-text field and appends it.
    pub fn append_text(&mut self, text: &str) -> Result<(), DatabaseError> {
        let value = codec::parse_field(&self.column.field, self.column.scalar_type, text)?;
        self.append_value(&value)
    }

    pub fn append_value(&mut self, value: &Value) -> Result<(), DatabaseError> {
        match (&mut self.pointers, value) {
            (Some(pointers), Value::Varchar(text)) => {
                self.data.write_all(text.as_bytes())?;
                self.end_offset += text.len() as u64;
                pointers.write_all(&self.end_offset.to_le_bytes())?;
            }
            (Some(pointers), Value::Null) => {
                pointers.write_all(&self.end_offset.to_le_bytes())?;
            }
            (Some(_), other) => {
                return Err(DatabaseError::TypeMismatch(format!(
                    "cannot store {other:?} in varchar field '{}'",
                    self.column.field
                )));
            }
            (None, value) => {
                let word = codec::encode_scalar(value, self.column.scalar_type)?;
                self.data.write_all(&word)?;
            }
        }
        self.records += 1;
        Ok(())
    }

    /// Writes buffered records through to the files.
    pub fn flush(&mut self) -> Result<(), DatabaseError> {
        self.data.flush()?;
        if let Some(pointers) = self.pointers.as_mut() {
            pointers.flush()?;
        }
        Ok(())
    }

    /// Flushes and closes the column, returning the number of records appended.
    pub fn finish(mut self) -> Result<u64, DatabaseError> {
        self.flush()?;
        Ok(self.records)
    }

    /// Drops buffered records and restores the files' original length.
    pub fn rollback(self) -> Result<(), DatabaseError> {
        let (data, _) = self.data.into_parts();
        data.set_len(self.data_start)?;
        if let Some(pointers) = self.pointers {
            let (pointers, _) = pointers.into_parts();
            pointers.set_len(self.pointers_start)?;
        }
        Ok(())
    }
}
