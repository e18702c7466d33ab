/// INTO OUTFILE: writes a row sequence as comma-separated text.
use super::rows::RowStream;
use crate::types::{DatabaseError, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Writes the header, then every row with NULL as an empty field.
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(stream: RowStream, out: W) -> Result<u64, DatabaseError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(stream.header())?;
    let mut rows = 0;
    for row in stream {
        let row = row?;
        writer.write_record(row.iter().map(Value::to_field))?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

pub fn export_csv(stream: RowStream, path: &Path) -> Result<u64, DatabaseError> {
    let rows = write_csv(stream, File::create(path)?)?;
    debug!(rows, path = %path.display(), "exported rows");
    Ok(rows)
}
