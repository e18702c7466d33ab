use crate::executor::RowStream;
use crate::types::DatabaseError;
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};

/// Renders a row sequence as a console table followed by a row count.
///
/// Consumes the whole stream; NULL is shown as `NULL`.
pub fn render_rows(stream: RowStream) -> Result<String, DatabaseError> {
    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_header(stream.header().into_iter().map(Cell::new));

    let mut count = 0usize;
    for row in stream {
        let row = row?;
        table.add_row(row.iter().map(|value| Cell::new(value.to_string())));
        count += 1;
    }

    let noun = if count == 1 { "row" } else { "rows" };
    Ok(format!("{table}\n({count} {noun})\n"))
}
