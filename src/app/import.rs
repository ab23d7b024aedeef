use crate::adapters::reading_csv::{ReadingCsvError, ReadingRow};
use crate::app::ingestion::{IngestionError, UpsertOutcome, upsert_reading_by_serial};
use crate::app::services::{MeterQueryHandler, ReadingCommandHandler, ServiceError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
}

/// Upserts every parsed row. Rows that fail parsing or validation are logged
/// and counted as rejected; the first store failure aborts the import.
pub fn import_rows<S, I>(store: &S, rows: I) -> Result<ImportSummary, ServiceError>
where
    S: MeterQueryHandler + ReadingCommandHandler + ?Sized,
    I: IntoIterator<Item = Result<ReadingRow, ReadingCsvError>>,
{
    let mut summary = ImportSummary::default();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                summary.rejected += 1;
                tracing::warn!(error = %error, "skipping unreadable import line");
                continue;
            }
        };

        match upsert_reading_by_serial(
            store,
            &row.serial_number,
            &row.date,
            row.value,
            row.notes.as_deref(),
        ) {
            Ok((_, UpsertOutcome::Inserted { .. })) => summary.inserted += 1,
            Ok((_, UpsertOutcome::Updated { .. })) => summary.updated += 1,
            Err(IngestionError::Validation(error)) => {
                summary.rejected += 1;
                tracing::warn!(line = row.line, error = %error, "skipping invalid import line");
            }
            Err(IngestionError::Store(error)) => return Err(error),
        }
    }

    Ok(summary)
}
