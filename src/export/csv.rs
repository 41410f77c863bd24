use super::ExportError;
use crate::gateway::ActivityRecord;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 8] = [
    "id",
    "created_at",
    "calories",
    "distance",
    "heartRate",
    "breathing",
    "duration",
    "userId",
];

fn write_records<W: Write>(records: &[ActivityRecord], writer: W) -> Result<(), ExportError> {
    let mut csv = ::csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for stored in records {
        let record = &stored.record;
        csv.write_record([
            stored.id.to_string(),
            record.created_at.to_rfc3339(),
            record.calories.clone(),
            record.distance.clone(),
            record.heart_rate.clone(),
            record.breathing.clone(),
            record.duration.clone(),
            record.user_id.clone(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Export activity records to CSV, one row per record
pub fn export_records<P: AsRef<Path>>(records: &[ActivityRecord], output_path: P) -> Result<(), ExportError> {
    let file = std::fs::File::create(output_path)?;
    write_records(records, file)
}

pub(crate) fn records_to_string(records: &[ActivityRecord]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_records(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExportError::SerializationError(e.to_string()))
}
