// CSV export of selections

use std::io::Write;

use super::types::{Selection, TIMESTAMP_FORMAT};

const HEADER: [&str; 4] = ["Register No", "NME", "Activity", "Submitted At"];

/// Write one row per selection, in store order, after a header row
pub fn write_selections_csv<W: Write>(out: W, selections: &[Selection]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);

    writer.write_record(HEADER)?;
    for s in selections {
        let submitted_at = s
            .timestamp
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();
        writer.write_record([
            s.reg.as_str(),
            s.nme.as_str(),
            s.activity.as_str(),
            submitted_at.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
