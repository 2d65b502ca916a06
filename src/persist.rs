use std::{fs, io::{BufWriter, Write}, path::Path};
use serde::{Serialize, Deserialize};
use crate::error::{Result, SimError};
use crate::types::TrialRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordFormat {
    /// `equilibrium poincare h0 h1 .. hN`, one whitespace-separated row per trial.
    #[default]
    Text,
    /// One JSON object per line, with a `trial` index.
    JsonLines,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    trial: usize,
    #[serde(flatten)]
    record: &'a TrialRecord,
}

/// Writes `records` in trial order. Incomplete records are refused.
pub fn write_records<W: Write>(w: &mut W, records: &[TrialRecord], format: RecordFormat) -> Result<()> {
    for (trial, rec) in records.iter().enumerate() {
        if !rec.is_complete() { return Err(SimError::Incomplete { steps: rec.total_steps() }); }
        match format {
            RecordFormat::Text => {
                write!(w, "{} {}", rec.equilibrium_step, rec.poincare_step)?;
                for &h in &rec.histogram { write!(w, " {}", h)?; }
                writeln!(w)?;
            }
            RecordFormat::JsonLines => {
                serde_json::to_writer(&mut *w, &JsonRow { trial, record: rec })?;
                writeln!(w)?;
            }
        }
    }
    Ok(())
}

pub fn save_records(path: &Path, records: &[TrialRecord], format: RecordFormat) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(fs::File::create(path)?);
    write_records(&mut w, records, format)?;
    w.flush()?;
    Ok(())
}
