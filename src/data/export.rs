use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::Spectrum;

/// Write the working table of `spectrum` as CSV, titles first.
pub fn write_csv(path: &Path, spectrum: &Spectrum) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv_to(file, spectrum)?;
    log::info!("Wrote fitted spectrum to {}", path.display());
    Ok(())
}

/// Write to any sink; headers fall back to `x,intensity_1,..` when the
/// spectrum has no titles.
pub fn write_csv_to<W: Write>(sink: W, spectrum: &Spectrum) -> Result<()> {
    let table = spectrum.current_table();
    let mut writer = csv::Writer::from_writer(sink);

    let header: Vec<String> = match spectrum.titles() {
        Some(titles) if titles.len() == table.column_count() => titles.to_vec(),
        _ => std::iter::once("x".to_string())
            .chain((1..table.column_count()).map(|i| format!("intensity_{i}")))
            .collect(),
    };
    writer.write_record(&header).context("writing CSV header")?;

    for row in table.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}
