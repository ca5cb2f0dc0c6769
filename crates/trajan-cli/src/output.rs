use crate::error::{CliError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use trajan::analysis::data::DataSeries;
use trajan::analysis::plot::PlotSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xvg,
    Csv,
}

impl OutputFormat {
    pub fn for_path(path: Option<&Path>) -> Self {
        match path
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("csv") => OutputFormat::Csv,
            _ => OutputFormat::Xvg,
        }
    }
}

/// Writes the series to `output`, or to stdout when no path is given.
pub fn write_series(series: &DataSeries, plot: &PlotSettings, output: Option<&Path>) -> Result<()> {
    let format = OutputFormat::for_path(output);
    match output {
        Some(path) => {
            let output_error = |source: anyhow::Error| CliError::Output {
                path: path.to_path_buf(),
                source,
            };
            let file = File::create(path).map_err(|e| output_error(e.into()))?;
            let mut writer = BufWriter::new(file);
            write_to(series, plot, format, &mut writer).map_err(output_error)?;
            writer.flush().map_err(|e| output_error(e.into()))
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_to(series, plot, format, &mut handle).map_err(CliError::Other)
        }
    }
}

fn write_to<W: Write>(
    series: &DataSeries,
    plot: &PlotSettings,
    format: OutputFormat,
    writer: &mut W,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Xvg => write_xvg(series, plot, writer)?,
        OutputFormat::Csv => write_csv(series, plot, writer)?,
    }
    Ok(())
}

pub fn write_xvg<W: Write>(series: &DataSeries, plot: &PlotSettings, writer: &mut W) -> io::Result<()> {
    let headers = plot.header_lines(
        series.title(),
        &plot.time_label(),
        series.y_label(),
        series.columns(),
    );
    for line in headers {
        writeln!(writer, "{}", line)?;
    }
    for row in series.rows() {
        write!(writer, "{:>12.4}", plot.time_unit().from_ps(row.time))?;
        for value in &row.values {
            write!(writer, " {:>12.6}", value)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn write_csv<W: Write>(
    series: &DataSeries,
    plot: &PlotSettings,
    writer: &mut W,
) -> std::result::Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![plot.time_label()];
    header.extend(series.columns().iter().cloned());
    csv_writer.write_record(&header)?;
    for row in series.rows() {
        let mut record = vec![plot.time_unit().from_ps(row.time).to_string()];
        record.extend(row.values.iter().map(|value| value.to_string()));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
