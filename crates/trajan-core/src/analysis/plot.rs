use super::time::TimeUnit;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Header dialect for plain-text data output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotFormat {
    None,
    #[default]
    Xmgrace,
    Xmgr,
}

pub const PLOT_FORMAT_NAMES: &[&str] = &["xmgrace", "xmgr", "none"];

#[derive(Debug, Error)]
#[error("Invalid plot format string")]
pub struct ParsePlotFormatError;

impl FromStr for PlotFormat {
    type Err = ParsePlotFormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(PlotFormat::None),
            "xmgrace" => Ok(PlotFormat::Xmgrace),
            "xmgr" => Ok(PlotFormat::Xmgr),
            _ => Err(ParsePlotFormatError),
        }
    }
}

impl PlotFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            PlotFormat::None => "none",
            PlotFormat::Xmgrace => "xmgrace",
            PlotFormat::Xmgr => "xmgr",
        }
    }
}

impl fmt::Display for PlotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output settings shared with every data writer of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlotSettings {
    time_unit: TimeUnit,
    plot_format: PlotFormat,
}

impl PlotSettings {
    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn plot_format(&self) -> PlotFormat {
        self.plot_format
    }

    pub fn set_time_unit(&mut self, time_unit: TimeUnit) {
        self.time_unit = time_unit;
    }

    pub fn set_plot_format(&mut self, plot_format: PlotFormat) {
        self.plot_format = plot_format;
    }

    pub fn time_label(&self) -> String {
        format!("Time ({})", self.time_unit)
    }

    /// Header lines for a plot with the given title and axis labels, followed by one
    /// legend line per data column. Empty for [`PlotFormat::None`].
    pub fn header_lines(
        &self,
        title: &str,
        x_label: &str,
        y_label: &str,
        legends: &[String],
    ) -> Vec<String> {
        if self.plot_format == PlotFormat::None {
            return Vec::new();
        }
        let mut lines = vec![
            format!("@    title \"{}\"", title),
            format!("@    xaxis  label \"{}\"", x_label),
            format!("@    yaxis  label \"{}\"", y_label),
            "@TYPE xy".to_string(),
        ];
        if self.plot_format == PlotFormat::Xmgrace && !legends.is_empty() {
            lines.push("@ legend on".to_string());
            for (i, legend) in legends.iter().enumerate() {
                lines.push(format!("@ s{} legend \"{}\"", i, legend));
            }
        }
        lines
    }
}
