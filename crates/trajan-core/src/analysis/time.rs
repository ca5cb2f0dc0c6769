use super::options::{OptionDef, OptionError, OptionRegistry, OptionsContainer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unit used for user-facing times. Times are stored internally in ps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Fs,
    #[default]
    Ps,
    Ns,
    Us,
    Ms,
    S,
}

pub const TIME_UNIT_NAMES: &[&str] = &["fs", "ps", "ns", "us", "ms", "s"];

#[derive(Debug, Error)]
#[error("Invalid time unit string")]
pub struct ParseTimeUnitError;

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }

    /// How many ps one unit is.
    pub fn ps_per_unit(self) -> f64 {
        match self {
            TimeUnit::Fs => 1e-3,
            TimeUnit::Ps => 1.0,
            TimeUnit::Ns => 1e3,
            TimeUnit::Us => 1e6,
            TimeUnit::Ms => 1e9,
            TimeUnit::S => 1e12,
        }
    }

    pub fn to_ps(self, value: f64) -> f64 {
        value * self.ps_per_unit()
    }

    pub fn from_ps(self, value: f64) -> f64 {
        value / self.ps_per_unit()
    }
}

impl FromStr for TimeUnit {
    type Err = ParseTimeUnitError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fs" => Ok(TimeUnit::Fs),
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "s" => Ok(TimeUnit::S),
            _ => Err(ParseTimeUnitError),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registers a time unit option and reads the choice back after parsing.
#[derive(Debug, Clone, Default)]
pub struct TimeUnitBehavior {
    time_unit: TimeUnit,
    option_name: Option<&'static str>,
}

impl TimeUnitBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn set_time_unit(&mut self, time_unit: TimeUnit) {
        self.time_unit = time_unit;
    }

    pub fn add_time_unit_option(
        &mut self,
        options: &mut dyn OptionsContainer,
        name: &'static str,
    ) -> Result<(), OptionError> {
        options.add_option(OptionDef::choice(
            name,
            "Unit for time values",
            TIME_UNIT_NAMES,
            self.time_unit.as_str(),
        ))?;
        self.option_name = Some(name);
        Ok(())
    }

    pub fn options_finished(&mut self, values: &OptionRegistry) -> Result<(), OptionError> {
        let Some(name) = self.option_name else {
            return Ok(());
        };
        if let Some(text) = values.text(name) {
            self.time_unit = text.parse().map_err(|_| OptionError::InvalidChoice {
                name: name.to_string(),
                value: text.to_string(),
                choices: TIME_UNIT_NAMES.join(", "),
            })?;
        }
        Ok(())
    }
}
