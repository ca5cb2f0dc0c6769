use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum OptionError {
    #[error("Option '{0}' is already registered")]
    Duplicate(String),
    #[error("Unknown option '{0}'")]
    Unknown(String),
    #[error("Option '{name}' expects a {expected} value")]
    KindMismatch { name: String, expected: &'static str },
    #[error("Invalid value '{value}' for option '{name}' (expected one of: {choices})")]
    InvalidChoice {
        name: String,
        value: String,
        choices: String,
    },
    #[error("Invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

/// The value type an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Real,
    Path,
    Text,
    /// A text value restricted to the listed names.
    Choice(&'static [&'static str]),
}

impl OptionKind {
    fn describe(self) -> &'static str {
        match self {
            OptionKind::Bool => "boolean",
            OptionKind::Real => "real",
            OptionKind::Path => "file path",
            OptionKind::Text => "text",
            OptionKind::Choice(_) => "choice",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Real(f64),
    Path(PathBuf),
    Text(String),
}

/// Declaration of one named option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    pub name: &'static str,
    pub short: Option<char>,
    pub description: &'static str,
    pub kind: OptionKind,
    pub default: Option<OptionValue>,
}

impl OptionDef {
    pub fn boolean(name: &'static str, description: &'static str, default: bool) -> Self {
        Self::new(name, description, OptionKind::Bool, Some(OptionValue::Bool(default)))
    }

    pub fn real(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Real, None)
    }

    pub fn path(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Path, None)
    }

    pub fn text(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, OptionKind::Text, None)
    }

    pub fn choice(
        name: &'static str,
        description: &'static str,
        choices: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self::new(
            name,
            description,
            OptionKind::Choice(choices),
            Some(OptionValue::Text(default.to_string())),
        )
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    fn new(
        name: &'static str,
        description: &'static str,
        kind: OptionKind,
        default: Option<OptionValue>,
    ) -> Self {
        Self {
            name,
            short: None,
            description,
            kind,
            default,
        }
    }
}

/// Anything that accepts option declarations.
pub trait OptionsContainer {
    fn add_option(&mut self, definition: OptionDef) -> Result<(), OptionError>;
}

/// Option declarations plus the values the user supplied for them.
///
/// Typed getters return the explicit value, falling back to the declared default;
/// [`is_set`](Self::is_set) tells the two apart.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    definitions: Vec<OptionDef>,
    values: HashMap<&'static str, OptionValue>,
}

impl OptionsContainer for OptionRegistry {
    fn add_option(&mut self, definition: OptionDef) -> Result<(), OptionError> {
        if self.definition(definition.name).is_some() {
            return Err(OptionError::Duplicate(definition.name.to_string()));
        }
        self.definitions.push(definition);
        Ok(())
    }
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn definitions(&self) -> &[OptionDef] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&OptionDef> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definition(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        let definition = self
            .definition(name)
            .ok_or_else(|| OptionError::Unknown(name.to_string()))?;
        let accepted = match (definition.kind, &value) {
            (OptionKind::Bool, OptionValue::Bool(_))
            | (OptionKind::Real, OptionValue::Real(_))
            | (OptionKind::Path, OptionValue::Path(_))
            | (OptionKind::Text, OptionValue::Text(_)) => true,
            (OptionKind::Choice(choices), OptionValue::Text(text)) => {
                if !choices.contains(&text.as_str()) {
                    return Err(OptionError::InvalidChoice {
                        name: name.to_string(),
                        value: text.clone(),
                        choices: choices.join(", "),
                    });
                }
                true
            }
            _ => false,
        };
        if !accepted {
            return Err(OptionError::KindMismatch {
                name: name.to_string(),
                expected: definition.kind.describe(),
            });
        }
        let key = definition.name;
        self.values.insert(key, value);
        Ok(())
    }

    /// Parses `raw` according to the option's kind and stores it.
    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<(), OptionError> {
        let definition = self
            .definition(name)
            .ok_or_else(|| OptionError::Unknown(name.to_string()))?;
        let invalid = || OptionError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        };
        let value = match definition.kind {
            OptionKind::Bool => match raw.trim().to_lowercase().as_str() {
                "yes" | "true" | "on" | "1" => OptionValue::Bool(true),
                "no" | "false" | "off" | "0" => OptionValue::Bool(false),
                _ => return Err(invalid()),
            },
            OptionKind::Real => OptionValue::Real(raw.trim().parse().map_err(|_| invalid())?),
            OptionKind::Path => OptionValue::Path(PathBuf::from(raw)),
            OptionKind::Text | OptionKind::Choice(_) => OptionValue::Text(raw.to_string()),
        };
        self.set(name, value)
    }

    /// Whether the user supplied a value for `name`.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<&OptionValue> {
        self.values
            .get(name)
            .or_else(|| self.definition(name).and_then(|d| d.default.as_ref()))
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.value(name)? {
            OptionValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            OptionValue::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        match self.value(name)? {
            OptionValue::Path(value) => Some(value.as_path()),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.value(name)? {
            OptionValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}
