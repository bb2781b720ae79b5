//! Typed option values and the closed converter set.
//!
//! Each option parameter carries a [`ParamType`] tag selecting one of a small
//! closed set of converters. Unknown target types cannot be expressed, so bad
//! declarations are impossible; bad values surface as conversion errors at
//! apply time.

use super::OptionsError;

/// Target type of one option parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `true`/`false`, case-insensitive
    Bool,
    /// Signed integer
    Int,
    /// Floating point number
    Float,
    /// Arbitrary string
    Str,
    /// Enumeration-like symbolic value; the receiving step validates the
    /// symbol against its domain
    Symbol,
}

impl ParamType {
    /// Human-readable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "string",
            ParamType::Symbol => "symbol",
        }
    }

    /// Convert a raw string to a typed value.
    pub fn convert(&self, param: &str, raw: &str) -> Result<OptionValue, OptionsError> {
        let fail = || OptionsError::Conversion {
            param: param.to_string(),
            expected: self.name(),
            value: raw.to_string(),
        };

        match self {
            ParamType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(OptionValue::Bool(true)),
                "false" => Ok(OptionValue::Bool(false)),
                _ => Err(fail()),
            },
            ParamType::Int => raw.parse().map(OptionValue::Int).map_err(|_| fail()),
            ParamType::Float => raw.parse().map(OptionValue::Float).map_err(|_| fail()),
            ParamType::Str => Ok(OptionValue::Str(raw.to_string())),
            ParamType::Symbol => {
                if raw.is_empty() {
                    Err(fail())
                } else {
                    Ok(OptionValue::Symbol(raw.to_string()))
                }
            }
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A converted option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String content of `Str` and `Symbol` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(v) | OptionValue::Symbol(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{}", v),
            OptionValue::Int(v) => write!(f, "{}", v),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Str(v) | OptionValue::Symbol(v) => f.write_str(v),
        }
    }
}

/// Positional accessor over the converted values handed to a setter.
///
/// The registry converts values according to the declaring spec, so a type
/// mismatch here means the spec and the setter disagree about a parameter.
pub struct Args<'a>(pub &'a [OptionValue]);

impl Args<'_> {
    pub fn bool(&self, index: usize) -> Result<bool, OptionsError> {
        self.get(index, "bool", OptionValue::as_bool)
    }

    pub fn int(&self, index: usize) -> Result<i64, OptionsError> {
        self.get(index, "int", OptionValue::as_int)
    }

    pub fn float(&self, index: usize) -> Result<f64, OptionsError> {
        self.get(index, "float", OptionValue::as_float)
    }

    pub fn str(&self, index: usize) -> Result<&str, OptionsError> {
        self.get(index, "string", OptionValue::as_str)
    }

    fn get<'a, T>(
        &'a self,
        index: usize,
        expected: &'static str,
        pick: impl Fn(&'a OptionValue) -> Option<T>,
    ) -> Result<T, OptionsError> {
        self.0
            .get(index)
            .and_then(pick)
            .ok_or(OptionsError::ArgMismatch { index, expected })
    }
}
