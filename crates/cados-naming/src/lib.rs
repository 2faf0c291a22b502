pub mod format;
pub mod identity;
pub mod legacy;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use format::{ModelFormat, base_filename, with_extension};
pub use identity::{POSITION_PREFIX, SHORT_HASH_LEN, canonical_param_string, compute_identifier};
pub use legacy::{
    decode_param_value, encode_param_value, extract_model_type, legacy_model_filename,
    parse_params_from_filename,
};

/// Scalar model parameter as it appears in request bodies and filenames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Parameter name to value mapping. Key order is lexicographic by
/// construction, which is the canonical ordering the encoder requires.
pub type ParamSet = BTreeMap<String, ParamValue>;
