//! Email design source kinds.
//!
//! Email designs are mirrored from a third-party marketing-send service and
//! keyed by `(source_info_type, source_info_id)`. Fetching them is not part of
//! this crate; only the key vocabulary lives here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const SOURCE_SINGLESEND: &str = "singlesend";
pub const SOURCE_AUTOMATION: &str = "automation";

/// All valid `source_info_type` values.
pub const VALID_SOURCE_TYPES: &[&str] = &[SOURCE_SINGLESEND, SOURCE_AUTOMATION];

/// Where an email design came from on the send service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailDesignSource {
    SingleSend,
    Automation,
}

impl EmailDesignSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleSend => SOURCE_SINGLESEND,
            Self::Automation => SOURCE_AUTOMATION,
        }
    }
}

impl fmt::Display for EmailDesignSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailDesignSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SOURCE_SINGLESEND => Ok(Self::SingleSend),
            SOURCE_AUTOMATION => Ok(Self::Automation),
            other => Err(CoreError::InvalidEmailSource(format!(
                "unknown type '{other}', must be one of: {}",
                VALID_SOURCE_TYPES.join(", ")
            ))),
        }
    }
}

/// Validate a source id: non-empty and free of surrounding whitespace.
pub fn validate_source_id(source_id: &str) -> Result<(), CoreError> {
    if source_id.is_empty() {
        return Err(CoreError::InvalidEmailSource(
            "source id cannot be empty".to_string(),
        ));
    }
    if source_id.trim() != source_id {
        return Err(CoreError::InvalidEmailSource(format!(
            "source id '{source_id}' has leading or trailing whitespace"
        )));
    }
    Ok(())
}
