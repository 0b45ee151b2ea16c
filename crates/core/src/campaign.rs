//! Campaign constants and the access (visibility) mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a campaign name in characters.
pub const MAX_NAME_LENGTH: usize = 64;

/// Access values as stored in the `campaigns.access` column.
pub const ACCESS_PUBLIC: &str = "Public";
pub const ACCESS_PRIVATE: &str = "Private";
pub const ACCESS_SHARED: &str = "Shared";

/// All valid access values.
pub const VALID_ACCESS_VALUES: &[&str] = &[ACCESS_PUBLIC, ACCESS_PRIVATE, ACCESS_SHARED];

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Who may see a campaign.
///
/// `Shared` campaigns are visible to an explicit set of permitted users and
/// must always have at least one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignAccess {
    #[default]
    Public,
    Private,
    Shared,
}

impl CampaignAccess {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => ACCESS_PUBLIC,
            Self::Private => ACCESS_PRIVATE,
            Self::Shared => ACCESS_SHARED,
        }
    }

    /// Whether this mode keeps a permitted-user set.
    pub fn uses_permissions(self) -> bool {
        self == Self::Shared
    }
}

impl fmt::Display for CampaignAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignAccess {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ACCESS_PUBLIC => Ok(Self::Public),
            ACCESS_PRIVATE => Ok(Self::Private),
            ACCESS_SHARED => Ok(Self::Shared),
            other => Err(CoreError::InvalidAccess {
                value: other.to_string(),
                allowed: VALID_ACCESS_VALUES.join(", "),
            }),
        }
    }
}

/// A string field counts as blank when it is empty after trimming.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
