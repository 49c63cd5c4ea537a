//! Mapping from security posture to IAM capability profile.
//!
//! The mapping is total and deterministic: relaxed development postures get
//! broad grants for convenience, while production is held to least privilege.
//! The profile is always recomputed from the posture and never persisted, so
//! the two cannot drift apart.

use std::fmt;

use crate::config::SecurityProfile;

/// IAM permission profile, ordered from the narrowest to the broadest grant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IamProfile {
    /// Least-privilege grant used for production workloads.
    Minimal,
    /// Intermediate grant used for staging workloads.
    Standard,
    /// Broad grant used for development workloads.
    Extended,
}

impl IamProfile {
    /// Maps a security posture to its capability grant.
    ///
    /// Stricter postures always receive narrower-or-equal grants:
    /// DEV → EXTENDED, STAGING → STANDARD, PRODUCTION → MINIMAL.
    #[must_use]
    pub const fn for_security(profile: SecurityProfile) -> Self {
        match profile {
            SecurityProfile::Dev => Self::Extended,
            SecurityProfile::Staging => Self::Standard,
            SecurityProfile::Production => Self::Minimal,
        }
    }

    /// Canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "MINIMAL",
            Self::Standard => "STANDARD",
            Self::Extended => "EXTENDED",
        }
    }

    /// Ordinal breadth of the grant, higher means a broader permission set.
    #[must_use]
    pub const fn scope(self) -> u8 {
        match self {
            Self::Minimal => 0,
            Self::Standard => 1,
            Self::Extended => 2,
        }
    }
}

impl fmt::Display for IamProfile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
