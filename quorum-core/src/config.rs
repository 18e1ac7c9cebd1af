//! Audit configuration and the narrow admin field-override surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Tunable parameters of an audit, validated when the audit opens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AuditConfig {
    /// How many independent inspections each item receives. Should be odd
    /// so the majority vote cannot tie; this is recommended, not enforced.
    pub audits_per_item: u32,
    /// Multiplier applied to an auditor's misaligned-finding count when
    /// computing compensation deductions. Values above 1 are a deliberate
    /// economic lever, not an error.
    pub slashing_ratio: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { audits_per_item: 3, slashing_ratio: 0.5 }
    }
}

impl AuditConfig {
    /// Checks the configuration is usable.
    ///
    /// # Errors
    /// Returns [`AuditError::Configuration`] if `audits_per_item` is zero
    /// or `slashing_ratio` is negative or not finite.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.audits_per_item == 0 {
            return Err(AuditError::Configuration {
                reason: "audits_per_item must be at least 1".to_owned(),
            });
        }
        if !self.slashing_ratio.is_finite() || self.slashing_ratio < 0.0 {
            return Err(AuditError::Configuration {
                reason: format!("slashing_ratio {} must be finite and >= 0", self.slashing_ratio),
            });
        }
        Ok(())
    }
}

/// The enumerated set of fields the admin `set`/`get` verbs may touch.
///
/// Replaces the open reflection of the reference deployment: only
/// known-safe fields, only before the audit opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SettableField {
    /// `audits_per_item`
    AuditsPerItem,
    /// `slashing_ratio`
    SlashingRatio,
    /// `bond`
    Bond,
}

impl SettableField {
    /// Wire name used by the admin command surface.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AuditsPerItem => "audits_per_item",
            Self::SlashingRatio => "slashing_ratio",
            Self::Bond => "bond",
        }
    }
}

impl fmt::Display for SettableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettableField {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audits_per_item" => Ok(Self::AuditsPerItem),
            "slashing_ratio" => Ok(Self::SlashingRatio),
            "bond" => Ok(Self::Bond),
            other => Err(AuditError::Configuration {
                reason: format!("'{other}' is not a settable field"),
            }),
        }
    }
}
