//! Include/exclude rules for selecting which streams are routed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::NodeInfo;

/// Whether a rule selects or rejects nodes carrying the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Route only nodes where `key == value`
    Include,
    /// Route every node except those where `key == value`
    Exclude,
}

impl FromStr for TargetMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            other => Err(Error::InvalidRule(format!(
                "mode must be either \"include\" or \"exclude\", got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        })
    }
}

/// A property match deciding which nodes are routing candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterRule {
    /// Property key to inspect
    pub key: String,
    /// Value compared for exact, case-sensitive equality
    pub value: String,
    pub mode: TargetMode,
}

impl FilterRule {
    /// Create a rule from already typed parts.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, mode: TargetMode) -> Self {
        Self { key: key.into(), value: value.into(), mode }
    }

    /// Create a rule from untyped input, rejecting unknown modes.
    pub fn parse(key: &str, value: &str, mode: &str) -> Result<Self> {
        let rule = Self::new(key, value, mode.parse()?);
        rule.validate()?;
        Ok(rule)
    }

    /// Check the rule can be applied.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidRule("key must not be empty".to_string()));
        }
        Ok(())
    }

    /// Check if a node is a candidate under this rule.
    ///
    /// A node lacking the key never satisfies an include rule and never
    /// hits an exclude rule.
    #[must_use]
    pub fn matches(&self, node: &NodeInfo) -> bool {
        let hit = node.property(&self.key).is_some_and(|v| v == self.value);

        match self.mode {
            TargetMode::Include => hit,
            TargetMode::Exclude => !hit,
        }
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={:?}", self.mode, self.key, self.value)
    }
}
