//! Allow/deny filtering of tool names.

use platform_config::ToolsConfig;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("enabled and disabled tool lists are mutually exclusive (enabled: {enabled:?}, disabled: {disabled:?})")]
    Conflict {
        enabled: Vec<String>,
        disabled: Vec<String>,
    },
}

/// Decides which tools get registered.
///
/// A tool is enabled when it is not disabled and the enabled list is either
/// empty or names it. Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    enabled: HashSet<String>,
    disabled: HashSet<String>,
}

impl ToolFilter {
    /// Build a filter, rejecting configurations that set both lists.
    pub fn new<I, J, S>(enabled: I, disabled: J) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let enabled = normalize(enabled);
        let disabled = normalize(disabled);
        if !enabled.is_empty() && !disabled.is_empty() {
            let mut enabled: Vec<_> = enabled.into_iter().collect();
            let mut disabled: Vec<_> = disabled.into_iter().collect();
            enabled.sort();
            disabled.sort();
            return Err(FilterError::Conflict { enabled, disabled });
        }
        Ok(Self { enabled, disabled })
    }

    /// A filter that enables every tool.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ToolsConfig) -> Result<Self, FilterError> {
        Self::new(&cfg.enabled, &cfg.disabled)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        !self.disabled.contains(&name) && (self.enabled.is_empty() || self.enabled.contains(&name))
    }

    /// Names in the enabled list that `known` does not contain.
    pub fn unknown_enabled<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        let known: HashSet<String> = known.iter().map(|n| n.to_lowercase()).collect();
        let mut unknown: Vec<&str> = self
            .enabled
            .iter()
            .filter(|n| !known.contains(n.as_str()))
            .map(String::as_str)
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

/// Lowercase, trim, drop empty names.
fn normalize<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}
