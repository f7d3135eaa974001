// src/meta/platform.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host platform filter attached to task and parameter definitions.
///
/// A definition whose platform does not match the current host is excluded
/// from the registry snapshot entirely: it is invisible to resolution,
/// execution and enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Any,
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// Platform of the running host.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Any
        }
    }

    /// Whether a definition carrying this filter is visible on `host`.
    pub fn matches(self, host: Platform) -> bool {
        self == Platform::Any || self == host
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Any => "any",
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_every_host() {
        for host in [Platform::Linux, Platform::Macos, Platform::Windows] {
            assert!(Platform::Any.matches(host));
        }
    }

    #[test]
    fn concrete_platform_matches_only_itself() {
        assert!(Platform::Linux.matches(Platform::Linux));
        assert!(!Platform::Linux.matches(Platform::Windows));
    }
}
