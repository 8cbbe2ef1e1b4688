//! Provisioning strategy selection

use crate::platform::{Os, Target};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How a runtime directory is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// `python -m venv --copies` from a host interpreter
    #[serde(rename = "venv")]
    VirtualEnvironment,
    /// Official Windows embeddable zip plus `pip --target`
    #[serde(rename = "embeddable")]
    EmbeddableDistribution,
    /// Tree built elsewhere and copied in
    #[serde(rename = "vendored")]
    PreVendoredTree,
}

impl Strategy {
    /// Pick a strategy for `target` when building on `host`.
    ///
    /// An explicit choice always wins. A foreign OS cannot be built locally,
    /// so it must come pre-vendored.
    pub fn select(target: Target, host: Target, explicit: Option<Strategy>) -> Self {
        if let Some(strategy) = explicit {
            return strategy;
        }
        if target.os != host.os {
            Strategy::PreVendoredTree
        } else if target.os == Os::Windows {
            Strategy::EmbeddableDistribution
        } else {
            Strategy::VirtualEnvironment
        }
    }

    /// Identifier used in config and cache records
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::VirtualEnvironment => "venv",
            Strategy::EmbeddableDistribution => "embeddable",
            Strategy::PreVendoredTree => "vendored",
        }
    }

    /// Interpreter location inside the runtime directory
    pub fn interpreter_path(&self, os: Os) -> PathBuf {
        match (self, os) {
            (Strategy::EmbeddableDistribution, _) | (Strategy::PreVendoredTree, Os::Windows) => {
                PathBuf::from("python.exe")
            }
            (Strategy::VirtualEnvironment, Os::Windows) => PathBuf::from("Scripts/python.exe"),
            _ => PathBuf::from("bin/python3"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venv" => Ok(Strategy::VirtualEnvironment),
            "embeddable" => Ok(Strategy::EmbeddableDistribution),
            "vendored" => Ok(Strategy::PreVendoredTree),
            other => Err(format!(
                "unknown strategy '{other}' (expected venv, embeddable or vendored)"
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
