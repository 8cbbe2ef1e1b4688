//! Interpreter version families
//!
//! A requirement like `3.11` names a major.minor family: any `3.11.x`
//! satisfies it, `3.1.2` and `3.12.0` do not.

use crate::error::{ShipwrightError, ShipwrightResult};
use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;

/// A required `major.minor` interpreter family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFamily {
    raw: String,
    req: VersionReq,
}

impl VersionFamily {
    /// Whether `actual` (e.g. `3.11.9`, `Python 3.11.9`, `3.11`) belongs to this family
    pub fn matches(&self, actual: &str) -> bool {
        parse_loose(actual).is_some_and(|v| self.req.matches(&v))
    }

    /// `major.minor` as written, e.g. `3.11`
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `311` for `3.11`, as used in `python311.zip` / `python311._pth`
    pub fn compact(&self) -> String {
        self.raw.replace('.', "")
    }
}

impl FromStr for VersionFamily {
    type Err = ShipwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split('.');
        let (major, minor) = match (parts.next(), parts.next()) {
            (Some(major), Some(minor)) => (major, minor),
            _ => {
                return Err(ShipwrightError::User(format!(
                    "Invalid Python version '{s}': expected <major>.<minor>"
                )))
            }
        };
        let (major, minor): (u64, u64) = match (major.parse(), minor.parse()) {
            (Ok(major), Ok(minor)) => (major, minor),
            _ => {
                return Err(ShipwrightError::User(format!(
                    "Invalid Python version '{s}': expected <major>.<minor>"
                )))
            }
        };
        let req = VersionReq::parse(&format!("~{major}.{minor}"))
            .map_err(|e| ShipwrightError::Internal(format!("version requirement: {e}")))?;
        Ok(Self {
            raw: format!("{major}.{minor}"),
            req,
        })
    }
}

impl fmt::Display for VersionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse interpreter version output leniently.
///
/// Accepts a leading `Python ` and pads missing components; pre-release
/// suffixes such as `3.13.0rc1` keep only their numeric prefix.
pub fn parse_loose(text: &str) -> Option<Version> {
    let text = text.trim();
    let text = text.strip_prefix("Python").map(str::trim).unwrap_or(text);
    let token = text.split_whitespace().next()?;

    let mut numbers = token.split('.').map(|part| {
        let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
        digits.parse::<u64>().ok()
    });
    let major = numbers.next()??;
    let minor = numbers.next().flatten().unwrap_or(0);
    let patch = numbers.next().flatten().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}
