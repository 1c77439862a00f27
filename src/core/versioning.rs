// src/core/versioning.rs

use crate::constants::BUMPVERSION_FILENAME;
use crate::models::{BumpKind, ReleaseKind};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Version not found: '{file}' is missing or has no 'current_version = X.Y.Z' line.")]
    NotFound { file: String },
    #[error("Could not read '{file}': {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' is not a valid MAJOR.MINOR.PATCH[bN] version.")]
    Invalid(String),
    #[error("Version '{0}' cannot be bumped any further.")]
    Overflow(String),
}

/// A project version: `MAJOR.MINOR.PATCH` plus an optional `bN` pre-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub beta: Option<u64>,
}

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:b(\d+)|\.beta(\d*))?$").expect("valid version regex");
    static ref MARKER_RE: Regex =
        Regex::new(r"(?m)^\s*current_version\s*=\s*(\S+)\s*$").expect("valid marker regex");
}

impl ProjectVersion {
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError::Invalid(raw.to_string());
        let caps = VERSION_RE.captures(raw.trim()).ok_or_else(invalid)?;
        let number = |i: usize| -> Result<u64, VersionError> {
            caps.get(i)
                .ok_or_else(invalid)?
                .as_str()
                .parse()
                .map_err(|_| invalid())
        };

        // `1.0.0.beta` carries no number and counts as the first beta.
        let beta = match (caps.get(4), caps.get(5)) {
            (Some(n), _) => Some(n.as_str().parse().map_err(|_| invalid())?),
            (None, Some(n)) if n.as_str().is_empty() => Some(0),
            (None, Some(n)) => Some(n.as_str().parse().map_err(|_| invalid())?),
            (None, None) => None,
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            beta,
        })
    }

    pub fn is_beta(&self) -> bool {
        self.beta.is_some()
    }

    /// Computes the version a release of `release` kind should produce.
    ///
    /// Production releases always bump the numeric part and drop any beta suffix.
    /// Beta releases count up `bN`, starting at `b0` on top of the current version.
    pub fn next(&self, release: ReleaseKind, bump: BumpKind) -> Result<Self, VersionError> {
        let next = match release {
            ReleaseKind::Beta => Self {
                beta: Some(match self.beta {
                    Some(n) => increment(n, self)?,
                    None => 0,
                }),
                ..*self
            },
            ReleaseKind::Prod => match bump {
                BumpKind::Patch => Self {
                    patch: increment(self.patch, self)?,
                    beta: None,
                    ..*self
                },
                BumpKind::Minor => Self {
                    major: self.major,
                    minor: increment(self.minor, self)?,
                    patch: 0,
                    beta: None,
                },
                BumpKind::Major => Self {
                    major: increment(self.major, self)?,
                    minor: 0,
                    patch: 0,
                    beta: None,
                },
            },
        };
        Ok(next)
    }
}

fn increment(component: u64, version: &ProjectVersion) -> Result<u64, VersionError> {
    component
        .checked_add(1)
        .ok_or_else(|| VersionError::Overflow(version.to_string()))
}

impl fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(n) = self.beta {
            write!(f, "b{}", n)?;
        }
        Ok(())
    }
}

/// Reads `current_version` from the project's `.bumpversion.cfg`.
pub fn read_current_version(project_root: &Path) -> Result<ProjectVersion, VersionError> {
    let path = project_root.join(BUMPVERSION_FILENAME);
    let not_found = || VersionError::NotFound {
        file: path.display().to_string(),
    };

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => {
            return Err(VersionError::Read {
                file: path.display().to_string(),
                source: e,
            });
        }
    };

    let raw = MARKER_RE
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .ok_or_else(not_found)?;
    log::debug!("Current version read from '{}': {}", path.display(), raw.as_str());
    ProjectVersion::parse(raw.as_str())
}
