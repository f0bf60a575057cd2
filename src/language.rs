//! Language-version rule toggles consumed by the checker.
//!
//! Settings ride the `Context` as a read-only capability; there is no
//! process-global state.

use std::fmt;
use std::str::FromStr;

/// Source language version selected for a compilation unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LanguageVersion {
    /// Legacy rules: invariant type parameters are compared covariantly.
    Sable1,
    #[default]
    Sable2,
}

impl LanguageVersion {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageVersion::Sable1 => "sable-1",
            LanguageVersion::Sable2 => "sable-2",
        }
    }
}

impl FromStr for LanguageVersion {
    type Err = UnknownVersion;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        match spec.to_ascii_lowercase().as_str() {
            "sable-1" | "1" => Ok(Self::Sable1),
            "sable-2" | "2" => Ok(Self::Sable2),
            _ => Err(UnknownVersion(spec.to_string())),
        }
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced when a version spec does not name a known version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVersion(pub String);

impl fmt::Display for UnknownVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language version `{}`", self.0)
    }
}

/// Rule switches that depend on the selected language version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LanguageSettings {
    pub version: LanguageVersion,
    /// Invariant type parameters require mutual subtyping. When off,
    /// invariant parameters are compared covariantly (legacy behavior).
    pub strict_variance: bool,
    /// Widen singleton and literal types when binding a mutable value.
    pub widen_mutable: bool,
}

impl LanguageSettings {
    #[must_use]
    pub fn for_version(version: LanguageVersion) -> Self {
        Self {
            version,
            strict_variance: matches!(version, LanguageVersion::Sable2),
            widen_mutable: true,
        }
    }

    /// Apply `key=value` define overrides on top of the version defaults.
    ///
    /// Unknown keys and malformed entries are ignored; the driver validates
    /// the define list before handing it to the core.
    #[must_use]
    pub fn with_defines<S: AsRef<str>>(mut self, defines: &[S]) -> Self {
        for define in defines {
            let Some((key, value)) = define.as_ref().split_once('=') else {
                continue;
            };
            match (key.trim(), value.trim()) {
                ("variance", "strict") => self.strict_variance = true,
                ("variance", "loose") => self.strict_variance = false,
                ("widen-mutable", "on") => self.widen_mutable = true,
                ("widen-mutable", "off") => self.widen_mutable = false,
                ("language", spec) => {
                    if let Ok(version) = spec.parse::<LanguageVersion>() {
                        let rules = Self::for_version(version);
                        self.version = rules.version;
                        self.strict_variance = rules.strict_variance;
                    }
                }
                _ => {}
            }
        }
        self
    }
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self::for_version(LanguageVersion::default())
    }
}
