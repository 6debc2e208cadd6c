//! TEXMF directory roles
//!
//! Only the per-user roots are tracked; they are the settings a restored
//! installation may disagree with.

use crate::texlive::version::Version;
use std::fmt;

/// A user-level TEXMF root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexmfKey {
    Home,
    Config,
    Var,
}

impl TexmfKey {
    /// All tracked keys, in reconciliation order
    pub const ALL: [TexmfKey; 3] = [Self::Home, Self::Config, Self::Var];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "TEXMFHOME",
            Self::Config => "TEXMFCONFIG",
            Self::Var => "TEXMFVAR",
        }
    }

    /// Environment variable install-tl reads for this key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Home => "TEXLIVE_INSTALL_TEXMFHOME",
            Self::Config => "TEXLIVE_INSTALL_TEXMFCONFIG",
            Self::Var => "TEXLIVE_INSTALL_TEXMFVAR",
        }
    }
}

impl fmt::Display for TexmfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired values for the tracked TEXMF roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexmfSettings {
    pub home: String,
    pub config: String,
    pub var: String,
}

impl TexmfSettings {
    /// Defaults used by install-tl when nothing is configured
    pub fn defaults(version: Version) -> Self {
        Self {
            home: "~/texmf".to_string(),
            config: format!("~/.local/texlive/{}/texmf-config", version),
            var: format!("~/.local/texlive/{}/texmf-var", version),
        }
    }

    /// Defaults overridden by `TEXLIVE_INSTALL_TEXMF*` variables
    pub fn from_env(version: Version) -> Self {
        Self::from_lookup(version, |name| std::env::var(name).ok())
    }

    fn from_lookup(version: Version, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::defaults(version);
        for key in TexmfKey::ALL {
            if let Some(value) = lookup(key.env_var()).filter(|v| !v.is_empty()) {
                *settings.get_mut(key) = value;
            }
        }
        settings
    }

    pub fn get(&self, key: TexmfKey) -> &str {
        match key {
            TexmfKey::Home => &self.home,
            TexmfKey::Config => &self.config,
            TexmfKey::Var => &self.var,
        }
    }

    fn get_mut(&mut self, key: TexmfKey) -> &mut String {
        match key {
            TexmfKey::Home => &mut self.home,
            TexmfKey::Config => &mut self.config,
            TexmfKey::Var => &mut self.var,
        }
    }
}
