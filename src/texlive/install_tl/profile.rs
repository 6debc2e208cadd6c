//! install-tl profile generation

use crate::texlive::texmf::TexmfSettings;
use crate::texlive::version::Version;
use std::fmt;
use std::path::{Path, PathBuf};

/// Installation profile passed to `install-tl -profile`
#[derive(Debug, Clone)]
pub struct Profile {
    pub version: Version,
    pub texdir: PathBuf,
    pub texmflocal: PathBuf,
    pub texmf: TexmfSettings,
}

impl Profile {
    /// Profile installing `version` into `texdir`, with `prefix` holding shared trees
    pub fn new(version: Version, prefix: &Path, texdir: &Path, texmf: TexmfSettings) -> Self {
        Self {
            version,
            texdir: texdir.to_path_buf(),
            texmflocal: prefix.join("texmf-local"),
            texmf,
        }
    }

    fn option_prefixes(&self) -> (&'static str, &'static str) {
        if self.version < Version::INSTOPT_RENAME {
            ("option_", "option_")
        } else {
            ("instopt_", "tlpdbopt_")
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (instopt, tlpdbopt) = self.option_prefixes();
        writeln!(f, "selected_scheme scheme-infraonly")?;
        writeln!(f, "TEXDIR {}", self.texdir.display())?;
        writeln!(f, "TEXMFLOCAL {}", self.texmflocal.display())?;
        writeln!(f, "TEXMFSYSCONFIG {}", self.texdir.join("texmf-config").display())?;
        writeln!(f, "TEXMFSYSVAR {}", self.texdir.join("texmf-var").display())?;
        writeln!(f, "TEXMFHOME {}", self.texmf.home)?;
        writeln!(f, "TEXMFCONFIG {}", self.texmf.config)?;
        writeln!(f, "TEXMFVAR {}", self.texmf.var)?;
        // The installation keeps using the repository it was installed from.
        writeln!(f, "{}adjustrepo 0", instopt)?;
        writeln!(f, "{}autobackup 0", tlpdbopt)?;
        if self.version < Version::INSTOPT_RENAME {
            writeln!(f, "option_doc 0")?;
            writeln!(f, "option_src 0")
        } else {
            writeln!(f, "tlpdbopt_install_docfiles 0")?;
            writeln!(f, "tlpdbopt_install_srcfiles 0")
        }
    }
}
