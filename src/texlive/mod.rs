//! TeX Live domain: releases, repositories, installer and package manager

pub mod ctan;
pub mod install_tl;
pub mod releases;
pub mod texmf;
pub mod tlmgr;
pub mod tlnet;
pub mod version;

pub use releases::{Latest, ReleaseData};
pub use texmf::{TexmfKey, TexmfSettings};
pub use tlmgr::{PackageManager, Tlmgr, UpdateOptions};
pub use version::{RequestedVersion, Version};
