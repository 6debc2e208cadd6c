//! TEXMF reconciliation for restored installations

use crate::error::SetupResult;
use crate::texlive::{PackageManager, TexmfKey, TexmfSettings};
use tracing::debug;

/// Bring the installation's TEXMF roots in line with `desired`.
///
/// Keys are visited one at a time in `TexmfKey::ALL` order and only written
/// when the installed value differs. Returns the keys that were changed.
pub async fn reconcile_texmf(
    tlmgr: &dyn PackageManager,
    desired: &TexmfSettings,
) -> SetupResult<Vec<TexmfKey>> {
    let mut changed = Vec::new();
    for key in TexmfKey::ALL {
        let want = desired.get(key);
        let current = tlmgr.texmf_get(key).await?;
        if current.as_deref() == Some(want) {
            debug!("{} already set to {}", key, want);
            continue;
        }
        tlmgr.texmf_set(key, want).await?;
        changed.push(key);
    }
    Ok(changed)
}
