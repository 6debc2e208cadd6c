//! Installation cache
//!
//! Keys are derived from the platform, architecture, release and requested
//! package set. An exact match restores a finished installation; a prefix
//! match restores one that still needs packages installed.
//!
//! | Match | Result | Install | Packages |
//! |-------|--------|---------|----------|
//! | primary key | `Primary` | skipped | skipped |
//! | fallback prefix | `Secondary` | skipped | installed |
//! | nothing | `None` | full | installed |

pub mod key;
pub mod store;

pub use key::{current_platform, derive_keys, CacheKeys, PackageSet, KEY_PREFIX};
pub use store::{CacheResult, CacheService, DirectoryCache};
