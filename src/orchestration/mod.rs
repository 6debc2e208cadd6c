//! Orchestration of the main and post phases
//!
//! Both phases only talk to their collaborators through traits, so the
//! decision logic runs unchanged against the real installer, tlmgr and cache
//! or against recording fakes.

mod main_phase;
mod post;
mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use main_phase::{run_main, Collaborators, MainOutcome, SetupOptions, TLCONTRIB_TAG};
pub use post::{run_post, PostOutcome};
pub use reconcile::reconcile_texmf;
