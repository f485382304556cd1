//! Graph-based skeletal reduction of detailed chemical kinetic models.
//!
//! Given a detailed model, a set of autoignition conditions and an error tolerance,
//! this crate finds a smaller skeletal model that reproduces the detailed model's
//! ignition delays within the tolerance. Species importance is judged on
//! species-interaction graphs sampled along autoignition trajectories, using one of
//! three formulations:
//!
//! - [`graph::Drg`]: the Directly Related Graph,
//! - [`graph::Drgep`]: DRG with Error Propagation,
//! - [`graph::Pfa`]: Path Flux Analysis,
//!
//! followed by an iterative threshold sweep ([`reduction`]) and an optional
//! sensitivity-analysis pass over borderline species ([`sensitivity`]).
//!
//! # Example
//!
//! ```no_run
//! use skeletal_reduce::{InputConfig, reduction};
//! use std::path::Path;
//!
//! let input = InputConfig::load(Path::new("reduce_gri30.yaml")).unwrap();
//! let reduced = reduction::run(&input).unwrap();
//! println!(
//!     "{} species at {:.2}% error",
//!     reduced.model.n_species(),
//!     reduced.error
//! );
//! ```

pub mod chem;
pub mod config;
pub mod error;
pub mod graph;
pub mod reduction;
pub mod sampling;
pub mod sensitivity;
pub mod trim;

#[cfg(test)]
mod test_utils;

pub use config::InputConfig;
pub use error::ReductionError;
pub use graph::Method;

/// A utility method for printing useful metadata of kinetic models.
fn log_model(model: &chem::Model) -> String {
    format!(
        "species={}; reactions={}",
        model.n_species(),
        model.n_reactions()
    )
}
