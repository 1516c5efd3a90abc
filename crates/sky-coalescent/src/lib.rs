//! Skyline/skygrid coalescent likelihood engine.
//!
//! Computes the log-probability of observed genealogies under a
//! continuous-time coalescent whose effective population size follows a
//! piecewise trajectory defined at ordered grid knots. Built for an
//! external MCMC sampler proposing many small perturbations per second:
//! evaluation is lazy per tree, invalidation is minimal per change, and
//! proposals revert through a journaled store/restore/accept transaction.
//!
//! - [`trajectory`]: the piecewise affine population model and its
//!   closed-form reciprocal integrals
//! - [`grid`]: the forward-only cursor that splits intervals at knots
//! - [`skygrid`]: the unconditioned variant (hazard sum only)
//! - [`bounded`]: the variant conditioned on a maximum TMRCA
//! - [`forest`]: multi-tree aggregation, caching, and transactions
//! - [`dirty`]: change-notification to stale-set mapping
//! - [`diagnostics`]: best-effort per-tree breakdown export
//!
//! Tree storage, schedule extraction, and parameter management stay behind
//! the collaborator traits in `sky-core`.

pub mod bounded;
pub mod diagnostics;
pub mod dirty;
pub mod forest;
pub mod grid;
pub mod skygrid;
pub mod trajectory;

pub use bounded::BoundedCoalescentLikelihood;
pub use dirty::ChangeEvent;
pub use forest::ForestLikelihood;
pub use skygrid::SkygridLikelihood;
pub use trajectory::SkygridTrajectory;
