//! The knowledge graph — typed nodes, paragraph-scoped co-occurrence edges,
//! and the decay model that turns raw counts into display weights.
//!
//! Type definitions live in [`types`], the single-owner store in [`store`],
//! and the pure weighting functions in [`decay`].

pub mod decay;
pub mod store;
pub mod types;
