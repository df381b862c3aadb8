//! Build-sheriff triage reports over a snapshot of a buildbot-style CI
//! service and its bug tracker.
//!
//! The library keeps the collaborator seams in [`source`], the domain types
//! in [`model`], the bisection engine in [`explain`], and the greenness
//! report in [`blame`]. The [`snapshot`] module implements every seam over
//! one JSON document, which is what the `sheriff` binary wires the commands
//! to.

pub mod blame;
pub mod cli;
pub mod commands;
pub mod config;
pub mod explain;
pub mod model;
pub mod snapshot;
pub mod source;
mod util;
