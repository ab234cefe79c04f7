//! reposync-lib: reconciliation engine for repository-scoped configuration
//!
//! This crate diffs two declared states of repository configuration and
//! applies the difference through a remote collaborator:
//! - `diff`: classify items into create, update and delete buckets
//! - `execute`: apply a change set phase by phase with bounded parallelism
//! - `rollback`: invert an applied change set from its outcome
//! - `plan`: stable on-disk documents for diffs, rollback plans and results
//! - `state`: declared-state documents covering every item domain
//! - `remote`: an offline collaborator backed by a state document

pub mod diff;
pub mod execute;
pub mod item;
pub mod plan;
pub mod remote;
pub mod repository;
pub mod rollback;
pub mod state;
