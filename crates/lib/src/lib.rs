//! depman-lib: tracking which builds a CI build was made from
//!
//! A build of a job depends on the builds of its upstream jobs and on the third-party
//! artifacts it pulls from a repository job. This crate records those builds, with
//! their revision-control locations, in a plain-text manifest archived next to the
//! build's artifacts:
//! - `project`: resolving CI jobs and repository artifacts to a concrete build
//! - `graph`: collecting the upstream closure of a build and detecting conflicts
//! - `manifest`: the manifest file format
//! - `manage`: creating manifests and adding projects to them
//! - `download`, `package`: fetching the artifacts a manifest lists and archiving them
//! - `compare`, `age`: reports and release checks over manifests and builds

pub mod age;
pub mod ci;
pub mod compare;
pub mod config;
pub mod consts;
pub mod download;
pub mod graph;
pub mod manage;
pub mod manifest;
pub mod package;
pub mod platform;
pub mod project;
pub mod util;
