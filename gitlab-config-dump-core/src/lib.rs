#![doc = "gitlab-config-dump-core: core logic library for gitlab-config-dump."]

//! This crate contains the export pipeline: project lookup, configuration tree
//! assembly, file download and the sinks downloaded files are handed to.
//! It has no HTTP stack of its own; callers provide a [`contract::RepositoryApi`].
//!
//! # Usage
//! Build an [`export::ExportOptions`] and call [`export::run_export`] with an API
//! implementation and a [`contract::FileSink`].

pub mod contract;
pub mod download;
pub mod error;
pub mod export;
pub mod listing;
pub mod locator;
pub mod paths;
pub mod sink;
pub mod tree;
