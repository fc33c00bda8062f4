//! packsync library.
//!
//! This crate provides the core functionality for syncing upstream GitHub
//! release assets into a local pack tree and republishing that tree as a
//! release. It is used by the `packsync-fetch` and `packsync-publish` CLI
//! binaries, which share only this library and a filesystem convention.
//!
//! # Modules
//!
//! - [`archive`] - Artifact extraction and normalization into the pack tree
//! - [`cli`] - Command-line argument definitions for the fetch binary
//! - [`config`] - `links.json` and `github.json` loaders
//! - [`download`] - Asset download with a name-addressed cache
//! - [`error`] - Top-level error type for the binaries
//! - [`fetch`] - The fetch pipeline orchestration
//! - [`github`] - GitHub REST API types and URL plumbing
//! - [`manifest`] - Manifest generation and rendering
//! - [`output`] - Stderr narration and summary messages
//! - [`package`] - Release package creation
//! - [`progress`] - Progress bar facade
//! - [`publish`] - Release creation and asset upload
//! - [`resolve`] - Latest-release resolution
//! - [`timestamp`] - Wall-clock formatting for tags and logs

pub mod archive;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod github;
pub mod manifest;
pub mod output;
pub mod package;
pub mod progress;
pub mod publish;
pub mod resolve;
pub mod timestamp;
