//! Nusach CLI - render, assemble and lint legal document templates.
//!
//! Thin command-line layer over [`nusach_engine`]: it loads templates,
//! contexts, section catalogs and rule tables from disk, runs the drafting
//! pipeline and prints the result.
//!
//! # Example
//!
//! ```
//! use nusach_cli::input::parse_actor_profile;
//! use nusach_engine::GenderProfile;
//!
//! let (actor, profile) = parse_actor_profile("buyer=female").unwrap();
//! assert_eq!(actor, "buyer");
//! assert_eq!(profile, GenderProfile::Female);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Output defaults
//! - [`error`]: Error types and Result alias
//! - [`input`]: Loading files and parsing flag values
//! - [`output`]: Text and JSON formatting
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
