#![recursion_limit = "256"]
#![deny(nonstandard_style, clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::multiple_inherent_impl)]

//! Declarative ZFS state reconciliation against a remote host.
//!
//! This library drives `zfs(8)` and `zpool(8)` over a command channel (ssh by default), reads back
//! what actually exists, and works out the smallest set of commands that moves a pool, filesystem
//! or volume towards the state somebody declared. Nothing is cached: every read re-runs its
//! commands.
//!
//! # Overview
//! ## exec
//! The command channel. [`exec::Remote`](exec/struct.Remote.html) formats a command line, runs it
//! through an [`Executor`](exec/trait.Executor.html) with a fixed 60 second timeout and turns
//! stderr into a typed [`Error`](enum.Error.html).
//!
//! ## property
//! Property model and the three-mode diff engine. This is where declared `name=value` pairs are
//! compared with what `zfs get`/`zpool get` report.
//!
//! ## zfs / zpool
//! Describe, create, rename and destroy datasets and pools. Identity is the `guid`, names are
//! allowed to drift.
//!
//! ## resource
//! CRUD entry points for whatever stores the desired state.
//!
//! # Project Structure
//! ### parsers
//! PEG parsers for scripted (`-H`) output backed by [Pest](https://pest.rs/).

#[macro_use] extern crate derive_builder;
#[macro_use] extern crate getset;

#[macro_use] extern crate lazy_static;

#[macro_use] extern crate quick_error;

#[macro_use] pub extern crate slog;

// library modules
pub mod config;
pub mod exec;
pub mod ownership;
pub mod parsers;
pub mod property;
pub mod resource;
pub mod zfs;
pub mod zpool;

mod errors;
mod log;
mod utils;

pub use crate::errors::{CreateFailure, CreateResult, Error, ErrorKind, Result};
pub use crate::log::GlobalLogger;

const VERSION: &str = env!("CARGO_PKG_VERSION");
