#![doc = "anywhere-sync-core: core logic library for anywhere-sync."]

//! This crate holds everything that decides *what* gets pushed *where*:
//! settings, credentials, exclusion filtering, local→remote path mapping and
//! the push pipeline itself. It performs no HTTP; the remote side is reached
//! through the traits in [`contract`].
//!
//! # Usage
//! The `anywhere-sync` binary crate implements [`contract::Uploader`] and
//! [`contract::Reloader`] over the PythonAnywhere API and drives [`push`].

pub mod config;
pub mod contract;
pub mod credentials;
pub mod filter;
pub mod paths;
pub mod push;
