// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Find, clone, and open source repositories by short name.
//!
//! Repositories are kept under a single source directory in a
//! `<forge>/<user>/<repo>` layout, e.g., `~/src/github.com/twpayne/chezmoi`.
//! Given a short argument like `chezmoi`, `twpayne/chezmoi`, or
//! `golang/go@devbox`, this library resolves the full repository location,
//! clones it when missing, and hands it to an editor, a shell, or a browser.
//!
//! Alternatively, repositories can be looked up in a listing of everything
//! already checked out, either on the local machine or on an SSH host, with
//! suffix matching or fuzzy matching.

pub mod action;
pub mod cache;
pub mod config;
pub mod disambiguate;
pub mod matcher;
pub mod parse;
pub mod path;
pub mod repo;
pub mod resolve;
pub mod source;
