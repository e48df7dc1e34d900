//! Adapter utilities for the `folio` crate.
//!
//! The `folio` crate is UI-agnostic and only knows about raw documents and revealed keys. This
//! crate provides small, framework-neutral helpers a portfolio front end needs on top:
//!
//! - [`RevealController`]: owns the observer attach/teardown lifecycle of one revealed list
//! - Typed records ([`Project`], [`UserProfile`]) decoded from collection documents
//! - [`ProjectFilter`]: search and category filtering that versions the listed projects
//!
//! This crate does not bind to any rendering framework.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod filter;
mod records;
mod reveal;

#[cfg(test)]
mod tests;

pub use filter::{ALL_CATEGORIES, ProjectFilter, categories};
pub use records::{
    ContactInfo, ImageBlocks, Project, ProjectStatus, SocialLink, TextBlocks, UnknownStatus,
    UserInfo, UserProfile, decode_projects,
};
pub use reveal::RevealController;
