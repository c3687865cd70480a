//! # Folio
//!
//! The data-access layer of a photography portfolio: named collections of
//! images owned by a signed-in user, stored in a hosted backend that offers
//! a relational store, an object store and an auth session.
//!
//! # Architecture: Operations Over a Gateway
//!
//! Every operation is a free async function that takes the backend
//! explicitly as a [`gateway::Gateway`] and runs a short, strictly
//! sequential chain of calls against it:
//!
//! ```text
//! caller ─► collections / images ─► Gateway ─┬─ AuthApi      (who is calling)
//!                  │                          ├─ RecordStore  (collections, images tables)
//!                  ▼                          └─ ObjectStore  (image bytes, public URLs)
//!               imaging  (decode, downscale, re-encode)
//! ```
//!
//! Two gateways ship with the crate: [`gateway::RestGateway`] talks to a
//! Supabase-compatible HTTP API, and [`gateway::MemoryGateway`] keeps
//! everything in process for tests and offline runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`collections`] | Create, list, fetch by slug, update and delete collections |
//! | [`images`] | Upload (with downscale), public URL and delete for single images |
//! | [`auth`] | Session check and the signed-in user |
//! | [`gateway`] | Backend traits plus the REST and in-memory implementations |
//! | [`imaging`] | Pure-Rust image decode, fit-within resize and re-encode |
//! | [`naming`] | Slugs, default titles and storage keys |
//! | [`types`] | Rows and projections exchanged with the backend |
//! | [`config`] | `folio.toml` loading, merging and environment overrides |
//! | [`error`] | Error type and the kinds callers branch on |
//! | [`output`] | CLI text formatting and the JSON envelope |
//!
//! # Design Decisions
//!
//! ## Object Before Row
//!
//! An upload stores the object first and writes the image row second, so a
//! row never points at nothing. If the row write fails the object is removed
//! again, and the outcome of that cleanup is part of the returned error.
//!
//! ## Resumable Collection Delete
//!
//! Deleting a collection removes its objects in one batch before the row.
//! Objects that are already gone are reported rather than fatal, and any
//! other storage failure stops before the row is touched, so running the
//! delete again picks up where it left off.
//!
//! ## Pure-Rust Imaging
//!
//! Downscaling uses the `image` crate (Lanczos3 resampling) with no system
//! libraries, so the binary is self-contained.

pub mod auth;
pub mod collections;
pub mod config;
pub mod error;
pub mod gateway;
pub mod images;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
