//! Movement recording core.
//!
//! Raw location fixes from any number of providers are arbitrated by
//! [`location::evaluate`] into a single best known fix. Accepted fixes are
//! folded into a [`track::Track`] by [`track::TrackRecorder`], which keeps the
//! running distance and marks stopovers. [`session::Session`] ties the two
//! together and [`session::Recorder`] runs a session as a single-writer task
//! behind the HTTP service in [`web`].

pub mod config;
pub mod feed;
pub mod location;
pub mod session;
pub mod track;
pub mod web;
