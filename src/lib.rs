//! Click-to-edit for raw HTML source.
//!
//! An element picked in a rendered page is described by a [`types::Fingerprint`],
//! re-found in the unparsed source by [`locator::locate`], and changed by
//! [`patch::apply_patch`], which rewrites exactly one line. [`preview::reconcile`]
//! then brings a live rendering up to date without a full reload.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod dom;
pub mod error;
pub mod fingerprint;
pub mod info;
pub mod locator;
pub mod markup;
pub mod patch;
pub mod preview;
pub mod session;
pub mod style;
pub mod types;
pub mod watch;
