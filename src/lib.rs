//! Closure-code recommendation service for incident management.
//!
//! Given a free-text incident description (and an optional application
//! scope), returns the historical closure codes most similar to it, ranked
//! by cosine similarity over a TF-IDF vector space built offline from the
//! closure-code catalog and resolved-incident history.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod recommender;

pub use error::{AppError, Result};
