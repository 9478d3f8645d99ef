//! Harvest per-year citation counts from a scholar's public profile.
//!
//! A run drives one headless Chromium session: it loads the profile,
//! expands the article listing, keeps the articles published in the
//! requested years, reads each article's citation histogram and writes
//! one table row per article.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod renderer;
pub mod years;
