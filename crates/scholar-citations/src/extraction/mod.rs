//! Markup parsing: listing rows and citation histograms.

pub mod histogram;
pub mod listing;
