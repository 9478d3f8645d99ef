//! Page acquisition: the paginated profile listing and per-article
//! citation pages.

pub mod citations;
pub mod paginator;
