//! News source scrapers.
//!
//! Each scraper follows the same two-phase pattern:
//!
//! 1. **Indexing**: Discover recent article URLs from a section page
//! 2. **Fetching**: Download and parse article content from each URL
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Fox News Tech | [`fox`] | HTML scraping | Cards from about the last day, videos skipped |
//!
//! Parsing is split from fetching so the HTML handling can be tested against
//! fixed pages. Failed fetches are logged and skipped.

pub mod fox;
