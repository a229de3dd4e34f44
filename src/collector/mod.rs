//! Generic collection engine.
//!
//! Three pagination protocols implement one [`PageFetcher`] capability and a
//! single driver ([`collect`] / [`collect_with`] / [`collect_distinct`]) runs any of them to
//! exhaustion, filtering each page and guarding against pagination loops.

mod driver;
mod http;
mod link;
mod offset;
mod page;
mod token;

// Re-export public API
pub use driver::{collect, collect_distinct, collect_with, Collection, StopReason};
pub use http::HttpSource;
pub use link::{parse_link_page, resolve_link, LinkCursorFetcher};
pub use offset::{parse_next_url_page, NextUrlFetcher};
pub use page::{Cursor, Page, PageFetcher};
pub use token::{parse_token_page, TokenCursorFetcher};
