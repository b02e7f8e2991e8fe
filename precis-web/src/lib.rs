//! Page-side extraction for Precis.
//!
//! - [`content_script::ContentScript`]: answers page requests from inside a page
//! - [`transcript`]: swappable strategies for locating a video transcript
//! - [`captions::CaptionFetcher`]: fetch and flatten timed-text caption XML
//! - [`page::StaticPage`]: [`precis_drivers::dom::PageDom`] over parsed HTML
//! - [`host`]: the active tab and how messages reach it (browser or static)
//! - [`extractor::Extractor`]: turns a request kind into an extracted payload
//!
//! The page round trip is typed end to end: a [`precis_common::protocol::PageRequest`]
//! goes in, a [`precis_common::protocol::PageReply`] comes back.

pub mod captions;
pub mod content_script;
pub mod extractor;
pub mod host;
pub mod page;
pub mod transcript;

pub use extractor::Extractor;
pub use host::{ActiveTab, TabHost};
