//! Driver layer: the page capability the extractor reads from.
//!
//! - [`dom::PageDom`]: read-only view of a loaded page (URL, rendered text,
//!   selector matches, HTML source)
//! - [`browser::driver::PrecisDriver`]: WebDriver session wrapper (fantoccini)
//! - [`browser::page::WebDriverPage`]: [`dom::PageDom`] over the session's
//!   current tab, read by executing scripts in the page
pub mod browser;
pub mod dom;
