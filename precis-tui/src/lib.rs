//! Terminal popup: two summarize "buttons", an API key field and a result panel.
mod command;
mod feeders;
pub mod presentation;
mod styles;
mod tui;
mod view;

pub use feeders::spawn_tui_feeders;
pub use presentation::{Panel, summary_html, summary_lines};
pub use tui::{KEY_PROMPT, KEY_SAVED, PopupState, RELAY_UNREACHABLE, TuiActor, TuiMsg};
