//! Startup wiring for the `precis` binary: key store, tab host, relay and popup.
pub mod wiring;
