//! Actor runtime and the relay that drives a summarize request end to end.
//!
//! - [`actor`]: minimal typed actors over bounded tokio mailboxes
//! - [`system`] / [`builder`]: task tracking, shutdown broadcast, wiring by name
//! - [`keystore`]: persistence for the user's API key
//! - [`relay`]: the credential → tab → extract → summarize pipeline and its actor
pub mod actor;
pub mod builder;
pub mod keystore;
pub mod relay;
pub mod system;

use precis_common::protocol::RelayResponse;
use precis_common::RequestKind;
use tokio::sync::oneshot;

/// Mailbox message of [`relay::RelayActor`].
pub enum RelayMsg {
    Summarize {
        kind: RequestKind,
        reply: oneshot::Sender<RelayResponse>,
    },
}
