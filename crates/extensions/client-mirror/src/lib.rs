//! # wsdom Client - Mirror
//!
//! Headless client for a wsdom server. It keeps a [`Mirror`] of the remote
//! document in sync by replaying mutation batches, and sends events
//! dispatched against the mirror back upstream.
//!
//! ```rust,ignore
//! let (client, mut updates) =
//!     MirrorClient::connect("ws://127.0.0.1:8080/ws", CaptureOptions::default()).await?;
//! while let Some(update) = updates.recv().await {
//!     println!("{}", client.body_html());
//! }
//! ```

mod client;
mod error;
mod mirror;

pub use client::{CaptureOptions, MirrorClient};
pub use error::MirrorError;
pub use mirror::{Mirror, MirrorUpdate};
