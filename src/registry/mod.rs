//! Session registry and the collaborators it talks to.
//!
//! ## Key Types
//!
//! - `SessionRegistry`: concurrent session store running the event pipeline
//! - `ClientCommand`: typed inbound request, one per phase event
//! - `Outbound`: a message plus its audience
//! - `Persistence` / `Transport` / `Identity`: host-provided ports
//!
//! `memory` has in-process implementations of the three ports.

pub mod command;
pub mod memory;
pub mod outbound;
pub mod ports;
pub mod sessions;

pub use command::ClientCommand;
pub use memory::{ConnectionDirectory, Delivery, DeliveryTarget, MemoryStore, RecordingTransport};
pub use outbound::{Audience, Outbound, OutboundMessage};
pub use ports::{Identity, Persistence, Transport};
pub use sessions::{SessionEntry, SessionRegistry};
