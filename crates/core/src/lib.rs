//! # KubeClaw Core
//!
//! Domain types, traits, and error definitions for the KubeClaw cluster
//! assistant. It defines the domain model that all other crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the LLM completion endpoint
//! - [`Tool`]: one entry of the fixed tool catalog
//! - [`SessionStore`]: the table of live conversations
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted providers and in-memory stores.

pub mod confirmation;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use confirmation::{ConfirmationReply, PendingConfirmation};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{ChatMessage, MessageStore, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use session::{Session, SessionHandle, SessionId, SessionSnapshot, SessionStore};
pub use tool::{Tool, ToolCatalog};
