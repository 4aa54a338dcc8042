//! Domain models for the Odyssey dashboard.
//!
//! # Core Concepts
//!
//! ## Persisted Entities
//!
//! - [`Module`]: One unit of the learning roadmap. Progress only ever grows, and
//!   a module at 100% is [`ModuleStatus::Completed`].
//! - [`Task`]: One unit of user project work, flipped by id.
//! - [`LogEntry`]: Immutable, timestamped system event shown in the console.
//!
//! ## Transient Values
//!
//! These never reach the durable medium:
//!
//! - [`Tab`] and [`DeepLink`]: Which dashboard view is active and where the
//!   roadmap should focus.
//! - [`Action`]: A command issued from the palette, resolved by the engine.

mod command;
mod log;
mod module;
mod navigation;
mod task;

pub use command::*;
pub use log::*;
pub use module::*;
pub use navigation::*;
pub use task::*;
