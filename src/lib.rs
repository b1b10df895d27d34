//! Compiles a declarative game description into a byte-exact, bootable
//! NES (iNES) cartridge image.
//!
//! The entry point is [`Builder::build`]; everything else in this crate
//! exists to support it:
//!
//! - [`game`] — the in-memory aggregate a build compiles.
//! - [`label`] — deterministic naming from domain ids to stable labels.
//! - [`block`] — the polymorphic code-block abstraction and its built-ins.
//! - [`encoder`] — a 6502 instruction-stream writer.
//! - [`registry`] — the set of known blocks, keyed by label.
//! - [`rom`] — the two-pass address/layout engine.
//! - [`error`] — the taxonomy of everything a build can fail with.

pub mod block;
pub mod builder;
pub mod encoder;
pub mod error;
pub mod game;
pub mod label;
pub mod registry;
pub mod rom;
pub mod util;

pub use builder::Builder;
pub use error::{BuildError, BuildResult};
pub use game::Game;

/// Compile `game`'s scene named `initial_scene_name` into cartridge bytes.
///
/// Convenience wrapper around [`Builder::build`] for the common case of an
/// already-loaded aggregate.
pub fn build(game: &Game, initial_scene_name: &str) -> BuildResult<Vec<u8>> {
    Builder::build(Some(game), initial_scene_name)
}
