//! Error taxonomy for the ROM builder
//!
//! Every failure the builder can produce is reported synchronously through
//! `BuildError`. None are recovered inside the core: a build either returns
//! complete bytes or an error, never a partial ROM.

use thiserror::Error;

/// Failures that can occur while compiling a [`crate::game::Game`] into ROM bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The aggregate loader returned no game for the requested id.
    #[error("game not found")]
    GameNotFound,

    /// The aggregate has zero scenes.
    #[error("game has no scenes")]
    NoScenes,

    /// No scene matches the requested initial scene name.
    #[error("no scene named {0:?}")]
    MissingInitialScene(String),

    /// A hard dependency label was absent from the registry during the walk.
    #[error("unknown label: {0}")]
    UnknownLabel(String),

    /// The label registry was asked for a domain id it wasn't populated with.
    #[error("unknown domain id: {0}")]
    UnknownDomainId(String),

    /// Two distinct blocks claimed the same label.
    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    /// The dependency walk revisited a node still in progress.
    #[error("cyclic dependency at label: {0}")]
    CyclicDependency(String),

    /// Cumulative zero-page allocation exceeded 256 bytes.
    #[error("zero page overflow: {used} bytes requested, 256 available")]
    ZeroPageOverflow { used: usize },

    /// PRG usage (code + data + NMI + RESET + vector table) exceeded 16 KiB.
    #[error("PRG overflow: cursor at {cursor:#06X}, limit {limit:#06X}")]
    PrgOverflow { cursor: usize, limit: usize },

    /// CHR usage exceeded 8 KiB.
    #[error("CHR overflow: {used} bytes requested, {limit} available")]
    ChrOverflow { used: usize, limit: usize },

    /// A block's `render` produced a byte count different from its declared size.
    #[error("size mismatch for block {label}: declared {declared}, rendered {rendered}")]
    SizeMismatch {
        label: String,
        declared: usize,
        rendered: usize,
    },

    /// A data block referenced a label absent from the resolved-address map.
    #[error("missing referenced label: {0}")]
    MissingReferencedLabel(String),

    /// A relative branch target fell outside `[-128, 127]`.
    #[error("branch out of range: offset {0} does not fit in i8")]
    BranchOutOfRange(i32),

    /// An asset carried a discriminant the core does not yet emit.
    #[error("unsupported asset kind: {0}")]
    UnsupportedAssetKind(String),
}

/// Convenience alias for builder results.
pub type BuildResult<T> = Result<T, BuildError>;
