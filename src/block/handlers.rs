//! `vblank_handler` / `update_handler`: per-frame composition anchors.
//!
//! The two halves of the NMI service routine differ in how their companion
//! work gets there. [`super::render_entities`] is a genuine subroutine, so
//! `update_handler` optionally depends on it and, when present, emits a
//! single `JSR` to call it. [`super::render_sprites`] is itself placed
//! directly in the VBLANK window (see its module doc), so `vblank_handler`
//! never emits anything of its own — it exists only as the fixed anchor
//! `Builder` places after `render_sprites`, carrying the optional
//! dependency so the dependency walk still reaches it even when nothing
//! else in a scene would. A game with no entities gets neither a `JSR` nor
//! an inlined `render_sprites`, and the assembled NMI handler is just the
//! single `RTI` the ROM layout appends after both — see the
//! NMI-composition decision recorded in `DESIGN.md`.

use super::{builtin, BlockKind, CodeBlock, RenderOutput, ResolvedLabels};
use crate::encoder::Encoder;
use crate::error::{BuildError, BuildResult};

pub struct UpdateHandler {
    target: Option<String>,
}

impl UpdateHandler {
    /// `target` is `Some(render_entities_label)` iff that subroutine is
    /// already part of the ROM being built.
    pub fn new(target: Option<String>) -> Self {
        Self { target }
    }
}

impl CodeBlock for UpdateHandler {
    fn label(&self) -> &str {
        builtin::UPDATE_HANDLER
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Update
    }

    fn dependencies(&self) -> Vec<String> {
        self.target.iter().cloned().collect()
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(if self.target.is_some() { 3 } else { 0 })
    }

    fn render(&self, _start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        let bytes = match &self.target {
            Some(label) => {
                let addr = resolved
                    .get(label)
                    .copied()
                    .ok_or_else(|| BuildError::MissingReferencedLabel(label.clone()))?;
                let mut enc = Encoder::new();
                enc.jsr(addr as u16);
                enc.into_bytes()
            }
            None => Vec::new(),
        };
        Ok(RenderOutput::new(bytes))
    }
}

pub struct VblankHandler {
    target: Option<String>,
}

impl VblankHandler {
    /// `target` is `Some(render_sprites_label)` iff that subroutine is
    /// already part of the ROM being built.
    pub fn new(target: Option<String>) -> Self {
        Self { target }
    }
}

impl CodeBlock for VblankHandler {
    fn label(&self) -> &str {
        builtin::VBLANK_HANDLER
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Vblank
    }

    fn optional_dependencies(&self) -> Vec<String> {
        self.target.iter().cloned().collect()
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(0)
    }

    fn render(&self, _start_offset: usize, _resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        Ok(RenderOutput::new(Vec::new()))
    }
}
