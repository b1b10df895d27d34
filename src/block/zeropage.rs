//! Zero-page variable blocks.
//!
//! A zero-page block emits no bytes; its only contribution is the address
//! the layout engine assigns it, exported under its own label so later
//! blocks (which reference these by name) can resolve it.

use super::{BlockKind, CodeBlock, RenderOutput};
use crate::error::BuildResult;

/// A reserved zero-page variable of a fixed byte width (1 or 2).
pub struct ZeroPageVar {
    label: &'static str,
    width: usize,
}

impl ZeroPageVar {
    pub fn new(label: &'static str, width: usize) -> Self {
        debug_assert!(width == 1 || width == 2, "zero page vars are 1 or 2 bytes");
        Self { label, width }
    }

    /// The built-in set of zero-page variables every ROM reserves:
    /// two 16-bit scratch pointers and two single-byte page indices.
    pub fn builtins() -> Vec<ZeroPageVar> {
        use super::builtin::*;
        vec![
            ZeroPageVar::new(ZP_SRC1, 2),
            ZeroPageVar::new(ZP_SRC2, 2),
            ZeroPageVar::new(ZP_ENTITY_RAM_PAGE, 1),
            ZeroPageVar::new(ZP_SPRITE_RAM_PAGE, 1),
        ]
    }
}

impl CodeBlock for ZeroPageVar {
    fn label(&self) -> &str {
        self.label
    }

    fn kind(&self) -> BlockKind {
        BlockKind::ZeroPage
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(self.width)
    }

    fn render(&self, start_offset: usize, _resolved: &super::ResolvedLabels) -> BuildResult<RenderOutput> {
        Ok(RenderOutput::new(Vec::new()).with_export(self.label, start_offset as u32))
    }
}
