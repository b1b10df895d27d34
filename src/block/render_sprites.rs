//! `render_sprites`: triggers the OAM DMA transfer.
//!
//! Copying the sprite-RAM shadow page into the PPU's OAM is a single
//! hardware-assisted transfer: writing the page number to `$4014` (OAMDMA)
//! makes the 2A03 copy all 256 bytes of that page into OAM automatically.
//! This block is placed directly in the VBLANK window rather than called as
//! a subroutine, so it falls straight through into whatever follows instead
//! of returning.

use super::{builtin, hw, BlockKind, CodeBlock, RenderOutput, ResolvedLabels};
use crate::encoder::Encoder;
use crate::error::{BuildError, BuildResult};

pub struct RenderSprites;

impl RenderSprites {
    pub fn new() -> Self {
        Self
    }

    fn assemble(&self, resolved: &ResolvedLabels) -> BuildResult<Vec<u8>> {
        let zp_sprite_ram_page = resolved
            .get(builtin::ZP_SPRITE_RAM_PAGE)
            .copied()
            .map(|v| v as u8)
            .ok_or_else(|| BuildError::MissingReferencedLabel(builtin::ZP_SPRITE_RAM_PAGE.to_string()))?;

        let mut enc = Encoder::new();
        enc.lda_zp(zp_sprite_ram_page);
        enc.sta_abs(hw::OAM_DMA);
        Ok(enc.into_bytes())
    }
}

impl CodeBlock for RenderSprites {
    fn label(&self) -> &str {
        builtin::RENDER_SPRITES
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Vblank
    }

    fn dependencies(&self) -> Vec<String> {
        vec![builtin::ZP_SPRITE_RAM_PAGE.to_string()]
    }

    fn size(&self) -> BuildResult<usize> {
        let mut stub = ResolvedLabels::new();
        stub.insert(builtin::ZP_SPRITE_RAM_PAGE.to_string(), 3);
        Ok(self.assemble(&stub)?.len())
    }

    fn render(&self, _start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        Ok(RenderOutput::new(self.assemble(resolved)?))
    }
}
