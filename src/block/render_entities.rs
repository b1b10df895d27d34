//! `render_entities`: transforms entity records into OAM sprite records.
//!
//! Entity RAM (`$0200`, fixed at `zp__entity_ram_page`'s page) holds up to
//! [`builtin::MAX_N_SCENE_ENTITIES`] 4-byte records `(x, y, spriteset_tile,
//! palette_index)`. For each slot this emits the corresponding 4-byte OAM
//! record `(y, tile, attributes, x)` into the sprite-RAM shadow page
//! (`$0300`); `attributes` carries `palette_index` in its low two bits.
//!
//! The byte offset of entity slot `i` and OAM slot `i` are numerically
//! identical (`4*i`), so a single index register walks both arrays in
//! lock-step; reading field `k` of the entity at offset `X` is simply
//! `LDA ENTITY_RAM_BASE+k,X`. The loop terminates when `X` wraps back to
//! zero after `MAX_N_SCENE_ENTITIES` four-byte steps (`64 * 4 == 256`).

use super::{builtin, hw, BlockKind, CodeBlock, RenderOutput, ResolvedLabels};
use crate::encoder::Encoder;
use crate::error::{BuildError, BuildResult};

pub struct RenderEntities;

impl RenderEntities {
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

        enc.ldx_imm(0x00);
        let loop_start = enc.offset();

        enc.lda_abs_x(hw::ENTITY_RAM_BASE + 1); // entity.y
        enc.sta_abs_x(hw::SPRITE_RAM_BASE);
        enc.lda_abs_x(hw::ENTITY_RAM_BASE + 2); // entity.spriteset_tile_index
        enc.sta_abs_x(hw::SPRITE_RAM_BASE + 1);
        enc.lda_abs_x(hw::ENTITY_RAM_BASE + 3); // entity.palette_index
        enc.and_imm(0x03);
        enc.sta_abs_x(hw::SPRITE_RAM_BASE + 2);
        enc.lda_abs_x(hw::ENTITY_RAM_BASE); // entity.x
        enc.sta_abs_x(hw::SPRITE_RAM_BASE + 3);

        enc.inx();
        enc.inx();
        enc.inx();
        enc.inx();
        let loop_branch = enc.bne();
        enc.patch_branch(loop_branch, loop_start)?;

        enc.lda_imm(hw::SPRITE_RAM_PAGE);
        enc.sta_zp(zp_sprite_ram_page);
        enc.rts();

        Ok(enc.into_bytes())
    }
}

impl CodeBlock for RenderEntities {
    fn label(&self) -> &str {
        builtin::RENDER_ENTITIES
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Subroutine
    }

    fn dependencies(&self) -> Vec<String> {
        vec![
            builtin::ZP_ENTITY_RAM_PAGE.to_string(),
            builtin::ZP_SPRITE_RAM_PAGE.to_string(),
        ]
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
