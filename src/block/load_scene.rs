//! `load_scene`: parses a scene record and programs PPU palette RAM plus
//! entity RAM from it.
//!
//! Scene record format (pointed to by `zp__src1`):
//! ```text
//! byte 0:      backdrop color index
//! bytes 1-2:   little-endian pointer to background-palette data, or $0000
//! bytes 3-4:   little-endian pointer to sprite-palette data, or $0000
//! bytes 5..:   zero or more 2-byte little-endian entity-data addresses,
//!              terminated by $0000
//! ```
//!
//! The background/sprite palette pointers, when present, point at a flat
//! table of four 3-byte sub-palettes (a [`super::data::PaletteData`]
//! block). The entity addresses point at 4-byte entity records (a
//! [`super::data::EntityData`] block each); `load_scene` dereferences each
//! one and copies its 4 bytes into entity RAM at `$0200`, 4 bytes per slot.

use super::{builtin, hw, BlockKind, CodeBlock, RenderOutput, ResolvedLabels};
use crate::encoder::Encoder;
use crate::error::{BuildError, BuildResult};

pub struct LoadScene;

impl LoadScene {
    pub fn new() -> Self {
        Self
    }

    fn zp(resolved: &ResolvedLabels, label: &str) -> BuildResult<u8> {
        resolved
            .get(label)
            .copied()
            .map(|v| v as u8)
            .ok_or_else(|| BuildError::MissingReferencedLabel(label.to_string()))
    }

    /// Emit the 15-byte unrolled copy of four 3-byte sub-palettes from
    /// `(zp_src2),Y`, with the stacked backdrop byte re-emitted as a
    /// mirror write after the first, second, and third sub-palette.
    fn emit_palette_copy(enc: &mut Encoder, zp_src2: u8) {
        for sub_palette in 0..4 {
            for _ in 0..3 {
                enc.lda_indirect_indexed_y(zp_src2);
                enc.sta_abs(hw::PPU_DATA);
                enc.iny();
            }
            if sub_palette < 3 {
                enc.pla();
                enc.sta_abs(hw::PPU_DATA);
                enc.pha();
            }
        }
    }

    fn assemble(&self, resolved: &ResolvedLabels) -> BuildResult<Vec<u8>> {
        let zp_src1 = Self::zp(resolved, builtin::ZP_SRC1)?;
        let zp_src2 = Self::zp(resolved, builtin::ZP_SRC2)?;
        let zp_entity_ram_page = Self::zp(resolved, builtin::ZP_ENTITY_RAM_PAGE)?;

        let mut enc = Encoder::new();

        // Step 1-2: reset the PPU address latch, point it at $3F00.
        enc.lda_abs(hw::PPU_STATUS);
        enc.lda_imm(0x3F);
        enc.sta_abs(hw::PPU_ADDR);
        enc.lda_imm(0x00);
        enc.sta_abs(hw::PPU_ADDR);

        // Step 3: write the backdrop byte, and stash it on the stack for reuse.
        enc.ldy_imm(0x00);
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_abs(hw::PPU_DATA);
        enc.pha();

        // Step 4: background palette, if present.
        enc.ldy_imm(0x01);
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_zp(zp_src2);
        enc.iny();
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_zp(zp_src2 + 1);
        enc.lda_zp(zp_src2);
        enc.ora_zp(zp_src2 + 1);
        let skip_bg = enc.beq();
        enc.ldy_imm(0x00);
        Self::emit_palette_copy(&mut enc, zp_src2);
        let after_bg = enc.offset();
        enc.patch_branch(skip_bg, after_bg)?;

        // Step 5: sprite palette pointer, PPU address reset to $3F10, backdrop mirror.
        enc.ldy_imm(0x03);
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_zp(zp_src2);
        enc.iny();
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_zp(zp_src2 + 1);
        enc.lda_imm(0x3F);
        enc.sta_abs(hw::PPU_ADDR);
        enc.lda_imm(0x10);
        enc.sta_abs(hw::PPU_ADDR);
        enc.pla();
        enc.sta_abs(hw::PPU_DATA);
        enc.pha();
        enc.lda_zp(zp_src2);
        enc.ora_zp(zp_src2 + 1);
        let skip_sprite = enc.beq();
        enc.ldy_imm(0x00);
        Self::emit_palette_copy(&mut enc, zp_src2);
        let after_sprite = enc.offset();
        enc.patch_branch(skip_sprite, after_sprite)?;
        enc.pla(); // balance the initial PHA; backdrop no longer needed

        // Step 6: copy the null-terminated entity-address list into entity RAM.
        enc.ldy_imm(0x05);
        enc.ldx_imm(0x00);
        let loop_start = enc.offset();
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_zp(zp_src2);
        enc.iny();
        enc.lda_indirect_indexed_y(zp_src1);
        enc.sta_zp(zp_src2 + 1);
        enc.iny();
        enc.lda_zp(zp_src2);
        enc.ora_zp(zp_src2 + 1);
        let done = enc.beq();
        enc.tya();
        enc.pha();
        enc.ldy_imm(0x00);
        for _ in 0..4 {
            enc.lda_indirect_indexed_y(zp_src2);
            enc.sta_abs_x(hw::ENTITY_RAM_BASE);
            enc.iny();
            enc.inx();
        }
        enc.pla();
        enc.tay();
        enc.clc();
        let loop_back = enc.bcc();
        enc.patch_branch(loop_back, loop_start)?;
        let done_offset = enc.offset();
        enc.patch_branch(done, done_offset)?;

        enc.lda_imm(hw::ENTITY_RAM_PAGE);
        enc.sta_zp(zp_entity_ram_page);

        // Step 7: enable NMI, show background and sprites.
        enc.lda_imm(0x80);
        enc.sta_abs(hw::PPU_CTRL);
        enc.lda_imm(0x1E);
        enc.sta_abs(hw::PPU_MASK);

        // Step 8.
        enc.rts();

        Ok(enc.into_bytes())
    }
}

impl CodeBlock for LoadScene {
    fn label(&self) -> &str {
        builtin::LOAD_SCENE
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Subroutine
    }

    fn dependencies(&self) -> Vec<String> {
        vec![
            builtin::ZP_SRC1.to_string(),
            builtin::ZP_SRC2.to_string(),
            builtin::ZP_ENTITY_RAM_PAGE.to_string(),
        ]
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(self.assemble(&placeholder_labels())?.len())
    }

    fn render(&self, _start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        Ok(RenderOutput::new(self.assemble(resolved)?))
    }
}

/// Stub zero-page addresses of the correct width, used only to discover
/// this block's byte length before real addresses are assigned. The
/// routine's size never actually depends on the values, only on their
/// (fixed) addressing-mode widths.
fn placeholder_labels() -> ResolvedLabels {
    let mut map = ResolvedLabels::new();
    map.insert(builtin::ZP_SRC1.to_string(), 0);
    map.insert(builtin::ZP_SRC2.to_string(), 2);
    map.insert(builtin::ZP_ENTITY_RAM_PAGE.to_string(), 4);
    map
}
