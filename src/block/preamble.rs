//! `preamble`: the boot/reset routine the hardware RESET vector points at.
//!
//! Puts the CPU into a known state (interrupts masked, decimal mode off,
//! stack pointer at the top, background/sprite rendering off at the PPU
//! control register), points `zp__src1` at the initial scene's record, and
//! calls `load_scene` once before falling into an infinite self-loop to
//! await the first NMI. `load_scene` itself re-enables rendering at the
//! end of its own routine.

use super::{builtin, hw, BlockKind, CodeBlock, RenderOutput, ResolvedLabels};
use crate::encoder::Encoder;
use crate::error::{BuildError, BuildResult};
use crate::util::split_bytes;

pub struct Preamble {
    initial_scene_label: String,
}

impl Preamble {
    pub fn new(initial_scene_label: impl Into<String>) -> Self {
        Self {
            initial_scene_label: initial_scene_label.into(),
        }
    }

    fn assemble(&self, resolved: &ResolvedLabels) -> BuildResult<Vec<u8>> {
        let zp_src1 = resolved
            .get(builtin::ZP_SRC1)
            .copied()
            .map(|v| v as u8)
            .ok_or_else(|| BuildError::MissingReferencedLabel(builtin::ZP_SRC1.to_string()))?;
        let load_scene_addr = resolved
            .get(builtin::LOAD_SCENE)
            .copied()
            .map(|v| v as u16)
            .ok_or_else(|| BuildError::MissingReferencedLabel(builtin::LOAD_SCENE.to_string()))?;
        let scene_addr = resolved
            .get(&self.initial_scene_label)
            .copied()
            .map(|v| v as u16)
            .ok_or_else(|| BuildError::MissingReferencedLabel(self.initial_scene_label.clone()))?;

        let (scene_lo, scene_hi) = split_bytes(scene_addr);

        let mut enc = Encoder::new();
        enc.sei();
        enc.cld();
        enc.lda_imm(0x00);
        enc.sta_abs(hw::PPU_CTRL);
        enc.ldx_imm(0xFF);
        enc.txs();
        enc.lda_imm(0x00);
        enc.tax();
        enc.tay();
        enc.lda_imm(scene_lo);
        enc.sta_zp(zp_src1);
        enc.lda_imm(scene_hi);
        enc.sta_zp(zp_src1 + 1);
        enc.jsr(load_scene_addr);
        let loop_start = enc.offset();
        enc.jmp_abs(0x0000); // patched below to its own address

        let mut bytes = enc.into_bytes();
        // `JMP abs` targets itself: the self-loop's absolute address is this
        // block's own start offset (passed via `resolved` under this
        // block's own label once placement is known) plus `loop_start`.
        let base = resolved.get(builtin::PREAMBLE).copied().unwrap_or(0) as usize;
        let self_addr = (base + loop_start) as u16;
        let [lo, hi] = self_addr.to_le_bytes();
        bytes[loop_start + 1] = lo;
        bytes[loop_start + 2] = hi;

        Ok(bytes)
    }
}

impl CodeBlock for Preamble {
    fn label(&self) -> &str {
        builtin::PREAMBLE
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Preamble
    }

    fn dependencies(&self) -> Vec<String> {
        vec![
            builtin::ZP_SRC1.to_string(),
            builtin::LOAD_SCENE.to_string(),
            self.initial_scene_label.clone(),
        ]
    }

    fn size(&self) -> BuildResult<usize> {
        let mut stub = ResolvedLabels::new();
        stub.insert(builtin::ZP_SRC1.to_string(), 0);
        stub.insert(builtin::LOAD_SCENE.to_string(), 0xC000);
        stub.insert(self.initial_scene_label.clone(), 0xD000);
        Ok(self.assemble(&stub)?.len())
    }

    fn render(&self, start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        let mut with_self = resolved.clone();
        with_self.insert(builtin::PREAMBLE.to_string(), start_offset as u32);
        Ok(RenderOutput::new(self.assemble(&with_self)?))
    }
}
