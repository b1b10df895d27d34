//! Two-pass ROM layout: address assignment, then emission.
//!
//! Pass A walks every placed block in region order and assigns it an
//! address (or, for CHR blocks, a tile index) with nothing but running
//! cursors — no block is rendered yet, so every label is resolvable before
//! any block needs one. Pass B re-walks the same order calling
//! [`CodeBlock::render`] against the now-complete address map, checking
//! each block's actual output length against its declared [`CodeBlock::size`].
//!
//! The NMI service routine is POST_VBLANK blocks (`update_handler`'s call
//! into `render_entities`) followed by VBLANK blocks (`render_sprites`'s
//! inline OAM DMA, then the empty `vblank_handler` anchor), so the
//! per-frame entity transform always runs before the stale OAM shadow page
//! gets DMA'd out.

use crate::block::{CodeBlock, Region, ResolvedLabels};
use crate::error::{BuildError, BuildResult};

const ZERO_PAGE_LIMIT: usize = 0x100;
const PRG_BASE: usize = 0xC000;
const PRG_SIZE: usize = 0x4000;
const VECTOR_TABLE_SIZE: usize = 6;
const PRG_CONTENT_LIMIT: usize = PRG_BASE + PRG_SIZE - VECTOR_TABLE_SIZE;
const CHR_SIZE: usize = 0x2000;
const PAD_FILL: u8 = 0x00;
const NMI_RTI: u8 = 0x40;

/// Fixed background test tile occupying CHR tile 0: bit plane 0 is
/// `0x0F` repeated eight times, bit plane 1 is `0x00` four times then
/// `0xFF` four times, rendering as a four-color quadrant test pattern.
const CHR_TEST_TILE: [u8; 16] = [
    0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
];

pub struct Rom {
    blocks: Vec<Box<dyn CodeBlock>>,
}

impl Rom {
    pub fn new(blocks: Vec<Box<dyn CodeBlock>>) -> Self {
        Self { blocks }
    }

    pub fn render(self) -> BuildResult<Vec<u8>> {
        let mut zero_page = Vec::new();
        let mut prg = Vec::new();
        let mut nmi_vblank = Vec::new();
        let mut nmi_post = Vec::new();
        let mut reset = Vec::new();
        let mut chr = Vec::new();

        for block in self.blocks {
            match block.kind().region() {
                Region::ZeroPage => zero_page.push(block),
                Region::PrgRom => prg.push(block),
                Region::NmiVblank => nmi_vblank.push(block),
                Region::NmiPostVblank => nmi_post.push(block),
                Region::Reset => reset.push(block),
                Region::Chr => chr.push(block),
            }
        }

        let mut resolved = ResolvedLabels::new();

        let mut zp_cursor = 0usize;
        for block in &zero_page {
            resolved.insert(block.label().to_string(), zp_cursor as u32);
            zp_cursor += block.size()?;
        }
        if zp_cursor > ZERO_PAGE_LIMIT {
            return Err(BuildError::ZeroPageOverflow { used: zp_cursor });
        }

        let mut prg_cursor = PRG_BASE;
        for block in &prg {
            resolved.insert(block.label().to_string(), prg_cursor as u32);
            prg_cursor += block.size()?;
        }
        let nmi_entry_addr = prg_cursor;
        for block in nmi_post.iter().chain(nmi_vblank.iter()) {
            resolved.insert(block.label().to_string(), prg_cursor as u32);
            prg_cursor += block.size()?;
        }
        let nmi_rti_addr = prg_cursor;
        prg_cursor += 1;
        for block in &reset {
            resolved.insert(block.label().to_string(), prg_cursor as u32);
            prg_cursor += block.size()?;
        }
        let reset_addr = reset
            .first()
            .map(|b| resolved[b.label()])
            .unwrap_or(nmi_rti_addr as u32);
        if prg_cursor > PRG_CONTENT_LIMIT {
            return Err(BuildError::PrgOverflow {
                cursor: prg_cursor,
                limit: PRG_CONTENT_LIMIT,
            });
        }

        // Tile 0 is reserved for the fixed background test tile; sprite-set
        // CHR starts at tile index 1 (byte offset 16).
        let mut chr_cursor = CHR_TEST_TILE.len();
        for block in &chr {
            resolved.insert(block.label().to_string(), (chr_cursor / 16) as u32);
            chr_cursor += block.size()?;
        }
        if chr_cursor > CHR_SIZE {
            return Err(BuildError::ChrOverflow {
                used: chr_cursor,
                limit: CHR_SIZE,
            });
        }

        let mut prg_bytes = Vec::with_capacity(PRG_SIZE);
        let mut cursor = PRG_BASE;
        for block in &prg {
            Self::emit(block.as_ref(), cursor, &resolved, &mut prg_bytes)?;
            cursor += block.size()?;
        }
        for block in nmi_post.iter().chain(nmi_vblank.iter()) {
            Self::emit(block.as_ref(), cursor, &resolved, &mut prg_bytes)?;
            cursor += block.size()?;
        }
        prg_bytes.push(NMI_RTI);
        cursor += 1;
        for block in &reset {
            Self::emit(block.as_ref(), cursor, &resolved, &mut prg_bytes)?;
            cursor += block.size()?;
        }
        debug_assert_eq!(cursor, PRG_BASE + prg_bytes.len());

        while prg_bytes.len() < PRG_SIZE - VECTOR_TABLE_SIZE {
            prg_bytes.push(PAD_FILL);
        }
        prg_bytes.extend_from_slice(&(nmi_entry_addr as u16).to_le_bytes());
        prg_bytes.extend_from_slice(&(reset_addr as u16).to_le_bytes());
        // IRQ reuses the NMI vector verbatim (this platform never fires one).
        prg_bytes.extend_from_slice(&(nmi_entry_addr as u16).to_le_bytes());

        let mut chr_bytes = Vec::with_capacity(CHR_SIZE);
        chr_bytes.extend_from_slice(&CHR_TEST_TILE);
        for block in &chr {
            Self::emit(block.as_ref(), chr_bytes.len(), &resolved, &mut chr_bytes)?;
        }
        chr_bytes.resize(CHR_SIZE, 0x00);

        let mut rom = Vec::with_capacity(16 + PRG_SIZE + CHR_SIZE);
        rom.extend_from_slice(&header());
        rom.extend_from_slice(&prg_bytes);
        rom.extend_from_slice(&chr_bytes);
        Ok(rom)
    }

    fn emit(
        block: &dyn CodeBlock,
        start_offset: usize,
        resolved: &ResolvedLabels,
        out: &mut Vec<u8>,
    ) -> BuildResult<()> {
        let declared = block.size()?;
        let output = block.render(start_offset, resolved)?;
        if output.bytes.len() != declared {
            return Err(BuildError::SizeMismatch {
                label: block.label().to_string(),
                declared,
                rendered: output.bytes.len(),
            });
        }
        out.extend_from_slice(&output.bytes);
        Ok(())
    }
}

/// The 16-byte iNES header: one 16 KiB PRG bank, one 8 KiB CHR bank,
/// horizontal mirroring, mapper 0 (NROM), no trainer, no battery RAM.
fn header() -> [u8; 16] {
    let mut header = [0u8; 16];
    header[0..4].copy_from_slice(b"NES\x1A");
    header[4] = 1; // PRG ROM banks (16 KiB each)
    header[5] = 1; // CHR ROM banks (8 KiB each)
    header[6] = 0b0000_0000; // mapper 0, horizontal mirroring
    header[7] = 0b0000_0000;
    header
}
