//! The code-block abstraction: a polymorphic unit of emitted bytes.
//!
//! Every piece of the final ROM — a zero-page variable, the reset routine,
//! a subroutine, a data table, a sheet of CHR tiles — implements
//! [`CodeBlock`]. This mirrors the teacher's `Mapper` trait
//! (`mappers::Mapper`): a small interface implemented by several concrete
//! structs, looked up polymorphically through `Box<dyn CodeBlock>` and
//! built by a factory (here, [`crate::registry::CodeBlockRegistry`]) rather
//! than by `new()`-ing each one directly at the call site.

pub mod data;
pub mod handlers;
pub mod load_scene;
pub mod preamble;
pub mod render_entities;
pub mod render_sprites;
pub mod zeropage;

use std::collections::HashMap;

use crate::error::BuildResult;

/// Fixed labels carried by the built-in blocks. Domain-derived labels
/// (`scene__...`, `asset__...`, `entity__...`) live in [`crate::label`].
pub mod builtin {
    pub const ZP_SRC1: &str = "zp__src1";
    pub const ZP_SRC2: &str = "zp__src2";
    pub const ZP_ENTITY_RAM_PAGE: &str = "zp__entity_ram_page";
    pub const ZP_SPRITE_RAM_PAGE: &str = "zp__sprite_ram_page";
    pub const LOAD_SCENE: &str = "load_scene";
    pub const RENDER_ENTITIES: &str = "render_entities";
    pub const RENDER_SPRITES: &str = "render_sprites";
    pub const PREAMBLE: &str = "preamble";
    pub const UPDATE_HANDLER: &str = "update_handler";
    pub const VBLANK_HANDLER: &str = "vblank_handler";

    /// OAM capacity: the fixed number of entity slots `render_entities` processes.
    pub const MAX_N_SCENE_ENTITIES: usize = 64;
}

/// Memory-mapped hardware addresses assumed by every built-in block.
pub mod hw {
    pub const PPU_CTRL: u16 = 0x2000;
    pub const PPU_MASK: u16 = 0x2001;
    pub const PPU_STATUS: u16 = 0x2002;
    pub const PPU_ADDR: u16 = 0x2006;
    pub const PPU_DATA: u16 = 0x2007;
    pub const OAM_DMA: u16 = 0x4014;

    /// Background palette base and its three internal mirror slots.
    pub const PALETTE_BG_BASE: u16 = 0x3F00;
    pub const PALETTE_MIRROR_1: u8 = 0x04;
    pub const PALETTE_MIRROR_2: u8 = 0x08;
    pub const PALETTE_MIRROR_3: u8 = 0x0C;
    /// Sprite palette base, mirrored 0x10 above the background base.
    pub const PALETTE_SPRITE_BASE: u16 = 0x3F10;

    /// Entity RAM window copied out of scene data at boot/scene-load.
    pub const ENTITY_RAM_PAGE: u8 = 0x02;
    pub const ENTITY_RAM_BASE: u16 = 0x0200;
    /// OAM shadow page, populated by `render_entities` and DMA'd by `render_sprites`.
    pub const SPRITE_RAM_PAGE: u8 = 0x03;
    pub const SPRITE_RAM_BASE: u16 = 0x0300;
}

/// Resolved addresses (or, for CHR blocks, tile indices) keyed by label.
pub type ResolvedLabels = HashMap<String, u32>;

/// The bytes a block contributes, plus any labels it exports into the
/// resolved-address map (usually just its own label, at its own address).
#[derive(Debug, Default, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub exported_labels: HashMap<String, u32>,
}

impl RenderOutput {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            exported_labels: HashMap::new(),
        }
    }

    pub fn with_export(mut self, label: impl Into<String>, value: u32) -> Self {
        self.exported_labels.insert(label.into(), value);
        self
    }
}

/// The kind of a block, which determines its target ROM region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    ZeroPage,
    Preamble,
    Vblank,
    Update,
    Subroutine,
    Data,
    Chr,
}

/// A ROM region a block's bytes are placed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    ZeroPage,
    PrgRom,
    NmiPostVblank,
    NmiVblank,
    Reset,
    Chr,
}

impl BlockKind {
    /// The fixed region a block of this kind is laid out into.
    pub fn region(self) -> Region {
        match self {
            BlockKind::ZeroPage => Region::ZeroPage,
            BlockKind::Preamble => Region::Reset,
            BlockKind::Vblank => Region::NmiVblank,
            BlockKind::Update => Region::NmiPostVblank,
            BlockKind::Subroutine | BlockKind::Data => Region::PrgRom,
            BlockKind::Chr => Region::Chr,
        }
    }
}

/// A unit of emitted bytes with a stable identity, a target region, and a
/// declared set of dependencies that must be placed before it.
pub trait CodeBlock {
    /// Identity within the ROM; the only way other blocks refer to this one.
    fn label(&self) -> &str;

    /// Determines this block's target region.
    fn kind(&self) -> BlockKind;

    /// Labels that must already be in the registry (and are walked
    /// transitively) before this block can be placed.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Labels that are walked transitively *if present*, and silently
    /// skipped otherwise.
    fn optional_dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// The exact number of bytes [`CodeBlock::render`] will produce.
    ///
    /// For most blocks this is known without resolved addresses. Blocks
    /// whose encoded size depends on operand values of constant width
    /// (e.g. the preamble, which only ever emits fixed-width absolute
    /// operands) can compute it with a dry render against a placeholder
    /// label map; the layout engine asserts the real render matches this
    /// value exactly.
    fn size(&self) -> BuildResult<usize>;

    /// Produce this block's bytes, given its start offset and the
    /// addresses (or tile indices) resolved for every block already
    /// placed.
    fn render(&self, start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput>;
}
