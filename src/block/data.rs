//! Data blocks: inert byte tables derived directly from the game aggregate.
//!
//! Unlike the built-in subroutines, these are generated one per asset or
//! entity by [`crate::registry::CodeBlockRegistry::add_game`], so they carry
//! their own label and contents rather than being fixed singletons.

use super::{builtin, BlockKind, CodeBlock, RenderOutput, ResolvedLabels};
use crate::error::{BuildError, BuildResult};

/// Four 3-byte sub-palettes, flattened, from a `PaletteAsset`.
pub struct PaletteData {
    label: String,
    bytes: Vec<u8>,
}

impl PaletteData {
    pub fn new(label: impl Into<String>, sub_palettes: &[[u8; 3]]) -> Self {
        let bytes = sub_palettes.iter().flat_map(|p| p.iter().copied()).collect();
        Self {
            label: label.into(),
            bytes,
        }
    }
}

impl CodeBlock for PaletteData {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Data
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(self.bytes.len())
    }

    fn render(&self, _start_offset: usize, _resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        Ok(RenderOutput::new(self.bytes.clone()))
    }
}

/// A `SpriteSetAsset`'s raw CHR tile bytes, placed into the `Chr` region.
///
/// Unlike every other block, what this exports under its own label is not
/// a byte address but a tile index: `start_offset / 16`, since every CHR
/// tile is a fixed 16 bytes and `EntityData` records reference sprites by
/// tile index rather than by the pattern table's address space.
pub struct SpriteSetCHRData {
    label: String,
    chr: Vec<u8>,
}

impl SpriteSetCHRData {
    pub fn new(label: impl Into<String>, chr: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            chr,
        }
    }
}

impl CodeBlock for SpriteSetCHRData {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Chr
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(self.chr.len())
    }

    fn render(&self, start_offset: usize, _resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        let tile_index = (start_offset / 16) as u32;
        Ok(RenderOutput::new(self.chr.clone()).with_export(self.label.clone(), tile_index))
    }
}

/// One entity's OAM-source record: `(x, y, spriteset_tile_index, palette_index)`.
pub struct EntityData {
    label: String,
    x: u8,
    y: u8,
    spriteset_label: Option<String>,
    palette_index: u8,
}

impl EntityData {
    pub fn new(
        label: impl Into<String>,
        x: u8,
        y: u8,
        spriteset_label: Option<String>,
        palette_index: u8,
    ) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            spriteset_label,
            palette_index,
        }
    }
}

impl CodeBlock for EntityData {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Data
    }

    fn dependencies(&self) -> Vec<String> {
        let mut deps = vec![
            builtin::RENDER_ENTITIES.to_string(),
            builtin::RENDER_SPRITES.to_string(),
        ];
        if let Some(spriteset) = &self.spriteset_label {
            deps.push(spriteset.clone());
        }
        deps
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(4)
    }

    fn render(&self, _start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        let tile = match &self.spriteset_label {
            Some(label) => resolved
                .get(label)
                .copied()
                .ok_or_else(|| BuildError::MissingReferencedLabel(label.clone()))? as u8,
            None => 0,
        };
        Ok(RenderOutput::new(vec![self.x, self.y, tile, self.palette_index]))
    }
}

/// A scene record: backdrop color, optional background/sprite palette
/// pointers, a null-terminated list of entity-record addresses. See
/// [`super::load_scene`] for the exact layout this must match.
pub struct SceneData {
    label: String,
    backdrop_color: u8,
    bg_palette_label: Option<String>,
    sprite_palette_label: Option<String>,
    entity_labels: Vec<String>,
}

impl SceneData {
    pub fn new(
        label: impl Into<String>,
        backdrop_color: u8,
        bg_palette_label: Option<String>,
        sprite_palette_label: Option<String>,
        entity_labels: Vec<String>,
    ) -> Self {
        Self {
            label: label.into(),
            backdrop_color,
            bg_palette_label,
            sprite_palette_label,
            entity_labels,
        }
    }

    fn resolve_ptr(resolved: &ResolvedLabels, label: &Option<String>) -> BuildResult<u16> {
        match label {
            Some(label) => resolved
                .get(label)
                .copied()
                .map(|v| v as u16)
                .ok_or_else(|| BuildError::MissingReferencedLabel(label.clone())),
            None => Ok(0),
        }
    }
}

impl CodeBlock for SceneData {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Data
    }

    fn dependencies(&self) -> Vec<String> {
        let mut deps = Vec::new();
        if let Some(label) = &self.bg_palette_label {
            deps.push(label.clone());
        }
        if let Some(label) = &self.sprite_palette_label {
            deps.push(label.clone());
        }
        deps.extend(self.entity_labels.iter().cloned());
        deps
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(1 + 2 + 2 + 2 * self.entity_labels.len() + 2)
    }

    fn render(&self, _start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        let mut bytes = vec![self.backdrop_color];
        bytes.extend_from_slice(&Self::resolve_ptr(resolved, &self.bg_palette_label)?.to_le_bytes());
        bytes.extend_from_slice(&Self::resolve_ptr(resolved, &self.sprite_palette_label)?.to_le_bytes());
        for label in &self.entity_labels {
            let addr = resolved
                .get(label)
                .copied()
                .map(|v| v as u16)
                .ok_or_else(|| BuildError::MissingReferencedLabel(label.clone()))?;
            bytes.extend_from_slice(&addr.to_le_bytes());
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());
        Ok(RenderOutput::new(bytes))
    }
}

/// A standalone 2-byte little-endian pointer to another block's resolved
/// address. Not produced by [`crate::registry::CodeBlockRegistry::add_game`]
/// (`SceneData` inlines its pointers directly), but kept available for
/// blocks that need an address table entry of their own.
pub struct AddressData {
    label: String,
    target_label: String,
}

impl AddressData {
    pub fn new(label: impl Into<String>, target_label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target_label: target_label.into(),
        }
    }
}

impl CodeBlock for AddressData {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> BlockKind {
        BlockKind::Data
    }

    fn dependencies(&self) -> Vec<String> {
        vec![self.target_label.clone()]
    }

    fn size(&self) -> BuildResult<usize> {
        Ok(2)
    }

    fn render(&self, _start_offset: usize, resolved: &ResolvedLabels) -> BuildResult<RenderOutput> {
        let addr = resolved
            .get(&self.target_label)
            .copied()
            .map(|v| v as u16)
            .ok_or_else(|| BuildError::MissingReferencedLabel(self.target_label.clone()))?;
        Ok(RenderOutput::new(addr.to_le_bytes().to_vec()))
    }
}
