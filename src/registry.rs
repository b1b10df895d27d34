//! The set of known code blocks, keyed by label.
//!
//! Mirrors the teacher's `mappers::create_mapper` dispatch: a small set of
//! built-in implementations looked up by a string key, plus here, domain
//! blocks derived fresh from each game aggregate. [`crate::builder::Builder`]
//! resolves dependencies purely by looking labels up in this registry.

use std::collections::HashMap;

use crate::block::data::{EntityData, PaletteData, SpriteSetCHRData};
use crate::block::handlers::{UpdateHandler, VblankHandler};
use crate::block::load_scene::LoadScene;
use crate::block::preamble::Preamble;
use crate::block::render_entities::RenderEntities;
use crate::block::render_sprites::RenderSprites;
use crate::block::zeropage::ZeroPageVar;
use crate::block::CodeBlock;
use crate::error::{BuildError, BuildResult};
use crate::game::{Asset, Game, SpriteSetKind};
use crate::label::LabelRegistry;

#[derive(Default)]
pub struct CodeBlockRegistry {
    blocks: HashMap<String, Box<dyn CodeBlock>>,
}

impl CodeBlockRegistry {
    /// A registry seeded with every fixed built-in block. `preamble`,
    /// `update_handler`, and `vblank_handler` are seeded here too, but with
    /// placeholder parameters: each is genuinely parameterized by
    /// information only known once `Builder` has walked the game's scenes
    /// (the initial scene's label; whether `render_entities`/`render_sprites`
    /// ended up placed at all). `Builder` re-adds the fully-parameterized
    /// instance under the same label — `add_code_block` is idempotent by
    /// label — before taking it out for placement, so every built-in still
    /// round-trips through this registry exactly like the rest.
    pub fn new() -> Self {
        let mut registry = Self::default();
        for var in ZeroPageVar::builtins() {
            registry.add_code_block(Box::new(var));
        }
        registry.add_code_block(Box::new(LoadScene::new()));
        registry.add_code_block(Box::new(RenderEntities::new()));
        registry.add_code_block(Box::new(RenderSprites::new()));
        registry.add_code_block(Box::new(Preamble::new(String::new())));
        registry.add_code_block(Box::new(UpdateHandler::new(None)));
        registry.add_code_block(Box::new(VblankHandler::new(None)));
        registry
    }

    /// Derive one data block per asset and per entity in `game`.
    pub fn add_game(&mut self, game: &Game, labels: &LabelRegistry) -> BuildResult<()> {
        for asset in game.assets() {
            let label = labels.get_asset_label(asset.id())?.to_string();
            let block: Box<dyn CodeBlock> = match asset {
                Asset::Palette(p) => Box::new(PaletteData::new(label, &p.sub_palettes)),
                Asset::SpriteSet(s) => match s.kind {
                    SpriteSetKind::Static => Box::new(SpriteSetCHRData::new(label, s.chr.clone())),
                    SpriteSetKind::Animated => {
                        return Err(BuildError::UnsupportedAssetKind(format!(
                            "{label}: animated sprite sets are not yet emitted"
                        )))
                    }
                },
            };
            self.add_code_block(block);
        }
        for entity in game.entities() {
            let label = labels.get_entity_label(entity.id)?.to_string();
            let spriteset_label = entity
                .data
                .spriteset
                .map(|id| labels.get_asset_label(id))
                .transpose()?
                .map(str::to_string);
            self.add_code_block(Box::new(EntityData::new(
                label,
                entity.data.x,
                entity.data.y,
                spriteset_label,
                entity.data.palette_index,
            )));
        }
        Ok(())
    }

    /// Insert a block, replacing any earlier block registered under the same label.
    pub fn add_code_block(&mut self, block: Box<dyn CodeBlock>) {
        self.blocks.insert(block.label().to_string(), block);
    }

    pub fn contains(&self, label: &str) -> bool {
        self.blocks.contains_key(label)
    }

    /// Remove and return the block registered under `label`. Ownership
    /// transfers to the caller (the dependency walk, which places it into
    /// the ROM exactly once), so a label can only be taken a single time.
    pub fn take(&mut self, label: &str) -> BuildResult<Box<dyn CodeBlock>> {
        self.blocks
            .remove(label)
            .ok_or_else(|| BuildError::UnknownLabel(label.to_string()))
    }
}
