//! The game aggregate: the in-memory description the builder compiles.
//!
//! These types are the concrete stand-in for the "already-assembled
//! in-memory `Game` aggregate" that the real system's HTTP/REST surface and
//! relational store hand to the builder. They carry no persistence or
//! validation logic of their own beyond what the builder needs to trust
//! them (unique names per kind, well-formed asset references); a host
//! embedding this crate is responsible for upholding those invariants
//! before calling [`crate::builder::Builder::build`].

use serde::{Deserialize, Serialize};

/// Opaque 128-bit identity shared by every domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id(pub u128);

/// Target platform for the compiled cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Nes { sprite_size: SpriteSize },
}

/// Sprite dimensions supported by the PPU's OAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteSize {
    #[serde(rename = "8x8")]
    Size8x8,
    #[serde(rename = "8x16")]
    Size8x16,
}

/// A named container of scenes, assets, and entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Id,
    pub name: String,
    pub platform: Platform,
    pub scenes: Vec<Scene>,
    pub assets: Vec<Asset>,
    pub entities: Vec<Entity>,
}

impl Game {
    /// All scenes, in declared order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// All assets, in declared order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// All entities, in declared order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Find a scene by its exact name.
    pub fn find_scene_by_name(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    /// Find an asset by id.
    pub fn find_asset(&self, id: Id) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id() == id)
    }

    /// Find an entity by id.
    pub fn find_entity(&self, id: Id) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// A single screen of the game: a backdrop color, optional palettes, and entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: Id,
    pub name: String,
    pub data: SceneData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneData {
    /// Index into the hardware palette used as the backdrop color (0-63).
    pub background_color: u8,
    /// Palette asset supplying background sub-palettes, if any.
    pub bg_palette_ref: Option<Id>,
    /// Palette asset supplying sprite sub-palettes, if any.
    pub sprite_palette_ref: Option<Id>,
    /// Entities present in this scene, in draw order.
    pub entity_refs: Vec<Id>,
}

/// A reusable resource: either a palette or a sprite sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "asset_type")]
pub enum Asset {
    Palette(PaletteAsset),
    SpriteSet(SpriteSetAsset),
}

impl Asset {
    pub fn id(&self) -> Id {
        match self {
            Asset::Palette(p) => p.id,
            Asset::SpriteSet(s) => s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Asset::Palette(p) => &p.name,
            Asset::SpriteSet(s) => &s.name,
        }
    }
}

/// An ordered list of sub-palettes, each a triple of hardware color indices.
///
/// The backdrop slot is supplied at runtime by the scene's
/// `background_color`, not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteAsset {
    pub id: Id,
    pub name: String,
    pub sub_palettes: Vec<[u8; 3]>,
}

/// A sheet of raw CHR pattern-table tiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteSetAsset {
    pub id: Id,
    pub name: String,
    /// Raw tile bytes; length must be a multiple of 16.
    pub chr: Vec<u8>,
    pub kind: SpriteSetKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteSetKind {
    Static,
    Animated,
}

/// A positioned, optionally-sprited actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: Id,
    pub name: String,
    pub data: EntityData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    pub x: u8,
    pub y: u8,
    /// Sprite-set asset providing this entity's tile, if any.
    pub spriteset: Option<Id>,
    /// Index (0-3) into the sprite palette.
    pub palette_index: u8,
}
