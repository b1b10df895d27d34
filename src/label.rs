//! Deterministic mapping from domain identifiers to stable string labels.
//!
//! Labels are the only way code blocks refer to each other before the ROM
//! layout engine has assigned addresses. They are derived once, in a single
//! pass over the [`Game`] aggregate, and are read-only for the rest of the
//! build.

use std::collections::HashMap;

use crate::error::{BuildError, BuildResult};
use crate::game::{Asset, Game, Id};

/// Populated mapping of scene/asset/entity ids to their labels.
#[derive(Debug, Default)]
pub struct LabelRegistry {
    scene_labels: HashMap<Id, String>,
    asset_labels: HashMap<Id, String>,
    entity_labels: HashMap<Id, String>,
    seen: HashMap<String, Id>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate all labels from a game aggregate.
    pub fn add_game(&mut self, game: &Game) -> BuildResult<()> {
        for scene in game.scenes() {
            let label = format!("scene__{}", scene.name);
            self.claim(scene.id, &label)?;
            self.scene_labels.insert(scene.id, label);
        }
        for asset in game.assets() {
            let label = match asset {
                Asset::Palette(p) => format!("asset__palette__{}", p.name),
                Asset::SpriteSet(s) => format!("asset__sprite_set__{}", s.name),
            };
            self.claim(asset.id(), &label)?;
            self.asset_labels.insert(asset.id(), label);
        }
        for entity in game.entities() {
            let label = format!("entity__{}", entity.name);
            self.claim(entity.id, &label)?;
            self.entity_labels.insert(entity.id, label);
        }
        Ok(())
    }

    /// Record that `id` owns `label`, failing if another id already does.
    fn claim(&mut self, id: Id, label: &str) -> BuildResult<()> {
        match self.seen.get(label) {
            Some(existing) if *existing != id => Err(BuildError::DuplicateLabel(label.to_string())),
            Some(_) => Ok(()),
            None => {
                self.seen.insert(label.to_string(), id);
                Ok(())
            }
        }
    }

    pub fn get_scene_label(&self, id: Id) -> BuildResult<&str> {
        self.scene_labels
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| BuildError::UnknownDomainId(format!("scene {}", id.0)))
    }

    pub fn get_asset_label(&self, id: Id) -> BuildResult<&str> {
        self.asset_labels
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| BuildError::UnknownDomainId(format!("asset {}", id.0)))
    }

    pub fn get_entity_label(&self, id: Id) -> BuildResult<&str> {
        self.entity_labels
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| BuildError::UnknownDomainId(format!("entity {}", id.0)))
    }
}
