//! Serializable debug views of entities and rosters.
//!
//! Components are type-erased, so a snapshot records names rather than
//! values: the entity's name and the sorted key names of its components.
//! Snapshots are for inspection and logging only; there is no restore path.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::roster::EntityRoster;

/// Point-in-time summary of a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// The entity's name at capture time.
    pub name: String,
    /// Key names of the stored components, sorted for deterministic output.
    pub components: Vec<String>,
}

/// Point-in-time summary of a roster, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// One summary per entity aboard.
    pub entities: Vec<EntitySnapshot>,
}

impl Entity {
    /// Capture a serializable summary of this entity.
    ///
    /// ```
    /// use brume_entity::prelude::*;
    ///
    /// struct Health(u32);
    ///
    /// let entity = Entity::named("scout").with(Health(7));
    /// let snapshot = entity.snapshot();
    /// assert_eq!(snapshot.name, "scout");
    /// assert_eq!(snapshot.components.len(), 1);
    /// ```
    pub fn snapshot(&self) -> EntitySnapshot {
        let mut components: Vec<String> = self.keys().map(|key| key.name().to_owned()).collect();
        components.sort_unstable();
        EntitySnapshot {
            name: self.name().to_owned(),
            components,
        }
    }
}

impl EntityRoster {
    /// Capture a serializable summary of every entity, in list order.
    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            entities: self.iter().map(Entity::snapshot).collect(),
        }
    }
}
