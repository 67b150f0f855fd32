//! An owning, ordered, name-indexed container of entities.
//!
//! The roster stores entities in slab-style slots and threads the insertion
//! order through each entity's `previous`/`next` links, so iteration walks
//! the list without touching empty slots. A name index maps each entity's
//! name to its slot; the roster keeps the index live by subscribing to every
//! entity's rename events, so renaming an entity in place through
//! [`get_mut`](EntityRoster::get_mut) re-indexes it automatically.
//!
//! Slot handles are generational: freeing a slot bumps its generation, so a
//! handle held past its entity's removal goes stale instead of resolving to
//! whatever entity recycles the index.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::entity::{Entity, EntitySlot};
use crate::events::{EntityChange, Subscription};
use crate::EntityError;

type NameIndex = Rc<RefCell<HashMap<String, EntitySlot>>>;

// ---------------------------------------------------------------------------
// EntityRoster
// ---------------------------------------------------------------------------

struct RosterEntry {
    entity: Entity,
    /// Rename watcher keeping the name index current; cancelled on removal.
    watch: Subscription,
}

/// Owning container of entities with unique names and stable insertion
/// order.
///
/// ```
/// use brume_entity::prelude::*;
///
/// struct Health(u32);
///
/// let mut roster = EntityRoster::new();
/// roster.add(Entity::named("player").with(Health(100))).ok().unwrap();
/// roster.add(Entity::named("boss").with(Health(500))).ok().unwrap();
///
/// assert_eq!(roster.len(), 2);
/// assert!(roster.contains("boss"));
/// assert_eq!(roster.get("player").and_then(|e| e.get::<Health>()).map(|h| h.0), Some(100));
/// ```
pub struct EntityRoster {
    slots: Vec<Option<RosterEntry>>,
    /// Current generation for each index; bumped when the slot is freed.
    generations: Vec<u32>,
    free: Vec<u32>,
    head: Option<EntitySlot>,
    tail: Option<EntitySlot>,
    len: usize,
    /// Shared with the rename watchers, which hold their own `Rc` clones.
    names: NameIndex,
}

impl EntityRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            names: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    // -- membership ---------------------------------------------------------

    /// Take ownership of an entity, appending it to the end of the list.
    ///
    /// Fails with [`EntityError::NameInUse`] when an entity with the same
    /// name is already aboard; the rejected entity rides back inside the
    /// error so the caller keeps ownership.
    pub fn add(&mut self, mut entity: Entity) -> Result<EntitySlot, EntityError> {
        if self.names.borrow().contains_key(entity.name()) {
            return Err(EntityError::NameInUse { entity });
        }

        let slot = match self.free.pop() {
            // A recycled index carries the generation bumped when it was
            // freed, so handles to the previous occupant stay stale.
            Some(index) => EntitySlot::new(index, self.generations[index as usize]),
            None => {
                let index = u32::try_from(self.slots.len()).expect("slot index fits in u32");
                self.slots.push(None);
                self.generations.push(0);
                EntitySlot::new(index, 0)
            }
        };

        // Splice onto the tail of the intrusive list.
        entity.previous = self.tail;
        entity.next = None;
        if let Some(tail) = self.tail {
            if let Some(entry) = self.entry_mut(tail) {
                entry.entity.next = Some(slot);
            }
        }
        self.tail = Some(slot);
        if self.head.is_none() {
            self.head = Some(slot);
        }

        let watch = watch_renames(&mut entity, &self.names, slot);
        self.names
            .borrow_mut()
            .insert(entity.name().to_owned(), slot);
        self.slots[slot.index() as usize] = Some(RosterEntry { entity, watch });
        self.len += 1;
        Ok(slot)
    }

    /// Remove the entity with this name, returning it with its links
    /// cleared. Its components and observers survive removal untouched.
    pub fn remove(&mut self, name: &str) -> Option<Entity> {
        let slot = self.names.borrow().get(name).copied()?;
        self.detach(slot)
    }

    /// Remove the entity stored at this slot.
    ///
    /// A stale handle, one whose entity already left the roster, removes
    /// nothing even when the index has been recycled.
    pub fn remove_at(&mut self, slot: EntitySlot) -> Option<Entity> {
        self.detach(slot)
    }

    /// Remove every entity. Watchers are cancelled and the slots recycled.
    pub fn clear(&mut self) {
        let removed = self.len;
        while let Some(head) = self.head {
            if self.detach(head).is_none() {
                break;
            }
        }
        tracing::debug!(removed, "roster cleared");
    }

    // -- lookup -------------------------------------------------------------

    /// Borrow the entity with this name.
    ///
    /// Resolves through the name index: when a rename collision displaced
    /// an older mapping, the name finds the entity that claimed it last.
    pub fn get(&self, name: &str) -> Option<&Entity> {
        let slot = self.slot_of(name)?;
        self.entity(slot)
    }

    /// Mutably borrow the entity with this name.
    ///
    /// Renaming through the returned reference re-indexes the entity; the
    /// old name stops resolving and the new one starts.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        let slot = self.slot_of(name)?;
        self.entity_mut(slot)
    }

    /// Whether an entity with this name is indexed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.borrow().contains_key(name)
    }

    /// The slot currently indexed under this name.
    pub fn slot_of(&self, name: &str) -> Option<EntitySlot> {
        self.names.borrow().get(name).copied()
    }

    /// Borrow the entity stored at this slot. Stale handles resolve to
    /// `None`.
    pub fn entity(&self, slot: EntitySlot) -> Option<&Entity> {
        self.entry(slot).map(|entry| &entry.entity)
    }

    /// Mutably borrow the entity stored at this slot. Stale handles resolve
    /// to `None`.
    pub fn entity_mut(&mut self, slot: EntitySlot) -> Option<&mut Entity> {
        self.entry_mut(slot).map(|entry| &mut entry.entity)
    }

    // -- iteration ----------------------------------------------------------

    /// Iterate over the entities in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            roster: self,
            cursor: self.head,
        }
    }

    /// Number of entities aboard.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the roster is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // -- internals ----------------------------------------------------------

    /// Whether `slot` still names the occupant it was minted for.
    fn is_current(&self, slot: EntitySlot) -> bool {
        self.generations.get(slot.index() as usize).copied() == Some(slot.generation())
    }

    fn entry(&self, slot: EntitySlot) -> Option<&RosterEntry> {
        if !self.is_current(slot) {
            return None;
        }
        self.slots.get(slot.index() as usize)?.as_ref()
    }

    fn entry_mut(&mut self, slot: EntitySlot) -> Option<&mut RosterEntry> {
        if !self.is_current(slot) {
            return None;
        }
        self.slots.get_mut(slot.index() as usize)?.as_mut()
    }

    /// Unlink and surrender the entity at `slot`.
    fn detach(&mut self, slot: EntitySlot) -> Option<Entity> {
        if !self.is_current(slot) {
            return None;
        }
        let mut entry = self.slots.get_mut(slot.index() as usize)?.take()?;
        entry.watch.cancel();

        // Drop the name mapping only if it still points here; a displaced
        // entity's name belongs to whoever claimed it last.
        {
            let mut names = self.names.borrow_mut();
            if names.get(entry.entity.name()).copied() == Some(slot) {
                names.remove(entry.entity.name());
            }
        }

        let previous = entry.entity.previous.take();
        let next = entry.entity.next.take();
        match previous {
            Some(p) => {
                if let Some(neighbor) = self.entry_mut(p) {
                    neighbor.entity.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(neighbor) = self.entry_mut(n) {
                    neighbor.entity.previous = previous;
                }
            }
            None => self.tail = previous,
        }

        // Bump the generation so outstanding handles to this slot go stale
        // before the index is reused.
        let idx = slot.index() as usize;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push(slot.index());
        self.len -= 1;
        Some(entry.entity)
    }
}

impl Default for EntityRoster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityRoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Entity::name).collect();
        f.debug_struct("EntityRoster")
            .field("len", &self.len)
            .field("entities", &names)
            .finish()
    }
}

/// Subscribe the index-maintenance watcher on an entity entering the
/// roster. On every rename the watcher drops the stale mapping and indexes
/// the new name, warning when that displaces another entity's mapping.
fn watch_renames(entity: &mut Entity, names: &NameIndex, slot: EntitySlot) -> Subscription {
    let names = Rc::clone(names);
    entity.observe(move |entity, change| {
        if let EntityChange::Renamed { previous } = change {
            let mut names = names.borrow_mut();
            // The stale mapping is ours to drop only if it still points at
            // this slot; it may already belong to an entity that claimed
            // the name over us.
            if names.get(previous.as_str()).copied() == Some(slot) {
                names.remove(previous.as_str());
            }
            if let Some(displaced) = names.insert(entity.name().to_owned(), slot) {
                tracing::warn!(
                    name = %entity.name(),
                    displaced_slot = %displaced,
                    "rename collides with an indexed entity -- the name now resolves to the renamed one"
                );
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

/// Insertion-order iterator over a roster's entities. See
/// [`EntityRoster::iter`].
pub struct Iter<'a> {
    roster: &'a EntityRoster,
    cursor: Option<EntitySlot>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let entity = self.roster.entity(slot)?;
        self.cursor = entity.next;
        Some(entity)
    }
}

impl<'a> IntoIterator for &'a EntityRoster {
    type Item = &'a Entity;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
