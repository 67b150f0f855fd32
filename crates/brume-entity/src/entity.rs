//! The entity: a named, observable container of type-keyed components.
//!
//! An [`Entity`] maps [`TypeKey`]s to component instances, holding at most
//! one instance per key. Components are added and retrieved by naming their
//! type; storing a value under an alias type (usually a trait object) goes
//! through the `_as` access family. Every mutation is broadcast to the
//! entity's observers before the mutating call returns.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::component::{Component, ErasedSlot};
use crate::events::{EntityChange, ObserverSet, Subscription};
use crate::key::TypeKey;

/// Counter behind auto-generated entity names. Process-wide, never reset,
/// so every auto-name is unique for the life of the program.
static NAME_COUNTER: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// EntitySlot
// ---------------------------------------------------------------------------

/// Generational handle to an entity's storage slot inside an
/// [`EntityRoster`](crate::roster::EntityRoster).
///
/// Layout: `[generation: u32 | index: u32]`. The roster bumps a slot's
/// generation every time the index is freed, so a handle kept past its
/// entity's removal goes stale and resolves to `None` instead of aliasing
/// whatever entity recycles the index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntitySlot(u64);

impl EntitySlot {
    /// Construct a slot handle from an index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntitySlot({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A named, observable bag of components keyed by type.
///
/// ```
/// use brume_entity::prelude::*;
///
/// #[derive(Debug, PartialEq)]
/// struct Position { x: f32, y: f32 }
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
///
/// let mut entity = Entity::named("player");
/// entity.add(Position { x: 1.0, y: 2.0 }).add(Health(100));
///
/// assert_eq!(entity.get::<Position>(), Some(&Position { x: 1.0, y: 2.0 }));
/// assert_eq!(entity.remove::<Health>(), Some(Health(100)));
/// assert!(!entity.has::<Health>());
/// ```
pub struct Entity {
    name: String,
    components: HashMap<TypeKey, ErasedSlot>,
    observers: ObserverSet,
    /// Link to the previous entity in a containing roster. The roster owns
    /// these links; the entity only stores them.
    pub previous: Option<EntitySlot>,
    /// Link to the next entity in a containing roster.
    pub next: Option<EntitySlot>,
}

impl Entity {
    /// Create an entity with an auto-generated name (`_entity1`,
    /// `_entity2`, ...).
    pub fn new() -> Self {
        Self::named("")
    }

    /// Create an entity with the given name.
    ///
    /// An empty name falls back to auto-generation, same as
    /// [`Entity::new`].
    pub fn named(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
            name = format!("_entity{n}");
        }
        Self {
            name,
            components: HashMap::new(),
            observers: ObserverSet::new(),
            previous: None,
            next: None,
        }
    }

    // -- identity -----------------------------------------------------------

    /// The entity's current name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity, notifying observers with the previous name.
    ///
    /// The new name is applied before observers run, so a listener reads
    /// the fresh name off the entity while the event carries the old one.
    /// Renaming to the current name is a silent no-op. Unlike construction,
    /// an empty name is applied verbatim rather than auto-generated.
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name == self.name {
            return;
        }
        let previous = std::mem::replace(&mut self.name, name);
        self.notify(EntityChange::Renamed { previous });
    }

    // -- component access ---------------------------------------------------

    /// Add a component, keyed by its own type.
    ///
    /// If something is already filed under that key it is removed first;
    /// observers see a removal followed by an addition. Returns `&mut self`
    /// so adds chain.
    pub fn add<C: Component>(&mut self, component: C) -> &mut Self {
        self.insert_slot(TypeKey::of::<C>(), ErasedSlot::direct(component));
        self
    }

    /// Consuming form of [`add`](Entity::add), for construction chains:
    /// `Entity::named("crate").with(Position { x: 0.0, y: 0.0 })`.
    pub fn with<C: Component>(mut self, component: C) -> Self {
        self.add(component);
        self
    }

    /// Add a boxed component filed under alias type `A`, typically a trait
    /// object.
    ///
    /// ```
    /// use brume_entity::prelude::*;
    ///
    /// trait Renderer {
    ///     fn layer(&self) -> u8;
    /// }
    ///
    /// struct Sprite { layer: u8 }
    ///
    /// impl Renderer for Sprite {
    ///     fn layer(&self) -> u8 { self.layer }
    /// }
    ///
    /// let mut entity = Entity::new();
    /// entity.add_as::<dyn Renderer>(Box::new(Sprite { layer: 3 }));
    ///
    /// assert_eq!(entity.get_as::<dyn Renderer>().map(|r| r.layer()), Some(3));
    /// // Filed under the alias, not the concrete type.
    /// assert!(!entity.has::<Sprite>());
    /// ```
    ///
    /// The unsize coercion at the call site is the compile-time proof that
    /// the concrete type provides `A`; a type that does not implement the
    /// trait will not build. Retrieval pairs with
    /// [`get_as`](Entity::get_as).
    pub fn add_as<A: ?Sized + Component>(&mut self, component: Box<A>) -> &mut Self {
        self.insert_slot(TypeKey::of::<A>(), ErasedSlot::aliased(component));
        self
    }

    /// Consuming form of [`add_as`](Entity::add_as).
    pub fn with_as<A: ?Sized + Component>(mut self, component: Box<A>) -> Self {
        self.add_as(component);
        self
    }

    /// Borrow the component stored under `C`'s key.
    ///
    /// Absence is an ordinary outcome, never an error.
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.components.get(&TypeKey::of::<C>())?.get::<C>()
    }

    /// Mutably borrow the component stored under `C`'s key.
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.get_mut(&TypeKey::of::<C>())?.get_mut::<C>()
    }

    /// Borrow a component through its alias key.
    pub fn get_as<A: ?Sized + Component>(&self) -> Option<&A> {
        self.components.get(&TypeKey::of::<A>())?.get_aliased::<A>()
    }

    /// Mutably borrow a component through its alias key.
    pub fn get_as_mut<A: ?Sized + Component>(&mut self) -> Option<&mut A> {
        self.components
            .get_mut(&TypeKey::of::<A>())?
            .get_aliased_mut::<A>()
    }

    /// Whether anything is filed under `C`'s key.
    ///
    /// Key-only check, equivalent to the matching get returning `Some`.
    pub fn has<C: ?Sized + Component>(&self) -> bool {
        self.components.contains_key(&TypeKey::of::<C>())
    }

    /// Remove and return the component stored under `C`'s key.
    ///
    /// Observers see a removal event after the entry is gone and before
    /// this returns. Removing an absent key is a no-op with no event.
    pub fn remove<C: Component>(&mut self) -> Option<C> {
        let key = TypeKey::of::<C>();
        let slot = self.components.remove(&key)?;
        self.notify(EntityChange::ComponentRemoved { key });
        slot.into_value::<C>().ok()
    }

    /// Remove and return a component through its alias key.
    ///
    /// Pairs with [`add_as`](Entity::add_as): a component stored by value
    /// under the same key is not alias-shaped and is left in place.
    pub fn remove_as<A: ?Sized + Component>(&mut self) -> Option<Box<A>> {
        let key = TypeKey::of::<A>();
        if !self.components.get(&key)?.holds_aliased::<A>() {
            return None;
        }
        let slot = self.components.remove(&key)?;
        self.notify(EntityChange::ComponentRemoved { key });
        slot.into_aliased::<A>().ok()
    }

    /// Iterate over every stored component as `(key, payload)` pairs.
    ///
    /// Payloads stored by value downcast to their own type; payloads filed
    /// under an alias `A` downcast to the `Box<A>` they arrived in. Order
    /// is stable only for the duration of one iteration.
    pub fn components(&self) -> Components<'_> {
        Components {
            inner: self.components.iter(),
        }
    }

    /// Iterate over the keys currently present.
    pub fn keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.components.keys().copied()
    }

    /// Number of components currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the entity holds no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    // -- events -------------------------------------------------------------

    /// Subscribe to this entity's change events.
    ///
    /// Observers run synchronously, in registration order, before the
    /// mutating call returns. The returned handle cancels the
    /// subscription; dropping it does not.
    pub fn observe<F>(&mut self, observer: F) -> Subscription
    where
        F: FnMut(&Entity, &EntityChange) + 'static,
    {
        self.observers.subscribe(Box::new(observer))
    }

    /// Number of live subscriptions, for diagnostics.
    ///
    /// The observer set is detached from the entity while an event is
    /// dispatched, so an observer calling this mid-dispatch reads 0 rather
    /// than the live count.
    pub fn observer_count(&self) -> usize {
        self.observers.live_count()
    }

    // -- internals ----------------------------------------------------------

    /// Replace-then-notify insertion shared by both add families.
    fn insert_slot(&mut self, key: TypeKey, slot: ErasedSlot) {
        if self.components.remove(&key).is_some() {
            self.notify(EntityChange::ComponentRemoved { key });
        }
        self.components.insert(key, slot);
        self.notify(EntityChange::ComponentAdded { key });
    }

    /// The observer list is detached during dispatch so observers can
    /// borrow the entity. They hold `&Entity`, which keeps re-entrant
    /// mutation and mid-dispatch subscription out at compile time.
    fn notify(&mut self, change: EntityChange) {
        let mut observers = std::mem::take(&mut self.observers);
        observers.dispatch(self, &change);
        self.observers = observers;
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.components.keys().map(|k| k.name()).collect();
        keys.sort_unstable();
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("components", &keys)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Components iterator
// ---------------------------------------------------------------------------

/// Iterator over an entity's components. See [`Entity::components`].
pub struct Components<'a> {
    inner: std::collections::hash_map::Iter<'a, TypeKey, ErasedSlot>,
}

impl<'a> Iterator for Components<'a> {
    type Item = (TypeKey, &'a dyn Any);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, slot)| (*key, slot.as_any()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Components<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
