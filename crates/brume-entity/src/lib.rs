//! Brume Entity -- name-identified entities with type-keyed component storage.
//!
//! This crate provides the component-storage core of an entity-component
//! data model. An [`Entity`](entity::Entity) couples a human-meaningful
//! name with a dynamically-typed collection of components, each stored
//! under a [`TypeKey`](key::TypeKey) resolved from the call-site type with
//! zero runtime reflection and nothing to implement on component types.
//! Mutations broadcast synchronously to per-entity observers, and an
//! [`EntityRoster`](roster::EntityRoster) owns entities, preserves
//! insertion order through their intrusive links, and indexes them by name.
//!
//! # Quick Start
//!
//! ```
//! use brume_entity::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! trait Renderer { fn layer(&self) -> u8; }
//!
//! struct Sprite { layer: u8 }
//! impl Renderer for Sprite { fn layer(&self) -> u8 { self.layer } }
//!
//! let mut entity = Entity::named("player");
//! entity
//!     .add(Position { x: 0.0, y: 0.0 })
//!     .add_as::<dyn Renderer>(Box::new(Sprite { layer: 1 }));
//!
//! assert_eq!(entity.get::<Position>(), Some(&Position { x: 0.0, y: 0.0 }));
//! assert_eq!(entity.get_as::<dyn Renderer>().map(|r| r.layer()), Some(1));
//!
//! let mut roster = EntityRoster::new();
//! roster.add(entity).ok().unwrap();
//! assert!(roster.contains("player"));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod events;
pub mod key;
pub mod roster;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity containers.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// A roster already holds an entity with this name. The rejected entity
    /// rides back inside the error, so the caller keeps ownership.
    #[error("an entity named '{}' is already on the roster", .entity.name())]
    NameInUse {
        entity: entity::Entity,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::Component;
    pub use crate::entity::{Components, Entity, EntitySlot};
    pub use crate::events::{EntityChange, Subscription};
    pub use crate::key::TypeKey;
    pub use crate::roster::EntityRoster;
    pub use crate::snapshot::{EntitySnapshot, RosterSnapshot};
    pub use crate::EntityError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::prelude::*;

    // -- test component types -----------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    trait Renderer {
        fn layer(&self) -> u8;
    }

    struct Sprite {
        layer: u8,
    }

    impl Renderer for Sprite {
        fn layer(&self) -> u8 {
            self.layer
        }
    }

    /// Subscribe a recording observer and hand back the shared log.
    fn record_changes(entity: &mut Entity) -> Rc<RefCell<Vec<EntityChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        entity.observe(move |_, change| sink.borrow_mut().push(change.clone()));
        log
    }

    // -- one component per key ----------------------------------------------

    #[test]
    fn one_instance_per_type_key() {
        let mut entity = Entity::new();
        entity.add(Health(1));
        entity.add(Velocity { dx: 0.0, dy: 0.0 });
        entity.add(Health(2));

        assert_eq!(entity.len(), 2);
        assert_eq!(entity.get::<Health>(), Some(&Health(2)));
        assert_eq!(
            entity.get::<Velocity>(),
            Some(&Velocity { dx: 0.0, dy: 0.0 })
        );
    }

    #[test]
    fn replace_notifies_removal_then_addition() {
        let mut entity = Entity::new();
        let log = record_changes(&mut entity);
        let key = TypeKey::of::<Health>();

        entity.add(Health(1));
        entity.add(Health(2));

        assert_eq!(
            log.borrow().as_slice(),
            [
                EntityChange::ComponentAdded { key },
                EntityChange::ComponentRemoved { key },
                EntityChange::ComponentAdded { key },
            ]
        );
    }

    #[test]
    fn absent_component_access_is_silent() {
        let mut entity = Entity::new();
        let log = record_changes(&mut entity);

        assert_eq!(entity.get::<Position>(), None);
        assert_eq!(entity.remove::<Position>(), None);
        assert!(!entity.has::<Position>());
        assert!(log.borrow().is_empty());
    }

    // -- alias storage -------------------------------------------------------

    #[test]
    fn component_stored_under_alias_resolves_by_alias() {
        let mut entity = Entity::new();
        entity.add_as::<dyn Renderer>(Box::new(Sprite { layer: 5 }));

        assert_eq!(entity.get_as::<dyn Renderer>().map(|r| r.layer()), Some(5));
        assert!(entity.has::<dyn Renderer>());
        assert!(entity.get::<Sprite>().is_none());
        assert!(!entity.has::<Sprite>());
    }

    #[test]
    fn alias_events_carry_the_alias_key() {
        let mut entity = Entity::new();
        let log = record_changes(&mut entity);
        let key = TypeKey::of::<dyn Renderer>();

        entity.add_as::<dyn Renderer>(Box::new(Sprite { layer: 1 }));
        let boxed = entity.remove_as::<dyn Renderer>();

        assert!(boxed.is_some());
        assert_eq!(
            log.borrow().as_slice(),
            [
                EntityChange::ComponentAdded { key },
                EntityChange::ComponentRemoved { key },
            ]
        );
    }

    // -- renaming ------------------------------------------------------------

    #[test]
    fn rename_event_carries_the_previous_name() {
        let mut entity = Entity::named("before");
        let log = record_changes(&mut entity);

        entity.rename("after");

        assert_eq!(entity.name(), "after");
        assert_eq!(
            log.borrow().as_slice(),
            [EntityChange::Renamed {
                previous: "before".to_owned()
            }]
        );
    }

    #[test]
    fn listener_sees_the_new_name_during_dispatch() {
        let mut entity = Entity::named("old");
        let observed = Rc::new(Cell::new(false));
        {
            let observed = Rc::clone(&observed);
            entity.observe(move |entity, change| {
                if let EntityChange::Renamed { previous } = change {
                    assert_eq!(previous, "old");
                    assert_eq!(entity.name(), "new");
                    observed.set(true);
                }
            });
        }
        entity.rename("new");
        assert!(observed.get());
    }

    #[test]
    fn redundant_rename_emits_nothing() {
        let mut entity = Entity::named("steady");
        let log = record_changes(&mut entity);
        entity.rename("steady");
        assert!(log.borrow().is_empty());
        assert_eq!(entity.name(), "steady");
    }

    // -- auto-naming ---------------------------------------------------------

    #[test]
    fn auto_names_never_collide() {
        let names: std::collections::HashSet<String> =
            (0..128).map(|_| Entity::new().name().to_owned()).collect();
        assert_eq!(names.len(), 128);
        assert!(names.iter().all(|n| n.starts_with("_entity")));
    }

    // -- chaining ------------------------------------------------------------

    #[test]
    fn adds_chain_in_both_forms() {
        let by_ref = {
            let mut entity = Entity::named("a");
            entity
                .add(Position { x: 1.0, y: 2.0 })
                .add(Velocity { dx: 3.0, dy: 4.0 })
                .add(Health(5));
            entity
        };
        let by_value = Entity::named("b")
            .with(Position { x: 1.0, y: 2.0 })
            .with(Velocity { dx: 3.0, dy: 4.0 })
            .with(Health(5));

        for entity in [&by_ref, &by_value] {
            assert_eq!(entity.len(), 3);
            assert_eq!(entity.get::<Health>(), Some(&Health(5)));
        }
    }

    // -- component iteration -------------------------------------------------

    #[test]
    fn components_iterates_exactly_the_stored_set() {
        let mut entity = Entity::new();
        entity.add(Position { x: 0.0, y: 0.0 });
        entity.add(Health(9));
        entity.add_as::<dyn Renderer>(Box::new(Sprite { layer: 2 }));
        entity.remove::<Position>();

        let seen: std::collections::HashSet<TypeKey> =
            entity.components().map(|(key, _)| key).collect();
        let expected: std::collections::HashSet<TypeKey> = entity.keys().collect();
        assert_eq!(seen, expected);
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&TypeKey::of::<Health>()));
        assert!(seen.contains(&TypeKey::of::<dyn Renderer>()));
    }

    // -- observers -----------------------------------------------------------

    #[test]
    fn observers_run_in_registration_order() {
        let mut entity = Entity::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            entity.observe(move |_, _| log.borrow_mut().push(tag));
        }

        entity.add(Health(1));
        assert_eq!(log.borrow().as_slice(), ["first", "second", "third"]);
    }

    #[test]
    fn cancelling_mid_dispatch_silences_later_listeners() {
        let mut entity = Entity::new();
        let second_handle: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let second_ran = Rc::new(Cell::new(0));

        {
            let second_handle = Rc::clone(&second_handle);
            entity.observe(move |_, _| {
                if let Some(handle) = second_handle.borrow().as_ref() {
                    handle.cancel();
                }
            });
        }
        {
            let second_ran = Rc::clone(&second_ran);
            let handle = entity.observe(move |_, _| second_ran.set(second_ran.get() + 1));
            *second_handle.borrow_mut() = Some(handle);
        }

        entity.add(Health(1));
        assert_eq!(second_ran.get(), 0);
        assert_eq!(entity.observer_count(), 1);
    }

    #[test]
    fn dropping_the_handle_keeps_observing() {
        let mut entity = Entity::new();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = Rc::clone(&hits);
            let handle = entity.observe(move |_, _| hits.set(hits.get() + 1));
            drop(handle);
        }
        entity.add(Health(1));
        assert_eq!(hits.get(), 1);
        assert_eq!(entity.observer_count(), 1);
    }

    // -- roster flow ---------------------------------------------------------

    #[test]
    fn roster_keeps_entities_addressable_through_renames() {
        let mut roster = EntityRoster::new();
        roster
            .add(Entity::named("hero").with(Health(10)))
            .ok()
            .unwrap();
        roster
            .add(Entity::named("sidekick").with(Health(5)))
            .ok()
            .unwrap();

        roster.get_mut("hero").unwrap().rename("champion");
        roster.get_mut("champion").unwrap().add(Position { x: 1.0, y: 1.0 });

        assert!(!roster.contains("hero"));
        let champion = roster.get("champion").unwrap();
        assert_eq!(champion.get::<Health>(), Some(&Health(10)));
        assert_eq!(champion.get::<Position>(), Some(&Position { x: 1.0, y: 1.0 }));

        let order: Vec<&str> = roster.iter().map(Entity::name).collect();
        assert_eq!(order, ["champion", "sidekick"]);
    }

    #[test]
    fn duplicate_add_hands_the_entity_back() {
        let mut roster = EntityRoster::new();
        roster.add(Entity::named("only")).ok().unwrap();

        let result = roster.add(Entity::named("only").with(Health(3)));
        let EntityError::NameInUse { entity } = result.unwrap_err();
        assert_eq!(entity.get::<Health>(), Some(&Health(3)));

        // Rename the rejected entity and try again.
        let mut entity = entity;
        entity.rename("second");
        roster.add(entity).ok().unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn snapshots_are_deterministic_and_serializable() {
        let mut roster = EntityRoster::new();
        roster
            .add(Entity::named("alpha").with(Health(1)).with(Position { x: 0.0, y: 0.0 }))
            .ok()
            .unwrap();
        roster.add(Entity::named("beta")).ok().unwrap();

        let first = roster.snapshot();
        let second = roster.snapshot();
        assert_eq!(first, second);

        let json = serde_json::to_string(&first).unwrap();
        let back: RosterSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, first);

        assert_eq!(back.entities[0].name, "alpha");
        assert_eq!(back.entities[0].components.len(), 2);
        assert!(back.entities[1].components.is_empty());
    }

    // -- scale ---------------------------------------------------------------

    #[test]
    fn scale_1k_roster_entities() {
        let mut roster = EntityRoster::new();
        for i in 0..1_000u32 {
            roster
                .add(Entity::named(format!("unit-{i}")).with(Health(i)))
                .ok()
                .unwrap();
        }
        assert_eq!(roster.len(), 1_000);
        assert_eq!(roster.iter().count(), 1_000);

        // Remove every even-numbered entity.
        for i in (0..1_000u32).step_by(2) {
            roster.remove(&format!("unit-{i}")).unwrap();
        }
        assert_eq!(roster.len(), 500);

        // The odd ones remain, in insertion order.
        let mut expected = 1u32;
        for entity in roster.iter() {
            assert_eq!(entity.name(), format!("unit-{expected}"));
            assert_eq!(entity.get::<Health>(), Some(&Health(expected)));
            expected += 2;
        }
    }
}
