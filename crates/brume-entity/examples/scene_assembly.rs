//! Assemble a small scene on a roster and watch it change.
//!
//! Run with:
//!   cargo run --example scene_assembly -p brume-entity
//!
//! Set RUST_LOG=debug to also see the roster's own bookkeeping events.

use brume_entity::prelude::*;

// ---------------------------------------------------------------------------
// Scene components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Health(u32);

trait Renderer {
    fn describe(&self) -> String;
}

struct Sprite {
    sheet: &'static str,
    frame: u16,
}

impl Renderer for Sprite {
    fn describe(&self) -> String {
        format!("sprite {}#{}", self.sheet, self.frame)
    }
}

struct Glyph(char);

impl Renderer for Glyph {
    fn describe(&self) -> String {
        format!("glyph '{}'", self.0)
    }
}

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut roster = EntityRoster::new();

    // The player carries a concrete renderer filed under the trait, so the
    // scene can draw it without knowing the concrete type.
    let player = Entity::named("player")
        .with(Position { x: 4.0, y: 8.0 })
        .with(Health(100))
        .with_as::<dyn Renderer>(Box::new(Sprite {
            sheet: "hero.png",
            frame: 0,
        }));
    roster.add(player).expect("first use of the name");

    roster
        .add(
            Entity::named("lantern")
                .with(Position { x: 6.0, y: 8.0 })
                .with_as::<dyn Renderer>(Box::new(Glyph('*'))),
        )
        .expect("first use of the name");

    // Every change to the player is logged as it happens.
    roster
        .get_mut("player")
        .expect("player was just added")
        .observe(|entity, change| {
            tracing::info!(entity = %entity.name(), ?change, "entity changed");
        });

    // Replacing a component emits a removal followed by an addition.
    roster.get_mut("player").expect("player is aboard").add(Health(85));

    // Duplicate names bounce back with the entity still intact.
    match roster.add(Entity::named("lantern").with_as::<dyn Renderer>(Box::new(Glyph('!')))) {
        Ok(_) => unreachable!("the name is taken"),
        Err(EntityError::NameInUse { entity }) => {
            tracing::warn!(name = %entity.name(), "name already taken -- renaming");
            let mut entity = entity;
            entity.rename("spare lantern");
            roster.add(entity).expect("renamed to a fresh name");
        }
    }

    // Renaming in place re-indexes the roster automatically.
    roster
        .get_mut("player")
        .expect("player is aboard")
        .rename("hero");
    assert!(roster.contains("hero") && !roster.contains("player"));

    // Draw pass: every entity with a renderer describes itself.
    for entity in roster.iter() {
        if let Some(renderer) = entity.get_as::<dyn Renderer>() {
            println!("{:12} -> {}", entity.name(), renderer.describe());
        }
    }

    println!("{}", serde_json::to_string_pretty(&roster.snapshot())?);
    Ok(())
}
