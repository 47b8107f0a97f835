use std::collections::BTreeMap;

use tracing::info;

use crate::{
    core::{EntityId, Value},
    entity_type,
    error::AppResult,
    infrastructure::SqliteStore,
};

/// Event source names inserted into the `event_sources` lookup table
pub const EVENT_SOURCES: [&str; 3] = ["manual", "oracle", "dice"];

/// Ids of the rows created by [`seed_sample_game`]
#[derive(Debug, Clone)]
pub struct SeededGame {
    pub game: EntityId,
    pub acts: Vec<EntityId>,
    pub scenes: Vec<EntityId>,
    pub sources: BTreeMap<String, EntityId>,
}

/// Insert the event source lookup rows, returning their ids by name.
pub async fn seed_event_sources(store: &SqliteStore) -> AppResult<BTreeMap<String, EntityId>> {
    let mut sources = BTreeMap::new();
    for name in EVENT_SOURCES {
        let id = store
            .insert(&entity_type!("event_source"), &[("name", Value::from(name))])
            .await?;
        sources.insert(name.to_string(), id);
    }
    Ok(sources)
}

/// Seed one game: a completed first act and an active second act, with events, dice rolls and
/// an interpretation set spread over three scenes (the last one empty).
pub async fn seed_sample_game(store: &SqliteStore) -> AppResult<SeededGame> {
    let sources = seed_event_sources(store).await?;
    let source = |name: &str| Value::from(sources.get(name).copied());

    let game = store
        .insert(
            &entity_type!("game"),
            &[
                ("name", "The Lighthouse".into()),
                ("description", "A keeper, a storm and a missing ship".into()),
                ("is_active", true.into()),
            ],
        )
        .await?;

    let first_act = store
        .insert(
            &entity_type!("act"),
            &[
                ("game_id", game.into()),
                ("sequence", 1.into()),
                ("title", "Arrival".into()),
                ("status", "completed".into()),
            ],
        )
        .await?;
    let second_act = store
        .insert(
            &entity_type!("act"),
            &[
                ("game_id", game.into()),
                ("sequence", 2.into()),
                ("title", "The Storm".into()),
                ("is_active", true.into()),
            ],
        )
        .await?;

    let landing = store
        .insert(
            &entity_type!("scene"),
            &[
                ("act_id", first_act.into()),
                ("sequence", 1.into()),
                ("title", "Landing at the rocks".into()),
                ("status", "completed".into()),
            ],
        )
        .await?;
    let tower = store
        .insert(
            &entity_type!("scene"),
            &[
                ("act_id", second_act.into()),
                ("sequence", 1.into()),
                ("title", "Climbing the tower".into()),
                ("is_active", true.into()),
            ],
        )
        .await?;
    let cellar = store
        .insert(
            &entity_type!("scene"),
            &[
                ("act_id", second_act.into()),
                ("sequence", 2.into()),
                ("title", "The flooded cellar".into()),
            ],
        )
        .await?;

    store
        .insert(
            &entity_type!("event"),
            &[
                ("scene_id", landing.into()),
                ("description", "The boat scrapes against the rocks".into()),
                ("source_id", source("manual")),
            ],
        )
        .await?;
    store
        .insert(
            &entity_type!("event"),
            &[
                ("scene_id", landing.into()),
                ("description", "Spotted a light in the tower window".into()),
                ("source_id", source("dice")),
            ],
        )
        .await?;
    store
        .insert(
            &entity_type!("dice_roll"),
            &[
                ("scene_id", landing.into()),
                ("notation", "1d20".into()),
                ("result", 14.into()),
                ("reason", "Perception".into()),
            ],
        )
        .await?;

    let set = store
        .insert(
            &entity_type!("interpretation_set"),
            &[
                ("scene_id", tower.into()),
                ("context", "Who lit the lamp?".into()),
                ("is_current", true.into()),
            ],
        )
        .await?;
    store
        .insert(
            &entity_type!("interpretation"),
            &[("set_id", set.into()), ("title", "The old keeper never left".into())],
        )
        .await?;
    let chosen = store
        .insert(
            &entity_type!("interpretation"),
            &[
                ("set_id", set.into()),
                ("title", "A smuggler's signal".into()),
                ("is_selected", true.into()),
            ],
        )
        .await?;
    store
        .insert(
            &entity_type!("event"),
            &[
                ("scene_id", tower.into()),
                ("description", "Crates of contraband under the stairs".into()),
                ("source_id", source("oracle")),
                ("interpretation_id", chosen.into()),
            ],
        )
        .await?;
    store
        .insert(
            &entity_type!("dice_roll"),
            &[
                ("scene_id", tower.into()),
                ("notation", "1d20".into()),
                ("result", 3.into()),
            ],
        )
        .await?;

    info!(
        "Seeded game {} with 2 acts, 3 scenes and {} event sources",
        game,
        sources.len()
    );

    Ok(SeededGame {
        game,
        acts: vec![first_act, second_act],
        scenes: vec![landing, tower, cellar],
        sources,
    })
}
