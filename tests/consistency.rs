mod common;

use common::{int, Fixture};
use derived_ent::{
    core::Value,
    data_seeder::seed_sample_game,
    ent_framework::DerivedValue,
    entity_type,
    query::{EntQuery, Expr, Order},
};

#[tokio::test]
async fn test_empty_graph_law() {
    let fx = Fixture::new().await;
    let game = fx.game("empty").await;
    let act = fx.act(game, "active", false).await;
    let scene = fx.scene(act, "active").await;
    let set = fx.interpretation_set(scene).await;
    let roll = fx.dice_roll(scene, 5, None).await;

    let lonely = fx.game("lonely").await;
    for name in ["has_acts", "has_active_act", "has_active_scene"] {
        assert_eq!(fx.value("game", lonely, name).await, DerivedValue::Bool(false));
    }
    for name in ["act_count", "scene_count", "completed_act_count"] {
        assert_eq!(fx.value("game", lonely, name).await, DerivedValue::Count(0));
    }

    for name in ["has_events", "has_dice_rolls", "has_interpretation_sets", "has_selected_interpretation"] {
        let expected = name == "has_dice_rolls" || name == "has_interpretation_sets";
        assert_eq!(fx.value("scene", scene, name).await, DerivedValue::Bool(expected));
    }
    for name in ["event_count", "interpretation_count", "selected_interpretation_count", "high_roll_count"] {
        assert_eq!(fx.value("scene", scene, name).await, DerivedValue::Count(0));
    }

    assert_eq!(fx.value("interpretation_set", set, "has_interpretations").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("interpretation_set", set, "interpretation_count").await, DerivedValue::Count(0));
    assert_eq!(fx.value("interpretation_set", set, "has_selection").await, DerivedValue::Bool(false));

    // Bare-field status reflects the field itself
    assert_eq!(fx.value("dice_roll", roll, "is_explained").await, DerivedValue::Bool(false));
    let explained = fx.dice_roll(scene, 4, Some("Stealth")).await;
    assert_eq!(fx.value("dice_roll", explained, "is_explained").await, DerivedValue::Bool(true));
}

#[tokio::test]
async fn test_parent_without_children() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;

    assert_eq!(fx.value("act", act, "has_scenes").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("act", act, "scene_count").await, DerivedValue::Count(0));
}

#[tokio::test]
async fn test_one_child_and_filter_on_existence() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let with_scene = fx.act(game, "active", false).await;
    let without_scene = fx.act(game, "active", false).await;
    fx.scene(with_scene, "active").await;

    assert_eq!(fx.value("act", with_scene, "has_scenes").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("act", with_scene, "scene_count").await, DerivedValue::Count(1));
    assert_eq!(fx.value("act", without_scene, "has_scenes").await, DerivedValue::Bool(false));

    let ids = fx.ids_where("act", "has_scenes", |expr| expr.unlabeled()).await;
    assert_eq!(ids, vec![with_scene]);
    let ids = fx.ids_where("act", "has_scenes", |expr| expr.unlabeled().not()).await;
    assert_eq!(ids, vec![without_scene]);
}

#[tokio::test]
async fn test_two_hop_count_sums_across_children() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let busy = fx.scene(act, "active").await;
    fx.scene(act, "active").await;
    for _ in 0..3 {
        fx.event(busy, "manual").await;
    }

    assert_eq!(fx.value("act", act, "event_count").await, DerivedValue::Count(3));
    assert_eq!(fx.value("game", game, "scene_count").await, DerivedValue::Count(2));
}

#[tokio::test]
async fn test_three_hop_count_over_irregular_foreign_key() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let first = fx.scene(act, "active").await;
    let second = fx.scene(act, "active").await;
    let a = fx.interpretation_set(first).await;
    let b = fx.interpretation_set(second).await;
    fx.interpretation(a, false).await;
    fx.interpretation(a, true).await;
    fx.interpretation(b, false).await;

    assert_eq!(fx.value("act", act, "interpretation_count").await, DerivedValue::Count(3));
    assert_eq!(fx.value("act", act, "selected_interpretation_count").await, DerivedValue::Count(1));
    assert_eq!(fx.value("scene", first, "has_selected_interpretation").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("scene", second, "has_selected_interpretation").await, DerivedValue::Bool(false));
}

#[tokio::test]
async fn test_filtered_count_in_where_clause() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let scene = fx.scene(act, "active").await;
    let set = fx.interpretation_set(scene).await;
    fx.interpretation(set, true).await;
    fx.interpretation(set, true).await;
    fx.interpretation(set, false).await;

    assert_eq!(
        fx.value("interpretation_set", set, "selected_interpretation_count").await,
        DerivedValue::Count(2)
    );
    assert_eq!(fx.value("interpretation_set", set, "interpretation_count").await, DerivedValue::Count(3));

    let ids = fx
        .ids_where("interpretation_set", "selected_interpretation_count", |expr| expr.gte(int(2)))
        .await;
    assert_eq!(ids, vec![set]);
    let ids = fx
        .ids_where("interpretation_set", "selected_interpretation_count", |expr| expr.eq(int(1)))
        .await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_filtered_count_with_comparison_operator() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let scene = fx.scene(act, "active").await;
    for result in [3, 10, 17, 20] {
        fx.dice_roll(scene, result, None).await;
    }

    assert_eq!(fx.value("scene", scene, "dice_roll_count").await, DerivedValue::Count(4));
    assert_eq!(fx.value("scene", scene, "high_roll_count").await, DerivedValue::Count(3));
}

#[tokio::test]
async fn test_source_status_follows_lookup_name() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let scene = fx.scene(act, "active").await;
    let event = fx.event(scene, "manual").await;

    assert_eq!(fx.value("event", event, "is_manual").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("event", event, "is_oracle").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("event", event, "is_dice").await, DerivedValue::Bool(false));

    fx.store
        .update_field(&entity_type!("event"), event, "source_id", fx.sources["oracle"].into())
        .await
        .unwrap();
    assert_eq!(fx.value("event", event, "is_manual").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("event", event, "is_oracle").await, DerivedValue::Bool(true));
}

#[tokio::test]
async fn test_source_status_falls_back_to_point_lookup() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let scene = fx.scene(act, "active").await;
    let event = fx.event(scene, "dice").await;

    // A bare row: the source relationship is not loaded
    let bare = fx.store.fetch_row(&entity_type!("event"), event).await.unwrap().unwrap();
    assert!(!bare.is_loaded("source"));
    assert_eq!(fx.registry.evaluate(&bare, "is_dice").unwrap(), DerivedValue::Bool(false));
    assert_eq!(
        fx.registry.evaluate_with_lookup(&bare, "is_dice", &fx.store).await.unwrap(),
        DerivedValue::Bool(true)
    );
    assert_eq!(fx.queried("event", event, "is_dice").await, DerivedValue::Bool(true));
}

#[tokio::test]
async fn test_relationship_and_filtered_relationship_status() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "completed", false).await;
    let scene = fx.scene(act, "completed").await;
    let set = fx.interpretation_set(scene).await;
    let option = fx.interpretation(set, false).await;
    let manual = fx.event(scene, "manual").await;

    assert_eq!(fx.value("game", game, "has_active_act").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("game", game, "has_active_scene").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("game", game, "completed_act_count").await, DerivedValue::Count(1));
    assert_eq!(fx.value("act", act, "has_active_scene").await, DerivedValue::Bool(false));
    assert_eq!(fx.value("act", act, "has_completed_scenes").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("event", manual, "is_from_oracle").await, DerivedValue::Bool(false));

    let active = fx.act(game, "active", true).await;
    fx.scene(active, "active").await;
    fx.store
        .update_field(&entity_type!("interpretation"), option, "is_selected", true.into())
        .await
        .unwrap();
    let oracle = fx
        .store
        .insert(
            &entity_type!("event"),
            &[
                ("scene_id", scene.into()),
                ("description", "from the oracle".into()),
                ("source_id", fx.sources["oracle"].into()),
                ("interpretation_id", option.into()),
            ],
        )
        .await
        .unwrap();

    assert_eq!(fx.value("game", game, "has_active_act").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("game", game, "has_active_scene").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("interpretation_set", set, "has_selection").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("interpretation", option, "event_count").await, DerivedValue::Count(1));
    assert_eq!(fx.value("event", oracle, "is_from_oracle").await, DerivedValue::Bool(true));
}

#[tokio::test]
async fn test_counts_are_monotonic() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let scene = fx.scene(act, "active").await;

    let mut events = Vec::new();
    let mut last = 0;
    for _ in 0..4 {
        events.push(fx.event(scene, "manual").await);
        let count = fx.value("act", act, "event_count").await.as_count().unwrap();
        assert!(count >= last);
        last = count;
    }
    assert_eq!(last, 4);

    for event in events {
        assert!(fx.store.delete(&entity_type!("event"), event).await.unwrap());
        let count = fx.value("scene", scene, "event_count").await.as_count().unwrap();
        assert!(count <= last);
        last = count;
    }
    assert_eq!(last, 0);
}

#[tokio::test]
async fn test_evaluation_is_idempotent() {
    let fx = Fixture::new().await;
    let seeded = seed_sample_game(&fx.store).await.unwrap();

    let game = fx.load("game", seeded.game).await;
    let names: Vec<String> = fx
        .registry
        .properties(&entity_type!("game"))
        .map(|p| p.name().to_string())
        .collect();
    for name in &names {
        let first = fx.registry.evaluate(&game, name).unwrap();
        let second = fx.registry.evaluate(&game, name).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            fx.queried("game", seeded.game, name).await,
            fx.queried("game", seeded.game, name).await
        );
    }
}

#[tokio::test]
async fn test_seeded_game_is_consistent_everywhere() {
    let fx = Fixture::new().await;
    let seeded = seed_sample_game(&fx.store).await.unwrap();

    assert!(fx.assert_all_consistent().await > 0);

    assert_eq!(fx.value("game", seeded.game, "act_count").await, DerivedValue::Count(2));
    assert_eq!(fx.value("game", seeded.game, "scene_count").await, DerivedValue::Count(3));
    assert_eq!(fx.value("game", seeded.game, "completed_act_count").await, DerivedValue::Count(1));
    assert_eq!(fx.value("game", seeded.game, "has_active_act").await, DerivedValue::Bool(true));
    assert_eq!(fx.value("act", seeded.acts[0], "event_count").await, DerivedValue::Count(2));
    assert_eq!(fx.value("act", seeded.acts[1], "selected_interpretation_count").await, DerivedValue::Count(1));
    assert_eq!(fx.value("scene", seeded.scenes[2], "has_events").await, DerivedValue::Bool(false));
}

#[tokio::test]
async fn test_properties_order_and_project_queries() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let quiet = fx.scene(act, "active").await;
    let busy = fx.scene(act, "active").await;
    let medium = fx.scene(act, "active").await;
    for _ in 0..3 {
        fx.event(busy, "manual").await;
    }
    fx.event(medium, "oracle").await;

    let scene = entity_type!("scene");
    let query = EntQuery::new(fx.store.catalog(), &scene).unwrap();
    let owner = query.owner().clone();
    let count = fx.registry.query(&scene, "event_count", &owner).unwrap();
    let query = query
        .select(count.clone())
        .unwrap()
        .order_by(count.unlabeled(), Order::Desc)
        .limit(2);

    let rows = fx.store.fetch(&query).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![busy, medium]);
    assert_eq!(rows[0].get("event_count"), Value::Int(3));
    assert_eq!(rows[1].get("event_count"), Value::Int(1));
    assert!(!ids.contains(&quiet));
}

#[tokio::test]
async fn test_properties_compose_in_filters() {
    let fx = Fixture::new().await;
    let game = fx.game("g").await;
    let act = fx.act(game, "active", false).await;
    let both = fx.scene(act, "active").await;
    let only_events = fx.scene(act, "active").await;
    fx.event(both, "manual").await;
    fx.dice_roll(both, 11, None).await;
    fx.event(only_events, "manual").await;

    let scene = entity_type!("scene");
    let query = EntQuery::new(fx.store.catalog(), &scene).unwrap();
    let owner = query.owner().clone();
    let has_events = fx.registry.query(&scene, "has_events", &owner).unwrap();
    let has_rolls = fx.registry.query(&scene, "has_dice_rolls", &owner).unwrap();
    let query = query.filter(has_events.unlabeled().and(has_rolls.unlabeled()));

    assert_eq!(fx.store.fetch_ids(&query).await.unwrap(), vec![both]);

    let query = EntQuery::new(fx.store.catalog(), &scene)
        .unwrap()
        .filter(Expr::column("owner", "status").eq(Expr::literal("active")));
    assert_eq!(fx.store.fetch_ids(&query).await.unwrap().len(), 2);
}
