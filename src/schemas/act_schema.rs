// Act Entity Schema - an act groups the scenes of a game
// Most act properties aggregate over scenes and what hangs off them

use crate::core::EntityType;
use crate::ent_framework::{
    Condition, EdgeDefinition, EntSchema, FieldDefinition, FilterCondition, PropertyConfig,
    PropertyDefinition,
};
use crate::entity_type;

pub struct ActSchema;

impl EntSchema for ActSchema {
    fn entity_type() -> EntityType {
        entity_type!("act")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::foreign_key("game_id", "games"),
            FieldDefinition::int("sequence"),
            FieldDefinition::string("title").optional(),
            FieldDefinition::string("summary").optional(),
            FieldDefinition::enumeration("status", &["active", "completed"])
                .default_value("active"),
            FieldDefinition::bool("is_active").default_value(false),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![
            EdgeDefinition::from("game", entity_type!("game")),
            EdgeDefinition::to("scenes", entity_type!("scene")),
        ]
    }

    fn properties() -> Vec<PropertyDefinition> {
        vec![
            PropertyDefinition::new("scenes", PropertyConfig::existence(entity_type!("scene"), "act_id")),
            PropertyDefinition::new(
                "scene",
                PropertyConfig::direct_count(entity_type!("scene"), "act_id").relationship("scenes"),
            ),
            PropertyDefinition::new(
                "event",
                PropertyConfig::cross_table_count(entity_type!("event"), "scene_id", &["scenes", "events"]),
            ),
            PropertyDefinition::new(
                "dice_roll",
                PropertyConfig::cross_table_count(
                    entity_type!("dice_roll"),
                    "scene_id",
                    &["scenes", "dice_rolls"],
                ),
            ),
            // Three hops; the last one joins on the irregular set_id column
            PropertyDefinition::new(
                "interpretation",
                PropertyConfig::cross_table_count(
                    entity_type!("interpretation"),
                    "set_id",
                    &["scenes", "interpretation_sets", "interpretations"],
                ),
            ),
            PropertyDefinition::new(
                "selected_interpretation",
                PropertyConfig::filtered_cross_table_count(
                    entity_type!("interpretation"),
                    "set_id",
                    &["scenes", "interpretation_sets", "interpretations"],
                    FilterCondition::equals("is_selected", true),
                ),
            ),
            // has_active_scene
            PropertyDefinition::new(
                "scene",
                PropertyConfig::field_status(
                    entity_type!("scene"),
                    "act_id",
                    "status",
                    Condition::equals("active"),
                )
                .relationship("scenes"),
            ),
            PropertyDefinition::new(
                "completed_scenes",
                PropertyConfig::field_status(
                    entity_type!("scene"),
                    "act_id",
                    "status",
                    Condition::equals("completed"),
                )
                .relationship("scenes")
                .named("has_completed_scenes"),
            ),
        ]
    }
}
