// Scene Entity Schema - scenes collect events, dice rolls and oracle interpretations

use crate::core::EntityType;
use crate::ent_framework::{
    Condition, EdgeDefinition, EntSchema, FieldDefinition, FilterCondition, PropertyConfig,
    PropertyDefinition,
};
use crate::entity_type;

pub struct SceneSchema;

impl EntSchema for SceneSchema {
    fn entity_type() -> EntityType {
        entity_type!("scene")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::foreign_key("act_id", "acts"),
            FieldDefinition::int("sequence"),
            FieldDefinition::string("title"),
            FieldDefinition::string("description").optional(),
            FieldDefinition::enumeration("status", &["active", "completed"])
                .default_value("active"),
            FieldDefinition::bool("is_active").default_value(false),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![
            EdgeDefinition::from("act", entity_type!("act")),
            EdgeDefinition::to("events", entity_type!("event")),
            EdgeDefinition::to("dice_rolls", entity_type!("dice_roll")),
            EdgeDefinition::to("interpretation_sets", entity_type!("interpretation_set")),
        ]
    }

    fn properties() -> Vec<PropertyDefinition> {
        vec![
            PropertyDefinition::new("events", PropertyConfig::existence(entity_type!("event"), "scene_id")),
            PropertyDefinition::new(
                "event",
                PropertyConfig::direct_count(entity_type!("event"), "scene_id").relationship("events"),
            ),
            PropertyDefinition::new(
                "dice_rolls",
                PropertyConfig::existence(entity_type!("dice_roll"), "scene_id"),
            ),
            PropertyDefinition::new(
                "dice_roll",
                PropertyConfig::direct_count(entity_type!("dice_roll"), "scene_id")
                    .relationship("dice_rolls"),
            ),
            PropertyDefinition::new(
                "high_roll",
                PropertyConfig::filtered_count(
                    entity_type!("dice_roll"),
                    "scene_id",
                    FilterCondition::new("result", Condition::greater_or_equal(10)),
                )
                .relationship("dice_rolls"),
            ),
            PropertyDefinition::new(
                "interpretation_sets",
                PropertyConfig::existence(entity_type!("interpretation_set"), "scene_id"),
            ),
            PropertyDefinition::new(
                "interpretation_set",
                PropertyConfig::direct_count(entity_type!("interpretation_set"), "scene_id")
                    .relationship("interpretation_sets"),
            ),
            PropertyDefinition::new(
                "interpretation",
                PropertyConfig::cross_table_count(
                    entity_type!("interpretation"),
                    "set_id",
                    &["interpretation_sets", "interpretations"],
                ),
            ),
            PropertyDefinition::new(
                "selected_interpretation",
                PropertyConfig::filtered_cross_table_count(
                    entity_type!("interpretation"),
                    "set_id",
                    &["interpretation_sets", "interpretations"],
                    FilterCondition::equals("is_selected", true),
                ),
            ),
            PropertyDefinition::new(
                "selected_interpretation",
                PropertyConfig::cross_table_status(
                    entity_type!("interpretation"),
                    &["interpretation_sets", "interpretations"],
                    "is_selected",
                    Condition::equals(true),
                )
                .named("has_selected_interpretation"),
            ),
        ]
    }
}
