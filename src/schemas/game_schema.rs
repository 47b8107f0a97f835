// Game Entity Schema - root of the journal hierarchy
// Demonstrates existence, counting and status properties reaching through acts into scenes

use crate::ent_framework::{
    Condition, EdgeDefinition, EntSchema, FieldDefinition, FilterCondition, PropertyConfig,
    PropertyDefinition,
};
use crate::core::EntityType;
use crate::entity_type;

pub struct GameSchema;

impl EntSchema for GameSchema {
    fn entity_type() -> EntityType {
        entity_type!("game")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::string("name").unique(),
            FieldDefinition::string("description").optional(),
            FieldDefinition::bool("is_active").default_value(false),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![EdgeDefinition::to("acts", entity_type!("act"))]
    }

    fn properties() -> Vec<PropertyDefinition> {
        vec![
            // has_acts
            PropertyDefinition::new("acts", PropertyConfig::existence(entity_type!("act"), "game_id")),
            // act_count
            PropertyDefinition::new(
                "act",
                PropertyConfig::direct_count(entity_type!("act"), "game_id").relationship("acts"),
            ),
            // scene_count: game -> acts -> scenes
            PropertyDefinition::new(
                "scene",
                PropertyConfig::cross_table_count(entity_type!("scene"), "act_id", &["acts", "scenes"]),
            ),
            // completed_act_count
            PropertyDefinition::new(
                "completed_act",
                PropertyConfig::filtered_count(
                    entity_type!("act"),
                    "game_id",
                    FilterCondition::equals("status", "completed"),
                )
                .relationship("acts"),
            ),
            // has_active_act
            PropertyDefinition::new(
                "act",
                PropertyConfig::filtered_relationship_status(
                    entity_type!("act"),
                    "game_id",
                    "is_active",
                    true,
                )
                .relationship("acts"),
            ),
            // has_active_scene
            PropertyDefinition::new(
                "scene",
                PropertyConfig::cross_table_status(
                    entity_type!("scene"),
                    &["acts", "scenes"],
                    "status",
                    Condition::equals("active"),
                ),
            ),
        ]
    }
}
