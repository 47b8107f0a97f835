// Interpretation Entity Schemas - oracle interpretation sets and their options
// Interpretations reference their set through `set_id`, not the conventional
// `interpretation_set_id`

use crate::core::EntityType;
use crate::ent_framework::{
    EdgeDefinition, EntSchema, FieldDefinition, FilterCondition, PropertyConfig,
    PropertyDefinition,
};
use crate::entity_type;

pub struct InterpretationSetSchema;

impl EntSchema for InterpretationSetSchema {
    fn entity_type() -> EntityType {
        entity_type!("interpretation_set")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::foreign_key("scene_id", "scenes"),
            FieldDefinition::string("context"),
            FieldDefinition::string("oracle_results").optional(),
            FieldDefinition::int("retry_attempt").default_value(0),
            FieldDefinition::bool("is_current").default_value(false),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![
            EdgeDefinition::from("scene", entity_type!("scene")),
            EdgeDefinition::to("interpretations", entity_type!("interpretation")).foreign_key("set_id"),
        ]
    }

    fn properties() -> Vec<PropertyDefinition> {
        vec![
            PropertyDefinition::new(
                "interpretations",
                PropertyConfig::existence(entity_type!("interpretation"), "set_id"),
            ),
            PropertyDefinition::new(
                "interpretation",
                PropertyConfig::direct_count(entity_type!("interpretation"), "set_id")
                    .relationship("interpretations"),
            ),
            PropertyDefinition::new(
                "selected_interpretation",
                PropertyConfig::filtered_count(
                    entity_type!("interpretation"),
                    "set_id",
                    FilterCondition::equals("is_selected", true),
                )
                .relationship("interpretations"),
            ),
            PropertyDefinition::new(
                "selection",
                PropertyConfig::filtered_relationship_status(
                    entity_type!("interpretation"),
                    "set_id",
                    "is_selected",
                    true,
                )
                .relationship("interpretations")
                .named("has_selection"),
            ),
        ]
    }
}

pub struct InterpretationSchema;

impl EntSchema for InterpretationSchema {
    fn entity_type() -> EntityType {
        entity_type!("interpretation")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::foreign_key("set_id", "interpretation_sets"),
            FieldDefinition::string("title"),
            FieldDefinition::string("description").optional(),
            FieldDefinition::bool("is_selected").default_value(false),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![
            EdgeDefinition::from("interpretation_set", entity_type!("interpretation_set")),
            EdgeDefinition::to("events", entity_type!("event")),
        ]
    }

    fn properties() -> Vec<PropertyDefinition> {
        vec![
            PropertyDefinition::new(
                "events",
                PropertyConfig::existence(entity_type!("event"), "interpretation_id"),
            ),
            PropertyDefinition::new(
                "event",
                PropertyConfig::direct_count(entity_type!("event"), "interpretation_id")
                    .relationship("events"),
            ),
        ]
    }
}
