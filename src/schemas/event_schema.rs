// Event Entity Schema - journal entries, each tagged with the source that produced it
// Source status properties read the name of the referenced event_source row

use crate::core::EntityType;
use crate::ent_framework::{
    Condition, EdgeDefinition, EntSchema, FieldDefinition, PropertyConfig, PropertyDefinition,
};
use crate::entity_type;

/// Lookup table of event origins ("manual", "oracle", "dice")
pub struct EventSourceSchema;

impl EntSchema for EventSourceSchema {
    fn entity_type() -> EntityType {
        entity_type!("event_source")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![FieldDefinition::string("name").unique()]
    }
}

pub struct EventSchema;

impl EntSchema for EventSchema {
    fn entity_type() -> EntityType {
        entity_type!("event")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::foreign_key("scene_id", "scenes"),
            FieldDefinition::string("description"),
            FieldDefinition::foreign_key("source_id", "event_sources"),
            FieldDefinition::foreign_key("interpretation_id", "interpretations").optional(),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![
            EdgeDefinition::from("scene", entity_type!("scene")),
            EdgeDefinition::from("source", entity_type!("event_source")),
            EdgeDefinition::from("interpretation", entity_type!("interpretation")),
        ]
    }

    fn properties() -> Vec<PropertyDefinition> {
        let source = |name: &str| {
            PropertyDefinition::new(
                name,
                PropertyConfig::source_status(entity_type!("event_source"), "source_id", "name", name),
            )
        };
        vec![
            source("manual"),
            source("oracle"),
            source("dice"),
            // Events created from an interpretation carry its id
            PropertyDefinition::new(
                "from_oracle",
                PropertyConfig::relationship_status("interpretation_id", Condition::not_null()),
            ),
        ]
    }
}
