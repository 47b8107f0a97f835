// Dice Roll Entity Schema

use crate::core::EntityType;
use crate::ent_framework::{
    Condition, EdgeDefinition, EntSchema, FieldDefinition, PropertyConfig, PropertyDefinition,
};
use crate::entity_type;

pub struct DiceRollSchema;

impl EntSchema for DiceRollSchema {
    fn entity_type() -> EntityType {
        entity_type!("dice_roll")
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::foreign_key("scene_id", "scenes"),
            FieldDefinition::string("notation"),
            FieldDefinition::int("result"),
            FieldDefinition::string("reason").optional(),
        ]
    }

    fn edges() -> Vec<EdgeDefinition> {
        vec![EdgeDefinition::from("scene", entity_type!("scene"))]
    }

    fn properties() -> Vec<PropertyDefinition> {
        vec![PropertyDefinition::new(
            "explained",
            PropertyConfig::relationship_status("reason", Condition::not_null()),
        )]
    }
}
