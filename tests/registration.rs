use async_trait::async_trait;
use derived_ent::{
    config::{DerivedConfig, LookupFailurePolicy},
    core::{EntityId, EntityType, Value},
    ent_framework::{
        derived::{install_registry, property_expr, registry, RegistrationState},
        Condition, DerivedProperties, DerivedValue, EdgeDefinition, EntObject, EntityDescriptor,
        FieldDefinition, FilterCondition, PropertyConfig, PropertyDefinition, PropertyRegistry,
        SchemaCatalog,
    },
    entity_type,
    error::{AppError, AppResult, RegistrationError},
    infrastructure::PointLookup,
    query::{to_sql, TableRef, OWNER_ALIAS},
    schemas::build_registry,
};

fn parent() -> EntityType {
    entity_type!("parent")
}

fn child() -> EntityType {
    entity_type!("child")
}

fn grandchild() -> EntityType {
    entity_type!("grandchild")
}

/// parent -> children -> grandchildren, with `properties` declared on parent
fn catalog(properties: Vec<PropertyDefinition>) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    let mut parent_desc = EntityDescriptor::new(parent(), "parents")
        .field(FieldDefinition::string("name"))
        .edge(EdgeDefinition::to("children", child()));
    for property in properties {
        parent_desc = parent_desc.property(property);
    }
    catalog.declare(parent_desc).unwrap();
    catalog
        .declare(
            EntityDescriptor::new(child(), "children")
                .field(FieldDefinition::foreign_key("parent_id", "parents"))
                .field(FieldDefinition::bool("flag").default_value(false))
                .field(FieldDefinition::enumeration("kind", &["a", "b"]).default_value("a"))
                .field(FieldDefinition::string("label").optional())
                .edge(EdgeDefinition::from("parent", parent()))
                .edge(EdgeDefinition::to("grandchildren", grandchild())),
        )
        .unwrap();
    catalog
        .declare(
            EntityDescriptor::new(grandchild(), "grandchildren")
                .field(FieldDefinition::foreign_key("child_id", "children"))
                .edge(EdgeDefinition::from("child", child())),
        )
        .unwrap();
    catalog
}

fn register_one(key: &str, config: PropertyConfig) -> (PropertyRegistry, Result<Vec<String>, RegistrationError>) {
    let catalog = catalog(vec![
        PropertyDefinition::new("children", PropertyConfig::existence(child(), "parent_id")),
        PropertyDefinition::new(key, config),
    ]);
    let mut registry = PropertyRegistry::new();
    let result = registry
        .register(&catalog, &parent())
        .map(|report| report.properties);
    (registry, result)
}

fn rejection(key: &str, config: PropertyConfig) -> RegistrationError {
    let (registry, result) = register_one(key, config);
    let err = result.unwrap_err();
    assert_eq!(registry.state(&parent()), RegistrationState::Rejected(err.clone()));
    assert_eq!(registry.properties(&parent()).count(), 0);
    err
}

#[test]
fn test_valid_configuration_installs_every_property() {
    let (registry, result) = register_one(
        "grandchildren",
        PropertyConfig::cross_table_count(grandchild(), "child_id", &["children", "grandchildren"]),
    );
    assert_eq!(
        result.unwrap(),
        vec!["has_children".to_string(), "grandchildren_count".to_string()]
    );
    assert_eq!(registry.state(&parent()), RegistrationState::Registered);
    assert!(registry.property(&parent(), "has_children").is_ok());
}

#[test]
fn test_missing_relationship_names_entity_and_key() {
    let err = rejection(
        "ghosts",
        PropertyConfig::existence(child(), "parent_id").relationship("nonexistent"),
    );
    match &err {
        RegistrationError::MissingRelationship { entity, property, relationship, .. } => {
            assert_eq!(entity, &parent());
            assert_eq!(property, "ghosts");
            assert_eq!(relationship, "nonexistent");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("parent"));
    assert!(message.contains("ghosts"));
}

#[test]
fn test_rejected_entity_exposes_no_properties() {
    let (registry, result) = register_one(
        "ghosts",
        PropertyConfig::existence(child(), "parent_id").relationship("nonexistent"),
    );
    assert!(result.is_err());
    // The valid property declared next to the broken one is not installed either
    assert!(matches!(
        registry.property(&parent(), "has_children"),
        Err(AppError::NotFound(_))
    ));
    let obj = EntObject::new(parent(), 1);
    assert!(registry.evaluate(&obj, "has_children").is_err());
}

#[test]
fn test_missing_path_segment_lists_full_path() {
    let err = rejection(
        "grandkid",
        PropertyConfig::cross_table_count(grandchild(), "child_id", &["children", "grandkids"]),
    );
    match err {
        RegistrationError::MissingRelationship { on, relationship, path, .. } => {
            assert_eq!(on, child());
            assert_eq!(relationship, "grandkids");
            assert_eq!(path, vec!["children".to_string(), "grandkids".to_string()]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_single_valued_hop_is_rejected() {
    let err = rejection(
        "loop",
        PropertyConfig::cross_table_count(parent(), "parent_id", &["children", "parent"]),
    );
    assert!(matches!(
        err,
        RegistrationError::SingleValuedRelationship { ref relationship, .. } if relationship == "parent"
    ));
}

#[test]
fn test_missing_field_is_rejected() {
    let err = rejection(
        "child",
        PropertyConfig::field_status(child(), "parent_id", "missing", Condition::equals(1))
            .relationship("children"),
    );
    assert!(matches!(
        err,
        RegistrationError::MissingField { ref field, ref target, .. } if field == "missing" && target == &child()
    ));
}

#[test]
fn test_not_null_in_count_filter_is_unsupported() {
    let err = rejection(
        "labelled",
        PropertyConfig::filtered_count(
            child(),
            "parent_id",
            FilterCondition::new("label", Condition::not_null()),
        )
        .relationship("children"),
    );
    assert!(matches!(
        err,
        RegistrationError::UnsupportedOperator { ref operator, .. } if operator == "not_null"
    ));
}

#[test]
fn test_enum_operand_outside_variants_is_rejected() {
    let err = rejection(
        "child",
        PropertyConfig::field_status(child(), "parent_id", "kind", Condition::equals("c"))
            .relationship("children"),
    );
    assert!(matches!(err, RegistrationError::InvalidOperand { ref field, .. } if field == "kind"));
}

#[test]
fn test_null_and_empty_operands_are_rejected() {
    let err = rejection(
        "child",
        PropertyConfig::field_status(child(), "parent_id", "flag", Condition::equals(Value::Null))
            .relationship("children"),
    );
    assert!(matches!(err, RegistrationError::InvalidOperand { .. }));

    let err = rejection(
        "child",
        PropertyConfig::field_status(child(), "parent_id", "kind", Condition::in_set(Vec::<&str>::new()))
            .relationship("children"),
    );
    assert!(matches!(err, RegistrationError::InvalidOperand { .. }));

    let err = rejection(
        "child",
        PropertyConfig::field_status(child(), "parent_id", "flag", Condition::equals("yes"))
            .relationship("children"),
    );
    assert!(matches!(err, RegistrationError::InvalidOperand { .. }));
}

#[test]
fn test_target_and_foreign_key_must_match_relationship() {
    let err = rejection(
        "kids",
        PropertyConfig::existence(grandchild(), "parent_id").relationship("children"),
    );
    assert!(matches!(
        err,
        RegistrationError::TargetMismatch { ref expected, ref found, .. }
            if expected == &grandchild() && found == &child()
    ));

    let err = rejection(
        "kids",
        PropertyConfig::existence(child(), "label").relationship("children"),
    );
    assert!(matches!(
        err,
        RegistrationError::ForeignKeyMismatch { ref declared, ref resolved, .. }
            if declared == "label" && resolved == "parent_id"
    ));

    let err = rejection(
        "kids",
        PropertyConfig::existence(child(), "mother_id").relationship("children"),
    );
    assert!(matches!(
        err,
        RegistrationError::MissingForeignKey { column: Some(ref column), .. } if column == "mother_id"
    ));
}

#[test]
fn test_unknown_target_entity_is_rejected() {
    let err = rejection("ghosts", PropertyConfig::existence(entity_type!("ghost"), "parent_id"));
    assert!(matches!(
        err,
        RegistrationError::UnknownEntity { ref missing, .. } if missing == &entity_type!("ghost")
    ));
}

#[test]
fn test_duplicate_property_names_are_rejected() {
    let err = rejection("children", PropertyConfig::existence(child(), "parent_id"));
    assert!(matches!(
        err,
        RegistrationError::DuplicateProperty { ref property, .. } if property == "has_children"
    ));

    // Generated names may not shadow a field
    let err = rejection(
        "child",
        PropertyConfig::direct_count(child(), "parent_id")
            .relationship("children")
            .named("name"),
    );
    assert!(matches!(err, RegistrationError::DuplicateProperty { .. }));
}

#[test]
fn test_registration_happens_once() {
    let catalog = catalog(vec![PropertyDefinition::new(
        "children",
        PropertyConfig::existence(child(), "parent_id"),
    )]);
    let mut registry = PropertyRegistry::new();
    registry.register(&catalog, &parent()).unwrap();
    assert!(matches!(
        registry.register(&catalog, &parent()),
        Err(RegistrationError::AlreadyRegistered { .. })
    ));

    let broken = catalog_with_broken_parent();
    let mut registry = PropertyRegistry::new();
    assert!(registry.register(&broken, &parent()).is_err());
    assert!(matches!(
        registry.register(&broken, &parent()),
        Err(RegistrationError::PreviouslyRejected { .. })
    ));
}

fn catalog_with_broken_parent() -> SchemaCatalog {
    catalog(vec![PropertyDefinition::new(
        "ghosts",
        PropertyConfig::existence(child(), "parent_id").relationship("nonexistent"),
    )])
}

#[test]
fn test_register_all_fails_fast() {
    let catalog = catalog_with_broken_parent();
    let mut registry = PropertyRegistry::new();
    let err = registry.register_all(&catalog).unwrap_err();
    assert_eq!(err.entity(), &parent());
    assert_eq!(err.property(), Some("ghosts"));
    // Entity types are registered in name order: child and grandchild come first
    assert_eq!(registry.state(&child()), RegistrationState::Registered);
    assert!(matches!(registry.state(&parent()), RegistrationState::Rejected(_)));
}

#[test]
fn test_unknown_entity_cannot_register() {
    let catalog = catalog(Vec::new());
    let mut registry = PropertyRegistry::new();
    assert!(matches!(
        registry.register(&catalog, &entity_type!("ghost")),
        Err(RegistrationError::UnknownEntity { property: None, .. })
    ));
}

/// club -> members joined through `club_id`, which carries no reference metadata
fn club_catalog() -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    catalog
        .declare(
            EntityDescriptor::new(entity_type!("club"), "clubs")
                .edge(EdgeDefinition::to("members", entity_type!("member")))
                .property(PropertyDefinition::new(
                    "members",
                    PropertyConfig::existence(entity_type!("member"), "club_id"),
                )),
        )
        .unwrap();
    catalog
        .declare(
            EntityDescriptor::new(entity_type!("member"), "members")
                .field(FieldDefinition::int("club_id"))
                .field(FieldDefinition::int("sponsor_id").optional()),
        )
        .unwrap();
    catalog
}

#[test]
fn test_finalize_confirms_convention_foreign_key() {
    let mut catalog = club_catalog();
    let mut registry = PropertyRegistry::new();
    let report = registry.register(&catalog, &entity_type!("club")).unwrap();
    assert_eq!(report.deferred.len(), 1);
    assert_eq!(report.deferred[0].column, "club_id");

    assert!(matches!(registry.finalize(&catalog), Err(AppError::Validation(_))));

    catalog.seal().unwrap();
    registry.finalize(&catalog).unwrap();
    assert!(registry.deferred(&entity_type!("club")).is_empty());
    assert!(registry.property(&entity_type!("club"), "has_members").is_ok());
}

#[test]
fn test_finalize_rejects_entity_when_foreign_key_changes() {
    let mut catalog = club_catalog();
    let mut registry = PropertyRegistry::new();
    registry.register(&catalog, &entity_type!("club")).unwrap();

    catalog.override_foreign_key(entity_type!("club"), "sponsor_id");
    catalog.seal().unwrap();

    match registry.finalize(&catalog) {
        Err(AppError::Registration(RegistrationError::ForeignKeyMismatch { declared, resolved, .. })) => {
            assert_eq!(declared, "club_id");
            assert_eq!(resolved, "sponsor_id");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        registry.state(&entity_type!("club")),
        RegistrationState::Rejected(_)
    ));
    assert_eq!(registry.properties(&entity_type!("club")).count(), 0);
}

#[test]
fn test_instance_context_on_hand_built_graph() {
    let (_, registry) = build_registry(&DerivedConfig::default()).unwrap();
    let scene = |id: i64, events: usize| {
        EntObject::new(entity_type!("scene"), id).with_many(
            "events",
            (0..events)
                .map(|i| EntObject::new(entity_type!("event"), (id * 10) + i as i64))
                .collect(),
        )
    };
    let act = EntObject::new(entity_type!("act"), 1)
        .with_many("scenes", vec![scene(1, 3), scene(2, 0)]);

    assert_eq!(registry.evaluate(&act, "event_count").unwrap(), DerivedValue::Count(3));
    assert_eq!(registry.evaluate(&act, "scene_count").unwrap(), DerivedValue::Count(2));

    // Unloaded relationships read as empty
    let bare = EntObject::new(entity_type!("act"), 2);
    assert_eq!(registry.evaluate(&bare, "has_scenes").unwrap(), DerivedValue::Bool(false));
    assert_eq!(registry.evaluate(&bare, "event_count").unwrap(), DerivedValue::Count(0));
}

struct FixedLookup(AppResult<Option<EntObject>>);

#[async_trait]
impl PointLookup for FixedLookup {
    async fn fetch_by_id(&self, entity_type: &EntityType, id: EntityId) -> AppResult<Option<EntObject>> {
        assert_eq!(entity_type, &entity_type!("event_source"));
        assert_eq!(id, EntityId::new(7));
        match &self.0 {
            Ok(found) => Ok(found.clone()),
            Err(e) => Err(AppError::DatabaseError(e.to_string())),
        }
    }
}

fn unloaded_event() -> EntObject {
    EntObject::new(entity_type!("event"), 1).with("source_id", 7)
}

#[tokio::test]
async fn test_lookup_fallback_reads_lookup_row() {
    let (_, registry) = build_registry(&DerivedConfig::default()).unwrap();
    let manual = FixedLookup(Ok(Some(
        EntObject::new(entity_type!("event_source"), 7).with("name", "manual"),
    )));
    let event = unloaded_event();

    assert_eq!(
        registry.evaluate_with_lookup(&event, "is_manual", &manual).await.unwrap(),
        DerivedValue::Bool(true)
    );
    assert_eq!(
        registry.evaluate_with_lookup(&event, "is_oracle", &manual).await.unwrap(),
        DerivedValue::Bool(false)
    );

    let missing = FixedLookup(Ok(None));
    assert_eq!(
        registry.evaluate_with_lookup(&event, "is_manual", &missing).await.unwrap(),
        DerivedValue::Bool(false)
    );
}

#[tokio::test]
async fn test_lookup_failure_policy() {
    let failing = FixedLookup(Err(AppError::DatabaseError("connection closed".to_string())));
    let event = unloaded_event();

    let (_, lenient) = build_registry(&DerivedConfig::default()).unwrap();
    assert_eq!(lenient.lookup_policy(), LookupFailurePolicy::Lenient);
    assert_eq!(
        lenient.evaluate_with_lookup(&event, "is_manual", &failing).await.unwrap(),
        DerivedValue::Bool(false)
    );

    let config = DerivedConfig {
        lookup_policy: LookupFailurePolicy::Strict,
        ..DerivedConfig::default()
    };
    let (_, strict) = build_registry(&config).unwrap();
    assert!(matches!(
        strict.evaluate_with_lookup(&event, "is_manual", &failing).await,
        Err(AppError::Lookup(_))
    ));

    // A loaded source never consults the lookup
    let loaded = unloaded_event().with_one(
        "source",
        Some(EntObject::new(entity_type!("event_source"), 7).with("name", "manual")),
    );
    assert_eq!(
        strict.evaluate_with_lookup(&loaded, "is_manual", &failing).await.unwrap(),
        DerivedValue::Bool(true)
    );
}

#[test]
fn test_global_registry_and_extension_trait() {
    let (_, built) = build_registry(&DerivedConfig::default()).unwrap();
    install_registry(built).unwrap();
    assert!(install_registry(PropertyRegistry::new()).is_err());
    assert!(registry().is_ok());

    let game = EntObject::new(entity_type!("game"), 1)
        .with_many("acts", vec![EntObject::new(entity_type!("act"), 1).with("is_active", true)]);
    assert_eq!(game.derived("has_acts").unwrap(), DerivedValue::Bool(true));
    assert_eq!(game.derived("act_count").unwrap(), DerivedValue::Count(1));
    assert_eq!(game.derived("has_active_act").unwrap(), DerivedValue::Bool(true));
    assert!(matches!(game.derived("has_dragons"), Err(AppError::NotFound(_))));

    let owner = TableRef::new("games", OWNER_ALIAS);
    let act_count = property_expr(&entity_type!("game"), "act_count", &owner).unwrap();
    assert_eq!(act_count.label_name(), Some("act_count"));
    let sql = to_sql(&act_count);
    assert!(sql.starts_with("(SELECT COUNT("));
    assert!(sql.contains(r#""owner"."id""#));
    assert!(matches!(
        property_expr(&entity_type!("game"), "has_dragons", &owner),
        Err(AppError::NotFound(_))
    ));
}

fn kind() -> EntityType {
    entity_type!("kind")
}

fn item() -> EntityType {
    entity_type!("item")
}

/// items reference kinds through several columns, with `properties` declared on item
fn source_catalog(properties: Vec<PropertyDefinition>) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    catalog
        .declare(EntityDescriptor::new(parent(), "parents").field(FieldDefinition::string("name")))
        .unwrap();
    catalog
        .declare(
            EntityDescriptor::new(kind(), "kinds")
                .field(FieldDefinition::string("name"))
                .field(FieldDefinition::enumeration("tier", &["basic", "premium"]).default_value("basic")),
        )
        .unwrap();
    let mut item_desc = EntityDescriptor::new(item(), "items")
        .field(FieldDefinition::foreign_key("kind_id", "kinds"))
        .field(FieldDefinition::foreign_key("backup_kind_id", "kinds").optional())
        .field(FieldDefinition::foreign_key("parent_id", "parents").optional())
        .field(FieldDefinition::int("legacy_kind").optional())
        .field(FieldDefinition::string("kind_ref").optional())
        .field(FieldDefinition::float("weight").optional())
        .edge(EdgeDefinition::from("backup", kind()).foreign_key("backup_kind_id"))
        .edge(EdgeDefinition::from("parent", parent()));
    for property in properties {
        item_desc = item_desc.property(property);
    }
    catalog.declare(item_desc).unwrap();
    catalog
}

fn register_item(config: PropertyConfig) -> (PropertyRegistry, Result<Vec<String>, RegistrationError>) {
    let catalog = source_catalog(vec![PropertyDefinition::new("manual", config)]);
    let mut registry = PropertyRegistry::new();
    let result = registry
        .register(&catalog, &item())
        .map(|report| report.properties);
    (registry, result)
}

fn item_rejection(config: PropertyConfig) -> RegistrationError {
    let (registry, result) = register_item(config);
    let err = result.unwrap_err();
    assert_eq!(registry.state(&item()), RegistrationState::Rejected(err.clone()));
    assert_eq!(registry.properties(&item()).count(), 0);
    assert_eq!(err.property(), Some("manual"));
    err
}

#[test]
fn test_source_field_must_hold_a_lookup_id() {
    for column in ["kind_ref", "weight"] {
        match item_rejection(PropertyConfig::source_status(kind(), column, "name", "manual")) {
            RegistrationError::InvalidOperand { entity, field, .. } => {
                assert_eq!(entity, item());
                assert_eq!(field, column);
            }
            other => panic!("unexpected error for {}: {:?}", column, other),
        }
    }

    // An integer column referencing some other table is not a kind id either
    match item_rejection(PropertyConfig::source_status(kind(), "parent_id", "name", "manual")) {
        RegistrationError::InvalidOperand { field, reason, .. } => {
            assert_eq!(field, "parent_id");
            assert!(reason.contains("parents"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Integer columns without a declared reference are accepted
    let (_, result) = register_item(PropertyConfig::source_status(kind(), "legacy_kind", "name", "manual"));
    assert_eq!(result.unwrap(), vec!["is_manual".to_string()]);
}

#[test]
fn test_source_status_missing_fields() {
    match item_rejection(PropertyConfig::source_status(kind(), "category_id", "name", "manual")) {
        RegistrationError::MissingField { target, field, .. } => {
            assert_eq!(target, item());
            assert_eq!(field, "category_id");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    match item_rejection(PropertyConfig::source_status(kind(), "kind_id", "title", "manual")) {
        RegistrationError::MissingField { target, field, .. } => {
            assert_eq!(target, kind());
            assert_eq!(field, "title");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_source_status_expected_value_must_be_a_variant() {
    match item_rejection(PropertyConfig::source_status(kind(), "kind_id", "tier", "gold")) {
        RegistrationError::InvalidOperand { field, reason, .. } => {
            assert_eq!(field, "tier");
            assert!(reason.contains("basic"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let (_, result) = register_item(PropertyConfig::source_status(kind(), "kind_id", "tier", "premium"));
    assert!(result.is_ok());
}

#[test]
fn test_source_status_explicit_relationship_must_match() {
    match item_rejection(
        PropertyConfig::source_status(kind(), "kind_id", "name", "manual").relationship("parent"),
    ) {
        RegistrationError::TargetMismatch { relationship, expected, found, .. } => {
            assert_eq!(relationship, "parent");
            assert_eq!(expected, kind());
            assert_eq!(found, parent());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    match item_rejection(
        PropertyConfig::source_status(kind(), "kind_id", "name", "manual").relationship("backup"),
    ) {
        RegistrationError::ForeignKeyMismatch { relationship, declared, resolved, .. } => {
            assert_eq!(relationship, "backup");
            assert_eq!(declared, "kind_id");
            assert_eq!(resolved, "backup_kind_id");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    match item_rejection(
        PropertyConfig::source_status(kind(), "kind_id", "name", "manual").relationship("category"),
    ) {
        RegistrationError::MissingRelationship { relationship, .. } => assert_eq!(relationship, "category"),
        other => panic!("unexpected error: {:?}", other),
    }

    let (registry, result) = register_item(
        PropertyConfig::source_status(kind(), "backup_kind_id", "name", "manual").relationship("backup"),
    );
    assert!(result.is_ok());
    let item_obj = EntObject::new(item(), 1).with("backup_kind_id", 3).with_one(
        "backup",
        Some(EntObject::new(kind(), 3).with("name", "manual")),
    );
    assert_eq!(registry.evaluate(&item_obj, "is_manual").unwrap(), DerivedValue::Bool(true));
}

struct KindLookup;

#[async_trait]
impl PointLookup for KindLookup {
    async fn fetch_by_id(&self, entity_type: &EntityType, id: EntityId) -> AppResult<Option<EntObject>> {
        assert_eq!(entity_type, &kind());
        Ok(Some(EntObject::new(kind(), id).with("name", "manual")))
    }
}

#[tokio::test]
async fn test_source_status_without_relationship_uses_point_lookup() {
    // No `kind` edge on item: the defaulted relationship is absent, not an error
    let (registry, result) = register_item(PropertyConfig::source_status(kind(), "kind_id", "name", "manual"));
    assert_eq!(result.unwrap(), vec!["is_manual".to_string()]);
    assert_eq!(registry.state(&item()), RegistrationState::Registered);

    let item_obj = EntObject::new(item(), 1).with("kind_id", 3);
    assert_eq!(
        registry.evaluate_with_lookup(&item_obj, "is_manual", &KindLookup).await.unwrap(),
        DerivedValue::Bool(true)
    );
    // Without I/O the row cannot be read
    assert_eq!(registry.evaluate(&item_obj, "is_manual").unwrap(), DerivedValue::Bool(false));
}
