// entc - Ent schema CLI
// Validates the fixture schemas, lists their derived properties and runs both evaluation contexts

use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use derived_ent::{
    config::Config,
    data_seeder::seed_sample_game,
    infrastructure::SqliteStore,
    query::{to_sql, EntQuery, TableRef, OWNER_ALIAS},
    schemas::{build_registry, validate_schemas},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: entc <command>");
        eprintln!("Commands:");
        eprintln!("  validate  - Validate schemas and register derived properties");
        eprintln!("  describe  - List every derived property with its SQL (--json for the configurations)");
        eprintln!("  demo      - Seed a database and evaluate every property in both contexts");
        return Ok(());
    }

    let config = Config::from_env()?;
    match args[1].as_str() {
        "validate" => validate_cmd(&config)?,
        "describe" => describe_cmd(&config, args.get(2).map(String::as_str) == Some("--json"))?,
        "demo" => demo_cmd(&config).await?,
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            eprintln!("Use 'validate', 'describe' or 'demo'");
        }
    }

    Ok(())
}

fn validate_cmd(config: &Config) -> anyhow::Result<()> {
    println!("Validating schema definitions...");

    if let Err(errors) = validate_schemas() {
        eprintln!("Schema validation failed:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        anyhow::bail!("Schema validation failed");
    }

    let (catalog, registry) = build_registry(&config.derived)?;
    for entity in catalog.entities() {
        println!(
            "  {} ({}): {} derived properties",
            entity.entity_type,
            entity.table,
            registry.properties(&entity.entity_type).count()
        );
    }
    println!("All schemas are valid");
    Ok(())
}

fn describe_cmd(config: &Config, json: bool) -> anyhow::Result<()> {
    let (catalog, registry) = build_registry(&config.derived)?;
    if json {
        let configurations: BTreeMap<_, _> = catalog
            .entities()
            .filter(|entity| !entity.properties.is_empty())
            .map(|entity| (entity.entity_type.as_str(), &entity.properties))
            .collect();
        println!("{}", serde_json::to_string_pretty(&configurations)?);
        return Ok(());
    }

    for entity in catalog.entities() {
        let owner = TableRef::new(&entity.table, OWNER_ALIAS);
        let mut properties = registry.properties(&entity.entity_type).peekable();
        if properties.peek().is_none() {
            continue;
        }
        println!("{}", entity.entity_type);
        for property in properties {
            println!(
                "  {:<30} {:<28} {}",
                property.name(),
                property.variant(),
                to_sql(&property.query(&owner))
            );
        }
    }
    Ok(())
}

async fn demo_cmd(config: &Config) -> anyhow::Result<()> {
    let (catalog, registry) = build_registry(&config.derived)?;
    let store = SqliteStore::connect(&config.database, Arc::new(catalog)).await?;
    store.initialize().await?;
    let seeded = seed_sample_game(&store).await?;
    println!("Seeded game {}", seeded.game);

    let mut mismatches = 0;
    for entity in store.catalog().entities() {
        let entity_type = &entity.entity_type;
        let properties: Vec<_> = registry.properties(entity_type).collect();
        if properties.is_empty() {
            continue;
        }

        let mut query = EntQuery::new(store.catalog(), entity_type)?;
        let owner = query.owner().clone();
        for property in &properties {
            query = query.select(property.query(&owner))?;
        }
        let rows = store.fetch(&query).await?;
        let objects = store.load_all(entity_type, config.derived.load_depth).await?;

        for (obj, row) in objects.iter().zip(&rows) {
            println!("{}", obj.key());
            for property in &properties {
                let instance = property
                    .evaluate_with_lookup(obj, &store, registry.lookup_policy())
                    .await?;
                let queried = property.decode(&row.get(property.name()));
                let marker = if instance == queried {
                    ""
                } else {
                    mismatches += 1;
                    "  MISMATCH"
                };
                println!("  {:<30} {:>6} {:>6}{}", property.name(), instance, queried, marker);
            }
        }
    }

    if mismatches > 0 {
        anyhow::bail!("{} properties disagree between instance and query context", mismatches);
    }
    println!("Instance and query context agree on every property");
    Ok(())
}
