//! Demonstrates building and querying the knowledge graph
//!
//! This example shows how to:
//! - Load whatever a previous run persisted
//! - Ingest a design note and a code snippet
//! - Query entities, relationships and paths
//! - Record a solution and read recommendations through the cache
//!
//! Set `DEVFLOW_KG_DIR` to choose the storage directory.

use devflow_kg::{
    EntityType, GraphConfig, GraphQuery, KnowledgeBase, KnowledgeBaseConfig, KnowledgeGraph,
    QueryOptions, RelationshipType,
};
use tracing_subscriber::EnvFilter;

const DESIGN_NOTE: &str = "\
Login flow for the dashboard. Authentication uses JWT sessions stored in Redis;
caching of user profiles goes through the same Redis instance.

1. Validate the submitted credentials
2. Create a session token
3. Redirect to the dashboard
";

const CODE: &str = "\
class AuthService {
  async login(user) { return this.sessions.create(user); }
}

function validateCredentials(user) { return user.password.length > 8; }

const LoginForm = () => <Button onClick={submit}>Sign in</Button>;
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let storage_dir =
        std::env::var("DEVFLOW_KG_DIR").unwrap_or_else(|_| ".knowledge-graph".to_string());
    let config = GraphConfig::builder().storage_dir(&storage_dir).build();
    let graph = KnowledgeGraph::new(config)?;

    println!("Loading graph from {}...", storage_dir);
    let loaded = graph.load_existing_graph().await;
    println!(
        "✓ Loaded {} entities, {} relationships ({} unreadable files)\n",
        loaded.entities,
        loaded.relationships,
        loaded.skipped_entities + loaded.skipped_relationships
    );

    // 1. Ingest
    println!("1. Ingesting documents...");
    for (content, context) in [(DESIGN_NOTE, "login-design"), (CODE, "auth.tsx")] {
        let report = graph.ingest(content, Some(context)).await;
        println!(
            "   {}: {} entities, {} relationships",
            context,
            report.entities.len(),
            report.relationships.len()
        );
        for entity in &report.entities {
            println!(
                "     - {:<10} {} ({:.2})",
                entity.entity_type.as_str(),
                entity.name,
                entity.confidence
            );
        }
    }
    println!();

    // 2. Entity query
    println!("2. Code entities mentioning 'login'...");
    for entity_type in [EntityType::Class, EntityType::Function, EntityType::Component] {
        let result = graph
            .query_graph(
                &GraphQuery::new().entity_type(entity_type).entity_name("login"),
                QueryOptions::default(),
            )
            .await;
        for entity in result.entities {
            println!("   {} {} [{}]", entity.entity_type, entity.name, entity.id);
        }
    }
    println!();

    // 3. Relationship query
    println!("3. Strongest USES relationships...");
    let uses = graph
        .query_graph(
            &GraphQuery::new().relationship_type(RelationshipType::Uses),
            QueryOptions::default(),
        )
        .await;
    for rel in uses.relationships.iter().take(5) {
        println!("   {} -> {} ({:.3})", rel.source, rel.target, rel.score);
    }
    println!();

    // 4. Path query between the first and last relationship endpoints
    if let (Some(first), Some(last)) = (uses.relationships.first(), uses.relationships.last()) {
        println!("4. Paths from {} to {}...", first.source, last.target);
        let paths = graph
            .query_graph(
                &GraphQuery::new()
                    .source_entity(first.source.clone())
                    .target_entity(last.target.clone())
                    .find_path(true),
                QueryOptions::default(),
            )
            .await;
        for path in &paths.paths {
            println!("   {}", path.join(" -> "));
        }
        if paths.truncated {
            println!("   (search stopped early)");
        }
        println!();
    }

    // 5. Knowledge base
    println!("5. Knowledge base recommendations...");
    let kb = KnowledgeBase::new(KnowledgeBaseConfig::at(
        std::path::Path::new(&storage_dir).join("knowledge_base.json"),
    ))?;
    kb.add_solution(
        "login redirect loops",
        "clear the stale session cookie before redirecting",
        vec!["auth".to_string()],
    )
    .await;
    let recs = kb.recommendations("session login redirect").await;
    for solution in &recs.solutions {
        println!("   {} -> {}", solution.problem, solution.solution);
    }
    println!();

    let stats = graph.stats().await;
    println!(
        "Graph: {} entities, {} relationships, {} queries (avg {:?})",
        stats.entity_count,
        stats.relationship_count,
        stats.query_metrics.total_queries,
        stats.query_metrics.average_query_time()
    );
    println!("Cache: {}", kb.cache_stats().await);

    graph.check_persistence()?;
    Ok(())
}
