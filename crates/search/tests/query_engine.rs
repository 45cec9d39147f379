use codemap_graph::ArtifactPaths;
use codemap_indexer::IndexerConfig;
use codemap_search::{
    index_project, QueryConfig, QueryEngine, SearchConfig, SearchError, VectorMode,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, source: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, source).unwrap();
}

fn sample_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "main.py",
        "from services.users import create_user\n\ndef main():\n    create_user(\"ada\")\n\nif __name__ == \"__main__\":\n    main()\n",
    );
    write(
        temp.path(),
        "services/users.py",
        "\"\"\"User management.\"\"\"\nfrom services.db import save\n\ndef create_user(name):\n    \"\"\"Create and persist a user account.\"\"\"\n    record = {\"name\": name}\n    save(record)\n    return record\n",
    );
    write(
        temp.path(),
        "services/db.py",
        "def save(record):\n    \"\"\"Write a record to the database.\"\"\"\n    return record\n\ndef connect(url):\n    return url\n",
    );
    temp
}

async fn indexed_engine(temp: &TempDir, config: QueryConfig) -> QueryEngine {
    let paths = ArtifactPaths::for_project_root(temp.path());
    let report = index_project(
        temp.path(),
        &paths,
        IndexerConfig::default(),
        &SearchConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(report.indexing.files, 3);
    assert_eq!(report.keyword_documents, 7);

    QueryEngine::open(temp.path(), &paths, config).await.unwrap()
}

#[tokio::test]
async fn missing_artifacts_fail_fast() {
    let temp = TempDir::new().unwrap();
    let paths = ArtifactPaths::for_project_root(temp.path());

    let err = QueryEngine::open(temp.path(), &paths, QueryConfig::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SearchError::MissingArtifact { .. }));
    assert!(err.to_string().ends_with("Run `codemap index` first."));
}

#[tokio::test]
async fn search_and_lookup() {
    let temp = sample_project();
    let engine = indexed_engine(&temp, QueryConfig::default()).await;

    let hits = engine.search("database", 5).await.unwrap();
    assert_eq!(hits[0].id, "services.db.save");

    let found = engine.lookup("create_user").unwrap();
    assert!(found.ids.contains(&"services.users.create_user".to_string()));
    assert!(found
        .render()
        .starts_with("Found 'create_user' in these locations:\n"));

    let missing = engine.lookup("kubernetes").unwrap();
    assert_eq!(missing.render(), "No exact matches found for 'kubernetes'.");

    assert!(matches!(
        engine.search("  ", 5).await,
        Err(SearchError::EmptyQuery)
    ));
}

#[tokio::test]
async fn expand_trace_and_diagram() {
    let temp = sample_project();
    let engine = indexed_engine(&temp, QueryConfig::default()).await;

    let bundle = engine.expand("services/users.py::create_user").unwrap();
    assert_eq!(bundle.id, "services.users.create_user");
    assert_eq!(bundle.callee_names(), vec!["save"]);
    assert!(bundle.caller_names().contains(&"main"));
    assert!(bundle.code.contains("   4 | def create_user(name):"));

    let trace = engine.trace_flow("main.main", None).unwrap();
    assert_eq!(
        trace.render(),
        "Function **main** calls -> create_user\nFunction **create_user** calls -> save"
    );

    let diagram = engine
        .generate_diagram(&["services.users.create_user".to_string()], None)
        .unwrap();
    assert!(diagram.contains("    services_users_create_user --> services_db_save"));

    let err = engine.expand("services.nothing").unwrap_err();
    assert_eq!(err.to_string(), "Node 'services.nothing' not found in graph.");
}

#[tokio::test]
async fn node_info_overview_and_entry_flow() {
    let temp = sample_project();
    let engine = indexed_engine(&temp, QueryConfig::default()).await;

    let info = engine.node_info("services.db.save").unwrap();
    assert_eq!(info.file.as_deref(), Some("services/db.py"));
    assert_eq!(info.definition_line, 1);
    assert!(info.called_by.contains(&"services.users.create_user".to_string()));
    assert!(info.render().contains("type: function"));

    let overview = engine.overview();
    assert_eq!(overview.core_modules.len(), 3);
    assert_eq!(overview.entry_file.as_deref(), Some("main.py"));
    assert_eq!(overview.entry_node.as_deref(), Some("main.main"));
    assert!(overview.render().contains("CORE FILES (Most heavily referenced):"));

    let entry = engine.trace_entry_flow(None).unwrap();
    assert_eq!(entry.start, "main.main");

    let mermaid = engine.flow_diagram(None, None).unwrap();
    assert!(mermaid.starts_with("graph TD\n"));
    assert!(mermaid.contains("    A --> B"));
    assert!(mermaid.ends_with("class A entryPoint"));
}

#[tokio::test]
async fn stub_vectors_join_the_fusion() {
    let temp = sample_project();
    let config = QueryConfig {
        vector: VectorMode::Stub,
        ..QueryConfig::default()
    };
    let engine = indexed_engine(&temp, config).await;

    let hits = engine.search("database record", 5).await.unwrap();
    assert!(hits.len() > 1);
    assert!(hits.iter().any(|h| h.id == "services.db.save"));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn overview_shows_readme_and_file_tree() {
    let temp = sample_project();
    write(temp.path(), "README.md", &"Sample service. ".repeat(200));
    let engine = indexed_engine(&temp, QueryConfig::default()).await;

    let overview = engine.overview();
    let readme = overview.readme.as_ref().unwrap();
    assert_eq!(readme.path, "README.md");
    assert_eq!(readme.content.chars().count(), 2000);
    assert!(readme.truncated);

    assert!(overview.file_tree[0].ends_with('/'));
    assert!(overview.file_tree.contains(&"    services/".to_string()));
    assert!(overview.file_tree.contains(&"        db.py".to_string()));
    assert!(!overview.file_tree.iter().any(|line| line.contains("README")));

    let text = overview.render();
    assert!(text.starts_with("README (README.md):\nSample service."));
    assert!(text.contains("\n... [Truncated] ...\n\nCORE FILES"));
    assert!(text.contains("\n\nPROJECT FILE TREE:\n"));
}

#[tokio::test]
async fn read_file_returns_numbered_lines() {
    let temp = sample_project();
    let engine = indexed_engine(&temp, QueryConfig::default()).await;

    assert_eq!(
        engine.read_file("services/db.py", 1, Some(2)).unwrap(),
        "   1 | def save(record):\n   2 |     \"\"\"Write a record to the database.\"\"\""
    );
    assert!(matches!(
        engine.read_file("services/db.py", 5, Some(2)),
        Err(SearchError::Indexer(_))
    ));
    assert!(engine.read_file("../outside.py", 1, None).is_err());
}

#[tokio::test]
async fn node_info_reports_bases() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "models.py",
        "class Base:\n    pass\n\nclass User(Base):\n    def save(self):\n        pass\n\nclass Missing(KeyError):\n    pass\n",
    );
    let paths = ArtifactPaths::for_project_root(temp.path());
    index_project(
        temp.path(),
        &paths,
        IndexerConfig::default(),
        &SearchConfig::default(),
    )
    .await
    .unwrap();
    let engine = QueryEngine::open(temp.path(), &paths, QueryConfig::default())
        .await
        .unwrap();

    let user = engine.node_info("models.User").unwrap();
    assert_eq!(user.inherits_from, vec!["models.Base".to_string()]);
    assert!(user.render().contains("inherits_from: [models.Base]"));

    let missing = engine.node_info("models.Missing").unwrap();
    assert_eq!(missing.inherits_from, vec!["KeyError".to_string()]);

    let base = engine.node_info("models.Base").unwrap();
    assert!(base.inherits_from.is_empty());
    assert!(!base.render().contains("inherits_from"));
}
