use codemap_indexer::{DefinitionKind, IndexerConfig, ProjectIndexer, Role};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::create_dir_all(root.join("__pycache__")).unwrap();
    fs::write(root.join("app/__init__.py"), "").unwrap();
    fs::write(
        root.join("app/routes.py"),
        "\
from .service import Service

@app.get('/items')
def list_items():
    svc = Service()
    return svc.fetch_all()
",
    )
    .unwrap();
    fs::write(
        root.join("app/service.py"),
        "\
class Service:
    def fetch_all(self):
        try:
            return self.load()
        except IOError:
            return []

    def load(self):
        return []
",
    )
    .unwrap();
    fs::write(root.join("__pycache__/stale.py"), "def stale(): pass\n").unwrap();
    temp
}

#[tokio::test]
async fn indexes_a_small_package() {
    let temp = fixture();
    let project = ProjectIndexer::new(temp.path(), IndexerConfig::default())
        .unwrap()
        .index()
        .await
        .unwrap();

    let files: Vec<&str> = project.files.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(
        files,
        vec!["app/__init__.py", "app/routes.py", "app/service.py"]
    );

    let routes = &project.files[1];
    assert_eq!(routes.module, "app.routes");
    let endpoint = routes
        .definitions
        .iter()
        .find(|d| d.id == "app.routes.list_items")
        .unwrap();
    assert_eq!(endpoint.kind, DefinitionKind::Function);
    assert_eq!(endpoint.role, Role::ApiEndpoint);

    let hints: Vec<&str> = routes
        .calls
        .iter()
        .map(|c| c.target_hint.as_str())
        .collect();
    assert_eq!(
        hints,
        vec!["app.get", "app.service.Service", "app.service.Service.fetch_all"]
    );

    let service = &project.files[2];
    let load = service
        .calls
        .iter()
        .find(|c| c.target_hint == "app.service.Service.load")
        .unwrap();
    assert!(load.is_guarded);
    assert_eq!(load.source_scope, "app.service.Service.fetch_all");

    assert_eq!(project.stats.files, 3);
    assert!(project.stats.parse_failures.is_empty());
}
