use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codemap_graph::ArtifactPaths;
use codemap_search::{index_project, QueryEngine};
use config::AppConfig;
use flags::VectorFlag;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod flags;

#[derive(Parser)]
#[command(name = "codemap")]
#[command(about = "Call-graph indexing and retrieval for Python repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root to index or query
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Artifact directory (default: <root>/.codemap)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Config file (default: <root>/codemap.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vector provider fused with keyword results
    #[arg(long, global = true, value_enum)]
    vector: Option<VectorFlag>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the project and write the graph, dependency map and keyword index
    Index(IndexArgs),

    /// Hybrid keyword/vector search over indexed definitions
    Search(SearchArgs),

    /// Show a node's code with its callers and callees
    Expand(ExpandArgs),

    /// Trace the call flow from a node (default: the project entry point)
    Trace(TraceArgs),

    /// Render a Mermaid diagram around one or more nodes
    Diagram(DiagramArgs),

    /// Find where a symbol is defined or mentioned
    Lookup(LookupArgs),

    /// Show metadata and direct neighbours of a node
    Node(NodeArgs),

    /// Project outline: README, most important modules, entry point and file tree
    Overview(OverviewArgs),

    /// Print a project file with line numbers
    Read(ReadArgs),
}

#[derive(Args)]
struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IndexArgs {
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 10)]
    limit: usize,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct ExpandArgs {
    /// Node id in any spelling (`pkg.mod.func`, `pkg/mod.py::func`)
    id: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct TraceArgs {
    /// Start node; the detected entry point when omitted
    start: Option<String>,

    /// Maximum traversal depth (default from config)
    #[arg(short, long)]
    depth: Option<usize>,

    /// Render the trace as a Mermaid flowchart
    #[arg(long, conflicts_with = "json")]
    mermaid: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct DiagramArgs {
    /// Seed node ids
    #[arg(required = true)]
    ids: Vec<String>,

    /// Breadth-first expansion depth (default from config)
    #[arg(short, long)]
    depth: Option<usize>,
}

#[derive(Args)]
struct LookupArgs {
    /// Symbol name
    symbol: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct NodeArgs {
    /// Node id
    id: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct ReadArgs {
    /// File path relative to the project root
    path: String,

    /// First line to print
    #[arg(short, long, default_value_t = 1)]
    start: usize,

    /// Last line to print (default: end of file)
    #[arg(short, long)]
    end: Option<usize>,
}

#[derive(Args)]
struct OverviewArgs {
    #[command(flatten)]
    output: OutputArgs,
}

/// Project root, artifact locations and merged configuration for one invocation
struct Workspace {
    root: PathBuf,
    paths: ArtifactPaths,
    config: AppConfig,
}

impl Workspace {
    fn resolve(cli: &Cli) -> Result<Self> {
        let root = cli
            .root
            .canonicalize()
            .with_context(|| format!("Invalid project root {}", cli.root.display()))?;

        let mut config = AppConfig::load(&root, cli.config.as_deref())?;
        if let Some(vector) = cli.vector {
            config.vector = vector.as_domain();
        }

        let paths = match cli.storage.clone().or_else(|| config.storage_dir(&root)) {
            Some(dir) => ArtifactPaths::new(dir),
            None => ArtifactPaths::for_project_root(&root),
        };

        Ok(Self {
            root,
            paths,
            config,
        })
    }

    async fn engine(&self) -> Result<QueryEngine> {
        Ok(QueryEngine::open(&self.root, &self.paths, self.config.query_config()).await?)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let workspace = Workspace::resolve(&cli)?;

    match cli.command {
        Commands::Index(args) => run_index(&workspace, args).await,
        Commands::Search(args) => run_search(&workspace, args).await,
        Commands::Expand(args) => {
            let bundle = workspace.engine().await?.expand(&args.id)?;
            emit(args.output.json, &bundle, || bundle.render())
        }
        Commands::Trace(args) => run_trace(&workspace, args).await,
        Commands::Diagram(args) => {
            let diagram = workspace
                .engine()
                .await?
                .generate_diagram(&args.ids, args.depth)?;
            println!("{diagram}");
            Ok(())
        }
        Commands::Lookup(args) => {
            let found = workspace.engine().await?.lookup(&args.symbol)?;
            emit(args.output.json, &found, || found.render())
        }
        Commands::Node(args) => {
            let info = workspace.engine().await?.node_info(&args.id)?;
            emit(args.output.json, &info, || info.render())
        }
        Commands::Overview(args) => {
            let overview = workspace.engine().await?.overview();
            emit(args.output.json, &overview, || overview.render())
        }
        Commands::Read(args) => {
            let text = workspace
                .engine()
                .await?
                .read_file(&args.path, args.start, args.end)?;
            println!("{text}");
            Ok(())
        }
    }
}

async fn run_index(workspace: &Workspace, args: IndexArgs) -> Result<()> {
    log::info!("Indexing {}", workspace.root.display());
    let report = index_project(
        &workspace.root,
        &workspace.paths,
        workspace.config.indexer.clone(),
        &workspace.config.search,
    )
    .await?;
    emit(args.output.json, &report, || report.render())
}

async fn run_search(workspace: &Workspace, args: SearchArgs) -> Result<()> {
    let engine = workspace.engine().await?;
    let hits = engine.search(&args.query, args.limit).await?;

    if args.output.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No results for '{}'.", args.query);
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{}. {} (score: {:.4})", i + 1, hit.id, hit.score);
        if let Some(node) = engine.graph().node_by_id(&hit.id) {
            if let Some(file) = &node.file {
                println!("   {}:{}-{}", file, node.start_line, node.end_line);
            }
        }
    }
    Ok(())
}

async fn run_trace(workspace: &Workspace, args: TraceArgs) -> Result<()> {
    let engine = workspace.engine().await?;

    if args.mermaid {
        println!("{}", engine.flow_diagram(args.start.as_deref(), args.depth)?);
        return Ok(());
    }

    let trace = match args.start.as_deref() {
        Some(start) => engine.trace_flow(start, args.depth)?,
        None => engine.trace_entry_flow(args.depth)?,
    };
    emit(args.output.json, &trace, || {
        if trace.is_empty() {
            format!("No project calls found from {}.", trace.start)
        } else {
            trace.render()
        }
    })
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
