mod editor;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tasky_core::builder::TaskBuilder;
use tasky_core::capture::UlidAllocator;
use tasky_core::command::{parse_invocation, Invocation};
use tasky_core::config::{Overrides, Settings};
use tasky_core::planner::MutationPlanner;
use tasky_core::render::{render_active_tasks, render_task_detail};
use tasky_core::schema::Schema;
use tasky_core::store::{JsonFileStore, TaskStore};

use crate::editor::EditorCapture;

#[derive(Parser)]
#[command(
    name = "tasky",
    version = tasky_core::version(),
    about = "Task tracker client",
    after_help = "Usage forms:\n  tasky                         list active tasks\n  tasky add <tokens...>         create a task (+tag @user attr:value words)\n  tasky <id>                    show one task\n  tasky <id> modify <tokens...> change a task (+tag -tag @user attr:value|none)"
)]
struct Cli {
    /// Directory holding the task store
    #[arg(long)]
    root: Option<PathBuf>,
    /// Actor recorded on created tasks and mutation events
    #[arg(long)]
    user: Option<String>,
    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let invocation = parse_invocation(&cli.args)?;
    let cwd = std::env::current_dir().context("resolve current directory")?;
    let settings = Settings::resolve(
        &cwd,
        Overrides {
            root: cli.root,
            actor: cli.user,
        },
    )
    .context("load configuration")?;
    debug!(root = %settings.root.display(), actor = %settings.actor, "resolved settings");

    let mut store = JsonFileStore::open(&settings.root)
        .with_context(|| format!("open task store at {}", settings.root.display()))?;
    let schema = Schema::builtin();
    let coercer = settings.coercer();

    match invocation {
        Invocation::List => {
            let slots = store.fetch_active_tasks()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&slots)?);
            } else {
                println!("{}", render_active_tasks(&slots));
            }
        }
        Invocation::Add(tokens) => {
            let mut capture = EditorCapture::new(settings.editor.clone());
            let task = TaskBuilder::new(schema, coercer)
                .comment_marker(settings.comment_marker.clone())
                .build(&settings.actor, &tokens, &mut capture, &mut UlidAllocator)?;
            let id = store.create_task(task)?;
            if cli.json {
                let task = store.fetch_task(id)?;
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                println!("Created task {id}.");
            }
        }
        Invocation::Show(id) => show_task(&store, id, cli.json)?,
        Invocation::Modify(id, tokens) => {
            let plan = MutationPlanner::new(schema, coercer).plan(&tokens)?;
            if plan.is_empty() {
                debug!(id, "nothing to apply");
            } else {
                store.apply_mutations(&settings.actor, id, &plan.operations)?;
            }
            show_task(&store, id, cli.json)?;
        }
    }
    Ok(())
}

fn show_task(store: &impl TaskStore, id: u64, json: bool) -> Result<()> {
    let task = store.fetch_task(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("{}", render_task_detail(&task));
    }
    Ok(())
}
