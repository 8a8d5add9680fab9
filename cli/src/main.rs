//! Pathgraph command-line client
//!
//! The store lives in memory for the lifetime of the process; use
//! `--load` or `IMPORT FROM JSON` to start from a saved graph and
//! `EXPORT TO JSON` to keep the result.

use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use pathgraph::{CommandOutput, EngineConfig, Session};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pathgraph", version, about = "Embedded typed graph store")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// JSON graph to import before running any command
    #[arg(long, global = true)]
    load: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, global = true, env = "PATHGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the traversal hop limit
    #[arg(long, global = true)]
    max_hops: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a command file, one command per line
    Run {
        /// Script path
        script: PathBuf,

        /// Continue after a failing command
        #[arg(long)]
        keep_going: bool,
    },
    /// Execute a single command
    Exec {
        /// The command text
        command: String,
    },
    /// Start an interactive shell reading from stdin
    Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(max_hops) = cli.max_hops {
        config.max_hops = max_hops;
    }
    config.validate()?;
    init_tracing(&config.log_level);

    let session = Session::new(config);
    if let Some(path) = &cli.load {
        let output = session
            .execute(&format!("IMPORT FROM JSON {}", quote_path(path)))
            .await
            .with_context(|| format!("loading graph {}", path.display()))?;
        tracing::info!("{}", output.summary());
    }

    match cli.command {
        Commands::Run { script, keep_going } => {
            run_script(&session, &script, keep_going, &cli.format).await
        }
        Commands::Exec { command } => {
            let output = session.execute(&command).await?;
            print_output(&output, &cli.format)
        }
        Commands::Shell => run_shell(&session, &cli.format).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn quote_path(path: &Path) -> String {
    let text = path.display().to_string();
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Lines that carry a command: not blank, not a `#` comment
fn command_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

async fn run_script(
    session: &Session,
    script: &Path,
    keep_going: bool,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("reading script {}", script.display()))?;

    let mut failures = 0usize;
    for (line_no, line) in command_lines(&text) {
        match session.execute(line).await {
            Ok(output) => print_output(&output, format)?,
            Err(e) if keep_going => {
                failures += 1;
                eprintln!("{}:{}: {}", script.display(), line_no, e);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("{}:{}", script.display(), line_no));
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} command(s) failed", failures);
    }
    Ok(())
}

async fn run_shell(session: &Session, format: &OutputFormat) -> anyhow::Result<()> {
    println!("Pathgraph Interactive Shell");
    println!("Type commands, or :help for help. :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        eprint!("pathgraph> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match trimmed {
            ":quit" | ":exit" | ":q" => break,
            ":help" | ":h" => print_help(),
            ":stats" => {
                let (nodes, relationships) = session
                    .read(|store| (store.node_count(), store.relationship_count()))
                    .await;
                println!("Nodes:         {}", nodes);
                println!("Relationships: {}", relationships);
                println!("Hop limit:     {}", session.engine().config().max_hops);
            }
            command => match session.execute(command).await {
                Ok(output) => {
                    if let Err(e) = print_output(&output, format) {
                        eprintln!("Error: {}", e);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    println!("Bye!");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  CREATE NODE <Type> {{k: v, ...}}");
    println!("  CREATE RELATIONSHIP <Rel> FROM <Type>(id=<n>) TO <Type>(id=<n>) {{k: v}}");
    println!("  GET NODE <Type> <id>");
    println!("  GET NEIGHBORS <Type> <id> [WITH RELATIONSHIP <Rel>] [DIRECTION OUTGOING|INCOMING|BOTH]");
    println!("  UPDATE NODE <Type> <id> {{k: v}}   DELETE NODE <Type> <id>");
    println!("  UPDATE RELATIONSHIP <Rel> FROM ... TO ... {{k: v}}   DELETE RELATIONSHIP <id>");
    println!("  TRAVERSE <Type>(id=<n>) -[<Rel>]-> <Type> [<-[<Rel>]- <Type> ...] [WHERE ...]");
    println!("  MATCH (a:<Type>)-[r:<Rel>]->(b:<Type>) [WHERE ...]");
    println!("  EXPORT TO JSON <path>   IMPORT FROM JSON <path>");
    println!("  :stats    Show store counts");
    println!("  :quit     Exit shell");
}

fn print_output(output: &CommandOutput, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output.records())?);
        }
        OutputFormat::Table => print_table(output),
    }
    Ok(())
}

fn print_table(output: &CommandOutput) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let rows = match output {
        CommandOutput::Paths(records) => {
            if records.is_empty() {
                println!("(no results)");
                return;
            }
            let with_bindings = records.iter().any(|r| r.bindings.is_some());
            if with_bindings {
                table.set_header(vec!["#", "path", "bindings"]);
            } else {
                table.set_header(vec!["#", "path"]);
            }
            for (i, record) in records.iter().enumerate() {
                let mut row = vec![(i + 1).to_string(), record.path.join(" ")];
                if let Some(bindings) = &record.bindings {
                    let cells: Vec<String> = bindings
                        .iter()
                        .map(|(name, entity)| format!("{}={}", name, entity))
                        .collect();
                    row.push(cells.join(", "));
                }
                table.add_row(row);
            }
            records.len()
        }
        CommandOutput::Neighbors(records) => {
            if records.is_empty() {
                println!("(no results)");
                return;
            }
            table.set_header(vec!["node", "relationship"]);
            for record in records {
                table.add_row(vec![
                    format_table_value(&record.node),
                    format_table_value(&record.relationship),
                ]);
            }
            records.len()
        }
        CommandOutput::Node(serde_json::Value::Object(map)) => {
            table.set_header(vec!["property", "value"]);
            for (key, value) in map {
                table.add_row(vec![key.clone(), format_table_value(value)]);
            }
            1
        }
        other => {
            println!("{}", other.summary());
            return;
        }
    };

    println!("{}", table);
    println!("{} row(s)", rows);
}

fn format_table_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Object(map) => {
            // Nodes: {"id", "type", ...}; relationships: {"type", "from", "to", ...}
            let rest: serde_json::Map<String, serde_json::Value> = map
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "id" | "type" | "from" | "to"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let head = match (map.get("type"), map.get("id"), map.get("from"), map.get("to")) {
                (Some(t), Some(id), _, _) => format!("{}:{}", format_table_value(t), id),
                (Some(t), None, Some(from), Some(to)) => {
                    format!("[{}] {} -> {}", format_table_value(t), from, to)
                }
                _ => return serde_json::to_string(v).unwrap_or_default(),
            };
            if rest.is_empty() {
                head
            } else {
                format!(
                    "{} {}",
                    head,
                    serde_json::to_string(&serde_json::Value::Object(rest)).unwrap_or_default()
                )
            }
        }
        serde_json::Value::Array(_) => serde_json::to_string(v).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_lines_skip_comments_and_blanks() {
        let script = "# setup\nCREATE NODE Person {id: 1}\n\n  GET NODE Person 1  \n";
        let lines: Vec<(usize, &str)> = command_lines(script).collect();
        assert_eq!(
            lines,
            vec![(2, "CREATE NODE Person {id: 1}"), (4, "GET NODE Person 1")]
        );
    }

    #[test]
    fn test_format_table_value() {
        assert_eq!(
            format_table_value(&json!({"id": 1, "type": "Person", "name": "Alice"})),
            r#"Person:1 {"name":"Alice"}"#
        );
        assert_eq!(
            format_table_value(&json!({"type": "WORKS_AT", "from": 1, "to": 101})),
            "[WORKS_AT] 1 -> 101"
        );
        assert_eq!(format_table_value(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_quote_path() {
        assert_eq!(quote_path(Path::new("/tmp/a b.json")), "\"/tmp/a b.json\"");
    }
}
