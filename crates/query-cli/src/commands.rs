use crate::compiler::ShellCompiler;
use crate::config::{Config, OutputFormat};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Color, Table as ComfyTable};
use query_cache::{CacheInvalidator, ResolvedStatement};
use query_core::Value;
use query_distributed::{
    Cluster, Procedure, ProcedureCatalog, SiteTarget, StatisticsAggregator, WorkerStats,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Procedures deployed when the shell starts
pub fn demo_catalog() -> ProcedureCatalog {
    ProcedureCatalog::new()
        .with_procedure(Procedure::new(
            "R1.select",
            vec!["SELECT * FROM R1 WHERE ID = ?".to_string()],
            "RETURN RESULTS TO STORED PROCEDURE\n INDEX SCAN of \"R1\" using its primary key index\n uniquely match (ID = ?0)",
        ))
        .with_procedure(Procedure::new(
            "R1.insert",
            vec!["INSERT INTO R1 VALUES (?, ?)".to_string()],
            "RETURN RESULTS TO STORED PROCEDURE\n INSERT into \"R1\"",
        ))
}

pub fn start_cluster(config: &Config) -> Result<Cluster> {
    let cluster = Cluster::start(config.cluster, Arc::new(ShellCompiler), demo_catalog())?;
    Ok(cluster)
}

/// Parse `partition` / `coordinator` flags into a target
pub fn target_from_flags(partition: Option<u32>, coordinator: bool) -> SiteTarget {
    match (partition, coordinator) {
        (_, true) => SiteTarget::Coordinator,
        (Some(id), false) => SiteTarget::Partition(id),
        (None, false) => SiteTarget::Partition(0),
    }
}

/// Parse `.target` arguments: a partition id or `coord`
pub fn parse_target(text: &str) -> Result<SiteTarget> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("coord") || text.eq_ignore_ascii_case("coordinator") {
        return Ok(SiteTarget::Coordinator);
    }
    let id = text
        .parse::<u32>()
        .with_context(|| format!("invalid target '{}', expected a partition id or 'coord'", text))?;
    Ok(SiteTarget::Partition(id))
}

/// Parse a comma separated argument list. Commas inside quotes are kept.
pub fn parse_args(text: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in text.chars() {
        match c {
            '\'' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => {
                values.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    values.push(current);

    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(Value::parse_literal)
        .collect()
}

/// What a shell line asked for
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Quit,
}

/// Shell state shared by `repl` and `stats`
pub struct Shell {
    cluster: Cluster,
    config: Config,
    target: SiteTarget,
    args: Vec<Value>,
}

impl Shell {
    pub fn new(cluster: Cluster, config: Config) -> Self {
        Self {
            cluster,
            config,
            target: SiteTarget::Partition(0),
            args: Vec::new(),
        }
    }

    pub fn target(&self) -> SiteTarget {
        self.target
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Handle one line: a dot command or a SQL batch
    pub async fn execute_line(&mut self, line: &str) -> Result<LineOutcome> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            return Ok(LineOutcome::Continue);
        }
        if line.starts_with('.') {
            return self.handle_command(line).await;
        }

        resolve_and_print(&self.cluster, &self.config, self.target, line, &self.args).await?;
        Ok(LineOutcome::Continue)
    }

    async fn handle_command(&mut self, line: &str) -> Result<LineOutcome> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            ".help" | ".h" => print_help(),
            ".quit" | ".exit" | ".q" => return Ok(LineOutcome::Quit),
            ".stats" => print_statistics(&self.cluster, self.config.output_format).await?,
            ".invalidate" => {
                self.cluster.invalidate_all();
                println!("{} Plan caches cleared on every site", "✓".bright_green());
            }
            ".target" => {
                if rest.is_empty() {
                    println!("Current target: {}", self.target.to_string().bright_cyan());
                } else {
                    let target = parse_target(rest)?;
                    if let SiteTarget::Partition(id) = target {
                        if id as usize >= self.cluster.partition_count() {
                            bail!(
                                "partition {} does not exist ({} partitions)",
                                id,
                                self.cluster.partition_count()
                            );
                        }
                    }
                    self.target = target;
                    println!("Target set to {}", self.target.to_string().bright_cyan());
                }
            }
            ".explain" => {
                if rest.is_empty() {
                    bail!("Usage: .explain <procedure>");
                }
                let plan = self.cluster.explain_procedure(rest).await?;
                println!("{}", plan);
            }
            ".args" => {
                self.args = parse_args(rest);
                if self.args.is_empty() {
                    println!("Arguments cleared");
                } else {
                    let shown: Vec<String> = self.args.iter().map(|v| v.to_string()).collect();
                    println!("Arguments: {}", shown.join(", ").bright_cyan());
                }
            }
            _ => bail!("Unknown command: {}. Type .help for help.", command),
        }
        Ok(LineOutcome::Continue)
    }
}

pub fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    println!("  {:<22} Show this help", ".help".bright_cyan());
    println!("  {:<22} Print plan cache statistics", ".stats".bright_cyan());
    println!("  {:<22} Clear every site's plan cache", ".invalidate".bright_cyan());
    println!(
        "  {:<22} Route statements to a partition or the coordinator",
        ".target <n|coord>".bright_cyan()
    );
    println!(
        "  {:<22} Show a catalog procedure's plan",
        ".explain <proc>".bright_cyan()
    );
    println!(
        "  {:<22} Arguments bound to ? markers",
        ".args <v1,v2,...>".bright_cyan()
    );
    println!("  {:<22} Exit", ".quit".bright_cyan());
    println!();
    println!("Anything else is resolved as a SQL batch on the current target.");
}

async fn resolve_and_print(
    cluster: &Cluster,
    config: &Config,
    target: SiteTarget,
    sql: &str,
    args: &[Value],
) -> Result<()> {
    let start = Instant::now();
    let resolved = cluster.resolve(target, sql, args).await?;
    let elapsed = start.elapsed();

    print_resolved(&resolved, config.show_plan);
    if config.show_timing {
        println!(
            "{} {:.3}ms",
            "Resolve time:".bright_yellow(),
            elapsed.as_secs_f64() * 1000.0
        );
    }
    Ok(())
}

fn print_resolved(resolved: &[ResolvedStatement], show_plan: bool) {
    if resolved.is_empty() {
        println!("{}", "(empty batch)".bright_black());
    }
    for statement in resolved {
        let label = format!("{:?}", statement.classification);
        let label = if statement.classification.is_hit() {
            label.bright_green()
        } else {
            label.bright_yellow()
        };
        println!("{} {}", label, statement.plan.canonical());
        if show_plan {
            println!("  {}", statement.plan.explain().bright_black());
        }
    }
}

/// `run`: resolve one batch `repeat` times, then print statistics
pub async fn run_batch(
    config: &Config,
    sql: &str,
    args: &[String],
    target: SiteTarget,
    repeat: usize,
) -> Result<()> {
    let cluster = start_cluster(config)?;
    let values: Vec<Value> = args.iter().map(|a| Value::parse_literal(a)).collect();

    println!("{} Resolving on {}", "→".bright_blue(), target);
    for _ in 0..repeat.max(1) {
        if let Err(e) = resolve_and_print(&cluster, config, target, sql, &values).await {
            eprintln!("{} {}", "Error:".bright_red().bold(), e);
        }
    }

    println!();
    print_statistics(&cluster, config.output_format).await?;
    cluster.shutdown().await;
    Ok(())
}

/// `stats`: feed a script through the shell, then print statistics
pub async fn run_script(config: &Config, path: &Path) -> Result<()> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read script {}", path.display()))?;

    let mut shell = Shell::new(start_cluster(config)?, config.clone());
    for (number, line) in script.lines().enumerate() {
        match shell.execute_line(line).await {
            Ok(LineOutcome::Continue) => {}
            Ok(LineOutcome::Quit) => break,
            Err(e) => eprintln!(
                "{} line {}: {}",
                "Error:".bright_red().bold(),
                number + 1,
                e
            ),
        }
    }

    println!();
    print_statistics(shell.cluster(), config.output_format).await?;
    shell.cluster().shutdown().await;
    Ok(())
}

pub async fn print_statistics(cluster: &Cluster, format: OutputFormat) -> Result<()> {
    let rows = cluster.statistics().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => println!("{}", statistics_table(&rows)),
    }
    Ok(())
}

fn statistics_table(rows: &[WorkerStats]) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("worker_id").fg(Color::Cyan),
        Cell::new("level1").fg(Color::Cyan),
        Cell::new("level2").fg(Color::Cyan),
        Cell::new("hits1").fg(Color::Cyan),
        Cell::new("hits2").fg(Color::Cyan),
        Cell::new("misses").fg(Color::Cyan),
        Cell::new("failures").fg(Color::Cyan),
        Cell::new("evictions").fg(Color::Cyan),
        Cell::new("plan avg (us)").fg(Color::Cyan),
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.worker_id),
            Cell::new(row.level1),
            Cell::new(row.level2),
            Cell::new(row.hits1),
            Cell::new(row.hits2),
            Cell::new(row.misses),
            Cell::new(row.failures),
            Cell::new(row.evictions1 + row.evictions2),
            Cell::new(format!("{:.1}", row.plan_time_avg_ns as f64 / 1000.0)),
        ]);
    }

    let totals = StatisticsAggregator::totals(rows);
    table.add_row(vec![
        Cell::new("total").fg(Color::Yellow),
        Cell::new(totals.level1),
        Cell::new(totals.level2),
        Cell::new(totals.hits1),
        Cell::new(totals.hits2),
        Cell::new(totals.misses),
        Cell::new(totals.failures),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}
