use crate::commands::{print_help, start_cluster, LineOutcome, Shell};
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use query_distributed::SiteTarget;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

pub struct Repl {
    shell: Shell,
    editor: DefaultEditor,
    history_file: PathBuf,
}

impl Repl {
    pub fn new(config: Config) -> Result<Self> {
        let history_file = Self::get_history_file()?;
        let mut editor = DefaultEditor::new()?;

        // Load history
        let _ = editor.load_history(&history_file);

        let cluster = start_cluster(&config)?;
        Ok(Self {
            shell: Shell::new(cluster, config),
            editor,
            history_file,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{}", "Interactive Plan Cache Shell".bright_green().bold());
        println!(
            "{} partitions plus the coordinator are running",
            self.shell.cluster().partition_count()
        );
        print_help();
        println!();

        loop {
            let prompt = format!("{} ", self.prompt().bright_green().bold());
            let readline = self.editor.readline(&prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    self.editor.add_history_entry(line)?;

                    match self.shell.execute_line(line).await {
                        Ok(LineOutcome::Quit) => break,
                        Ok(LineOutcome::Continue) => {}
                        Err(e) => eprintln!("{} {}", "Error:".bright_red().bold(), e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".bright_yellow());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "exit".bright_yellow());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {:?}", "Error:".bright_red().bold(), err);
                    break;
                }
            }
        }

        // Save history
        self.editor.save_history(&self.history_file)?;
        self.shell.cluster().shutdown().await;

        println!("{}", "Goodbye!".bright_cyan());
        Ok(())
    }

    fn prompt(&self) -> String {
        match self.shell.target() {
            SiteTarget::Coordinator => "qe[coord]>".to_string(),
            SiteTarget::Partition(id) => format!("qe[{}]>", id),
        }
    }

    fn get_history_file() -> Result<PathBuf> {
        let home = home::home_dir().context("Could not find home directory")?;
        let history_dir = home.join(".query_engine");
        std::fs::create_dir_all(&history_dir)?;
        Ok(history_dir.join("plancache_history.txt"))
    }
}
