use crate::commands::query::{changes_catalog, print_list};
use crate::commands::QueryExecutor;
use crate::completion::{CompletionEngine, SqlHelper, VocabularyExtensions};
use crate::database::{Connection, ConnectionConfig, MySqlProvider};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{history::DefaultHistory, CompletionType, Config, Editor};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Cli {
    connection: Connection,
    query_executor: QueryExecutor,
    editor: Editor<SqlHelper, DefaultHistory>,
    current_database: Option<String>,
}

impl Cli {
    pub fn new(config: &ConnectionConfig, extensions: VocabularyExtensions) -> Result<Self> {
        let connection = Connection::new(config)?;

        println!("Welcome to the SQL shell. Commands end with ; or \\g.");
        println!("Your connection id is {}", connection.connection_id());
        println!("Server version: {}", connection.server_version());
        println!();
        println!(
            "Type '\\h' for help. Press Tab to complete keywords, tables and columns."
        );
        println!();

        let config_editor = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .edit_mode(rustyline::EditMode::Emacs)
            .build();
        let mut editor = Editor::with_config(config_editor)?;

        // Catalog queries use their own pooled connections so the background
        // load never competes with the interactive one.
        let provider = Arc::new(MySqlProvider::new(config.opts())?);
        let engine = CompletionEngine::new(provider, VocabularyExtensions::mysql().merge(extensions));
        editor.set_helper(Some(SqlHelper::new(engine)));

        Ok(Self {
            connection,
            query_executor: QueryExecutor::new(),
            editor,
            current_database: config.database.clone(),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = self.get_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('\\') {
                        match self.handle_special_command(line) {
                            Ok(true) => continue,
                            Ok(false) => break,
                            Err(e) => {
                                println!("Error: {}", e);
                                continue;
                            }
                        }
                    }

                    if line.ends_with(';') || line.ends_with("\\g") {
                        let query = line.trim_end_matches(';').trim_end_matches("\\g").trim();
                        if let Err(e) = self.execute_query(query) {
                            println!("ERROR: {}", e);
                        }
                    } else {
                        println!("Please end your SQL statement with ';' or '\\g'");
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    fn get_prompt(&self) -> String {
        match &self.current_database {
            Some(db) => format!("sql [{}]> ", db),
            None => "sql> ".to_string(),
        }
    }

    fn engine(&self) -> Option<&CompletionEngine> {
        self.editor.helper().map(SqlHelper::engine)
    }

    /// Returns `false` when the shell should exit.
    fn handle_special_command(&mut self, command: &str) -> Result<bool> {
        match command {
            "\\q" | "\\quit" | "\\exit" => {
                println!("Bye");
                return Ok(false);
            }
            "\\h" | "\\help" => self.show_help(),
            "\\c" | "\\clear" => println!("Query cleared."),
            "\\s" | "\\status" => self.show_status(),
            "\\d" | "\\databases" => self.execute_query("SHOW DATABASES")?,
            "\\t" | "\\tables" => self.execute_query("SHOW TABLES")?,
            "\\r" | "\\rehash" => self.reload_catalog(),
            "\\U" | "\\users" => self.show_users()?,
            _ if command.starts_with("\\u ") => {
                let db_name = command.trim_start_matches("\\u ").trim();
                self.use_database(db_name)?;
            }
            _ => {
                println!("Unknown command: {}", command);
                println!("Type '\\h' for help.");
            }
        }
        Ok(true)
    }

    fn show_help(&self) {
        println!("General SQL help:");
        println!("Note that all SQL statements must end with ';' or '\\g'");
        println!();
        println!("\\c (\\clear)     Clear the current input statement.");
        println!("\\d (\\databases) List databases.");
        println!("\\h (\\help)      Display this help.");
        println!("\\q (\\quit)      Quit.");
        println!("\\r (\\rehash)    Reload the completion catalog.");
        println!("\\s (\\status)    Get status information from the server.");
        println!("\\t (\\tables)    List tables in current database.");
        println!("\\u <db> (\\use)  Use database <db>.");
        println!("\\U (\\users)     List users.");
        println!();
    }

    fn show_status(&self) {
        println!("--------------");
        println!("Connection id:\t\t{}", self.connection.connection_id());
        println!(
            "Current database:\t{}",
            self.current_database.as_deref().unwrap_or("(none)")
        );
        println!("Server version:\t\t{}", self.connection.server_version());
        if let Some(engine) = self.engine() {
            let stats = engine.catalog().stats();
            let state = if engine.catalog_ready() { "ready" } else { "loading" };
            let shape = match engine.db_support() {
                Some(true) => "database.schema.table",
                Some(false) => "schema.table",
                None => "unknown",
            };
            println!(
                "Completion catalog:\t{}, {} ({} schemas, {} tables, {} columns)",
                state, shape, stats.schemas, stats.tables, stats.columns
            );
        }
        println!("--------------");
    }

    fn reload_catalog(&self) {
        let Some(engine) = self.engine() else {
            return;
        };
        match engine.force_reload() {
            Ok(catalog) => {
                let stats = catalog.stats();
                println!(
                    "Completion catalog reloaded: {} schemas, {} tables",
                    stats.schemas, stats.tables
                );
            }
            Err(e) => {
                warn!(error = %e, "catalog reload failed");
                println!("Could not reload completion catalog: {}", e);
            }
        }
    }

    fn show_users(&self) -> Result<()> {
        if let Some(engine) = self.engine() {
            print_list("user", &engine.users()?);
        }
        Ok(())
    }

    fn use_database(&mut self, db_name: &str) -> Result<()> {
        if self
            .query_executor
            .execute(&mut self.connection, &format!("USE {}", db_name))?
        {
            self.current_database = Some(db_name.trim_matches('`').to_string());
            println!("Database changed");
        }
        Ok(())
    }

    fn execute_query(&mut self, query: &str) -> Result<()> {
        if !self.query_executor.execute(&mut self.connection, query)? {
            return Ok(());
        }

        let mut words = query.split_whitespace();
        if words.next().is_some_and(|w| w.eq_ignore_ascii_case("USE")) {
            if let Some(db_name) = words.next() {
                self.current_database = Some(db_name.trim_matches('`').to_string());
            }
        } else if changes_catalog(query) {
            info!("schema changed, reloading completion catalog");
            self.reload_catalog();
        }
        Ok(())
    }
}
