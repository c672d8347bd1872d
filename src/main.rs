use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::{self, Write};

mod cli;
mod commands;
mod completion;
mod database;
mod logging;

use cli::Cli;
use completion::VocabularyExtensions;
use database::ConnectionConfig;

fn build_command() -> Command {
    let extra = |id: &'static str, help: &'static str| {
        Arg::new(id)
            .long(id)
            .value_name("WORDS")
            .help(help)
            .action(ArgAction::Append)
            .value_delimiter(',')
    };

    Command::new("sql-shell-rust")
        .version("0.1.0")
        .about("An interactive SQL shell with context-aware completion")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Connect to host")
                .default_value("localhost"),
        )
        .arg(
            Arg::new("port")
                .short('P')
                .long("port")
                .value_name("PORT")
                .help("Port number to use for connection")
                .value_parser(value_parser!(u16))
                .default_value("3306"),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("USER")
                .help("User for login")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Password to use when connecting to server")
                .num_args(0..=1)
                .require_equals(true),
        )
        .arg(
            Arg::new("database")
                .short('D')
                .long("database")
                .value_name("DATABASE")
                .help("Database to use"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("FILTER")
                .help("Log filter for stderr, e.g. `debug` (overrides RUST_LOG)"),
        )
        .arg(extra("extra-action", "Additional statement-starting words to complete"))
        .arg(extra("extra-keyword", "Additional keywords to complete"))
        .arg(extra("extra-object", "Additional object words to complete"))
        .arg(extra("extra-function", "Additional function names to complete"))
}

fn words(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn prompt_password() -> Result<String> {
    print!("Enter password: ");
    io::stdout().flush()?;
    Ok(rpassword::read_password().unwrap_or_default())
}

fn main() -> Result<()> {
    let matches = build_command().get_matches();

    logging::init_logger(matches.get_one::<String>("log-level").map(String::as_str))?;

    let password = match matches.get_one::<String>("password") {
        Some(p) => p.clone(),
        None => prompt_password()?,
    };

    let config = ConnectionConfig {
        host: matches
            .get_one::<String>("host")
            .cloned()
            .unwrap_or_else(|| "localhost".to_string()),
        port: matches.get_one::<u16>("port").copied().unwrap_or(3306),
        user: matches.get_one::<String>("user").cloned().unwrap_or_default(),
        password,
        database: matches.get_one::<String>("database").cloned(),
    };

    let extensions = VocabularyExtensions {
        actions: words(&matches, "extra-action"),
        keywords: words(&matches, "extra-keyword"),
        objects: words(&matches, "extra-object"),
        functions: words(&matches, "extra-function"),
    };

    let mut cli = Cli::new(&config, extensions)?;
    cli.run()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_consistent() {
        build_command().debug_assert();
    }

    #[test]
    fn test_extra_words_split_on_commas() {
        let matches = build_command()
            .try_get_matches_from([
                "sql-shell-rust",
                "-u",
                "root",
                "--extra-keyword",
                "STRAIGHT_JOIN,LOW_PRIORITY",
                "--extra-keyword=HIGH_PRIORITY",
                "--extra-function",
                "JSON_EXTRACT",
            ])
            .unwrap();
        assert_eq!(
            words(&matches, "extra-keyword"),
            vec!["STRAIGHT_JOIN", "LOW_PRIORITY", "HIGH_PRIORITY"]
        );
        assert_eq!(words(&matches, "extra-function"), vec!["JSON_EXTRACT"]);
        assert!(words(&matches, "extra-action").is_empty());
        assert_eq!(matches.get_one::<u16>("port"), Some(&3306));
    }

    #[test]
    fn test_user_is_required() {
        assert!(build_command()
            .try_get_matches_from(["sql-shell-rust"])
            .is_err());
    }
}
