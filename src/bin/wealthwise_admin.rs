use std::path::PathBuf;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use wealthwise_backend::config::AppConfig;
use wealthwise_backend::logging::{init_logging, LoggingConfig};
use wealthwise_backend::services::admin_service::{self, BatchReport};
use wealthwise_backend::services::balance_history_service::PgBalanceHistory;
use wealthwise_backend::services::{backup_service, summary_service, validation_service};

fn cli() -> Command {
    Command::new("wealthwise-admin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Wealthwise maintenance commands")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("backup").about("Export every table to a timestamped JSON file").arg(
                Arg::new("dir")
                    .long("dir")
                    .value_parser(value_parser!(PathBuf))
                    .help("Directory to write into (defaults to BACKUP_DIR)"),
            ),
        )
        .subcommand(
            Command::new("restore")
                .about("Insert rows from a JSON backup, skipping rows that already exist")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Backup file to restore"),
                ),
        )
        .subcommand(
            Command::new("summary").about("Show record counts, or one user's financial summary").arg(
                Arg::new("user")
                    .long("user")
                    .value_parser(value_parser!(Uuid))
                    .help("User id to summarize"),
            ),
        )
        .subcommand(Command::new("validate").about("Run data integrity checks"))
        .subcommand(
            Command::new("plan").about("Show which account each unbacked goal would be allocated to").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(Command::new("migrate").about("Allocate every unbacked goal to an account"))
        .subcommand(Command::new("rollback").about("Remove allocations from every backed goal"))
        .subcommand(Command::new("seed").about("Create a demo user with mock data"))
}

fn print_report(label: &str, report: &BatchReport) {
    println!(
        "{}: {} processed, {} succeeded, {} failed, {} skipped",
        label,
        report.processed,
        report.succeeded,
        report.failed,
        report.skipped()
    );
    for e in &report.errors {
        println!("  - {}", e);
    }
}

async fn run(matches: ArgMatches, config: AppConfig, pool: PgPool) -> anyhow::Result<bool> {
    let recorder = PgBalanceHistory::new(pool.clone());

    match matches.subcommand() {
        Some(("backup", args)) => {
            let dir = args
                .get_one::<PathBuf>("dir")
                .cloned()
                .unwrap_or_else(|| config.backup_dir.clone());
            let path = backup_service::backup(&pool, &dir).await.context("backup failed")?;
            println!("Backup written to {}", path.display());
            Ok(true)
        }
        Some(("restore", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("restore requires a backup file")?;
            let snapshot = backup_service::read_backup(file)
                .await
                .with_context(|| format!("could not load {}", file.display()))?;
            let report = backup_service::restore(&pool, &snapshot).await.context("restore failed")?;
            print_report("Restore", &report);
            Ok(report.is_clean())
        }
        Some(("summary", args)) => {
            match args.get_one::<Uuid>("user") {
                Some(user_id) => {
                    let summary = summary_service::user_summary(&pool, *user_id, config.price_stale_after_days)
                        .await
                        .context("summary failed")?;
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                None => {
                    let counts = summary_service::database_summary(&pool).await.context("summary failed")?;
                    println!("{}", serde_json::to_string_pretty(&counts)?);
                }
            }
            Ok(true)
        }
        Some(("validate", _)) => {
            let report = validation_service::run(&pool).await.context("validation failed")?;
            if report.is_valid {
                println!("No issues found");
            } else {
                println!("{} issue(s) found:", report.issues.len());
                for issue in &report.issues {
                    println!("  - {}", issue);
                }
            }
            Ok(report.is_valid)
        }
        Some(("plan", args)) => {
            let entries = admin_service::plan(&pool).await.context("planning failed")?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for e in &entries {
                    match (&e.account_name, &e.allocated_amount, &e.error) {
                        (Some(account), Some(amount), _) => println!("{} -> {} ({})", e.goal_name, account, amount),
                        (_, _, Some(err)) => println!("{} -> not allocatable: {}", e.goal_name, err),
                        _ => println!("{} -> no decision", e.goal_name),
                    }
                }
                println!("{} goal(s) planned", entries.len());
            }
            Ok(true)
        }
        Some(("migrate", _)) => {
            let report = admin_service::migrate(&pool, &recorder).await.context("migration failed")?;
            print_report("Migrate", &report);
            Ok(report.is_clean())
        }
        Some(("rollback", _)) => {
            let report = admin_service::rollback_all(&pool, &recorder).await.context("rollback failed")?;
            print_report("Rollback", &report);
            Ok(report.is_clean())
        }
        Some(("seed", _)) => {
            let user_id = admin_service::seed(&pool).await.context("seeding failed")?;
            println!("Seeded demo user {}", user_id);
            Ok(true)
        }
        _ => anyhow::bail!("unknown command"),
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("could not connect to the database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("could not apply schema migrations")?;
    Ok(pool)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let matches = cli().get_matches();

    if let Err(e) = init_logging(LoggingConfig::for_cli()) {
        eprintln!("Error: could not initialize logging: {}", e);
        std::process::exit(1);
    }

    let outcome = async {
        let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
        let pool = connect(&config).await?;
        run(matches, config, pool).await
    }
    .await;

    match outcome {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_parses_restore_and_summary_args() {
        let m = cli()
            .try_get_matches_from(["wealthwise-admin", "restore", "backups/x.json"])
            .unwrap();
        let (name, args) = m.subcommand().unwrap();
        assert_eq!(name, "restore");
        assert_eq!(args.get_one::<PathBuf>("file"), Some(&PathBuf::from("backups/x.json")));

        let id = Uuid::new_v4();
        let raw = id.to_string();
        let m = cli()
            .try_get_matches_from(["wealthwise-admin", "summary", "--user", raw.as_str()])
            .unwrap();
        let (_, args) = m.subcommand().unwrap();
        assert_eq!(args.get_one::<Uuid>("user"), Some(&id));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(cli().try_get_matches_from(["wealthwise-admin", "explode"]).is_err());
    }
}
