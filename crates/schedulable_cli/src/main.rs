//! `schedulable` command-line entry point.
//!
//! # Responsibility
//! - Resolve config, logging and the database for one invocation.
//! - Map subcommands onto `ScheduleService` calls over posts.
//!
//! # Invariants
//! - Errors go to stderr with a non-zero exit code.
//! - Lookups by id see pending posts too; listings honour the chosen scope.

mod args;
mod when;

use args::{Cli, Commands, ListArgs};
use clap::Parser;
use log::info;
use schedulable_core::db::open_db_with;
use schedulable_core::{
    init_logging, Clock, EntityQuery, HasVisibilitySchedule, Post, RepoError, SchedulableConfig,
    ScheduleOutcome, ScheduleScope, ScheduleService, SqlitePostRepository, SystemClock,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;
use when::parse_when;

const DEFAULT_DATA_DIR: &str = ".schedulable";

type CliResult<T> = Result<T, Box<dyn Error>>;
type PostService<'conn> = ScheduleService<Post, SqlitePostRepository<'conn>, SystemClock>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let data_dir = resolve_data_dir(cli.data_dir)?;
    let config = SchedulableConfig::load_or_init(&data_dir)?;
    init_logging(config.log_level(), config.log_dir(&data_dir))?;

    let db_path = cli.db.unwrap_or_else(|| config.sqlite_path(&data_dir));
    let conn = open_db_with(&db_path, &config.open_options())?;
    let service: PostService<'_> =
        ScheduleService::new(SqlitePostRepository::try_new(&conn)?, SystemClock);

    match cli.command {
        Commands::Add { title, at } => add(&service, title, at.as_deref()),
        Commands::List(args) => list(&service, &args),
        Commands::Schedule { id, when } => {
            let mut post = load(&service, &id)?;
            let at = parse_when(&when, service.clock().now())?;
            let outcome = service.schedule(&mut post, at)?;
            report("schedule", &post, outcome);
            Ok(())
        }
        Commands::Unschedule { id } => {
            let mut post = load(&service, &id)?;
            let outcome = service.unschedule(&mut post)?;
            report("unschedule", &post, outcome);
            Ok(())
        }
        Commands::Status { id } => {
            let post = load(&service, &id)?;
            println!("{}", render(&post, &service));
            Ok(())
        }
    }
}

fn resolve_data_dir(flag: Option<PathBuf>) -> CliResult<PathBuf> {
    let dir = flag.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if dir.is_absolute() {
        return Ok(dir);
    }
    Ok(std::env::current_dir()?.join(dir))
}

fn add(service: &PostService<'_>, title: String, at: Option<&str>) -> CliResult<()> {
    let mut post = Post::new(title);
    if let Some(at) = at {
        post.schedule_without_saving(parse_when(at, service.clock().now())?);
    }
    service.save(&post)?;

    info!(
        "event=post_add module=cli status=ok scheduled={}",
        post.schedule_at.is_some()
    );
    println!("{}", post.id);
    Ok(())
}

fn list(service: &PostService<'_>, args: &ListArgs) -> CliResult<()> {
    let scope = if args.only_scheduled {
        ScheduleScope::OnlyScheduled
    } else if args.with_scheduled {
        ScheduleScope::WithScheduled
    } else {
        ScheduleScope::Default
    };

    let posts = service.list(&EntityQuery::new().with_scope(scope))?;
    info!(
        "event=post_list module=cli status=ok scope={} count={}",
        scope.as_str(),
        posts.len()
    );
    for post in &posts {
        println!("{}", render(post, service));
    }
    Ok(())
}

fn load(service: &PostService<'_>, raw_id: &str) -> CliResult<Post> {
    let id = Uuid::parse_str(raw_id.trim()).map_err(|_| format!("`{raw_id}` is not a post id"))?;
    service
        .find_with_scope(id, ScheduleScope::WithScheduled)?
        .ok_or_else(|| RepoError::NotFound(id).into())
}

fn report(command: &str, post: &Post, outcome: ScheduleOutcome) {
    match outcome {
        ScheduleOutcome::Applied => println!(
            "{} {}",
            post.id,
            post.schedule_at
                .map_or_else(|| "visible".to_string(), |at| format!("hidden until {at}"))
        ),
        ScheduleOutcome::Vetoed => println!("{} {command} vetoed", post.id),
    }
}

fn render(post: &Post, service: &PostService<'_>) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        post.id,
        service.state_of(post).as_str(),
        post.schedule_at
            .map_or_else(|| "-".to_string(), |at| at.to_string()),
        post.title.as_deref().unwrap_or("")
    )
}
