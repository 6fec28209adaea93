use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxmacro_core::auth::{hash_password, Authenticator};
use fxmacro_core::config::Settings;
use fxmacro_core::domain::currency::Pair;
use fxmacro_core::domain::record::{AnalysisOptions, AnalysisRecord};
use fxmacro_core::pipeline::{AnalysisRequest, AnalysisService};
use fxmacro_core::storage::{HistoryStore, PgHistoryStore, PgUserStore, UserStore};

#[derive(Debug, Parser)]
#[command(name = "fxmacro", about = "Forex macro analysis from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one analysis and print it.
    Analyze(AnalyzeArgs),
    /// Manage login accounts (needs DATABASE_URL, except `hash`).
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Comma-separated pairs, e.g. "EUR/USD,USD/JPY". Defaults to all 19.
    #[arg(long)]
    pairs: Option<String>,

    /// Fetch macro indicators and score them.
    #[arg(long = "macro")]
    macro_data: bool,
    /// Search central-bank and market news.
    #[arg(long)]
    news: bool,
    /// Include the URLs given with --link.
    #[arg(long)]
    links: bool,
    /// Ask the LLM for a narrative.
    #[arg(long)]
    llm: bool,

    #[arg(long = "link")]
    link: Vec<String>,

    /// Log in and store the result in the history.
    #[arg(long, requires = "password")]
    username: Option<String>,
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Print the full record as JSON.
    #[arg(long)]
    json: bool,
}

impl AnalyzeArgs {
    /// No toggle at all means a full run.
    fn options(&self) -> AnalysisOptions {
        let picked = AnalysisOptions {
            macro_data: self.macro_data,
            news: self.news,
            links: self.links,
            llm: self.llm,
        };
        if picked == AnalysisOptions::default() {
            AnalysisOptions::full()
        } else {
            picked
        }
    }

    fn pairs(&self) -> anyhow::Result<Vec<Pair>> {
        match &self.pairs {
            Some(raw) => Pair::parse_list(raw),
            None => Ok(Pair::all()),
        }
    }
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    Add {
        username: String,
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    List,
    Delete {
        username: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    Password {
        username: String,
        new_password: String,
    },
    /// Print the stored hash of a password.
    Hash { password: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();
    let res = match cli.command {
        Command::Analyze(args) => analyze(&settings, args).await,
        Command::User(cmd) => user(&settings, cmd).await,
    };
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
    }
    res
}

async fn connect(settings: &Settings) -> anyhow::Result<sqlx::PgPool> {
    let pool = fxmacro_core::storage::connect(settings.require_database_url()?).await?;
    fxmacro_core::storage::migrate(&pool).await?;
    Ok(pool)
}

async fn analyze(settings: &Settings, args: AnalyzeArgs) -> anyhow::Result<()> {
    let pairs = args.pairs()?;
    let options = args.options();

    let (history, user_id) = match (&args.username, &args.password) {
        (Some(username), Some(password)) => {
            let pool = connect(settings).await?;
            let auth = Authenticator::new(Arc::new(PgUserStore::new(pool.clone())));
            let user = auth.authenticate(username, password).await?;
            let history: Arc<dyn HistoryStore> = Arc::new(PgHistoryStore::new(pool));
            (Some(history), Some(user.id))
        }
        _ => (None, None),
    };

    let service = AnalysisService::from_settings(settings, history)?;
    let outcome = service
        .run_analysis(AnalysisRequest {
            pairs,
            options,
            links: args.link,
            user_id,
        })
        .await?;

    if let Some(err) = &outcome.llm_error {
        eprintln!("warning: {err}");
    }
    if let Some(err) = &outcome.persistence_warning {
        eprintln!("warning: {err}");
    }

    if args.json {
        let out = serde_json::to_string_pretty(&outcome.record).context("serialize record")?;
        println!("{out}");
    } else {
        print!("{}", render_table(&outcome.record));
        if outcome.persisted {
            println!("\nsaved as {}", outcome.record.id);
        }
    }
    Ok(())
}

fn render_table(record: &AnalysisRecord) -> String {
    let mut out = format!(
        "{} ({})\n{:<8} {:>5} {:>5} {:>6}  {}\n",
        record.analysis_datetime.format("%Y-%m-%d %H:%M UTC"),
        record.analysis_type.as_str(),
        "pair",
        "base",
        "quote",
        "diff",
        "bias"
    );
    for r in &record.data.results {
        out.push_str(&format!(
            "{:<8} {:>5} {:>5} {:>+6}  {}\n",
            r.pair.to_string(),
            r.base.total(),
            r.quote.total(),
            r.differential,
            r.bias
        ));
    }
    if let Some(text) = &record.data.narrative {
        out.push('\n');
        out.push_str(text);
        out.push('\n');
    }
    out
}

async fn user(settings: &Settings, cmd: UserCommand) -> anyhow::Result<()> {
    if let UserCommand::Hash { password } = &cmd {
        println!("SHA-256: {}", hash_password(password));
        return Ok(());
    }

    let store = Arc::new(PgUserStore::new(connect(settings).await?));
    let auth = Authenticator::new(store.clone());

    match cmd {
        UserCommand::Add {
            username,
            password,
            email,
        } => {
            let user = auth.register(&username, &password, email).await?;
            println!("created user '{}' ({})", user.username, user.id);
        }
        UserCommand::List => {
            let users = store.list().await?;
            println!("{:<20} {:<30} {:<7} created", "username", "email", "active");
            for u in &users {
                println!(
                    "{:<20} {:<30} {:<7} {}",
                    u.username,
                    u.email.as_deref().unwrap_or("-"),
                    if u.is_active { "yes" } else { "no" },
                    u.created_at.format("%Y-%m-%d")
                );
            }
            println!("total: {}", users.len());
        }
        UserCommand::Delete { username, yes } => {
            if !yes && !confirm(&format!("delete user '{username}'?"))? {
                println!("cancelled");
                return Ok(());
            }
            anyhow::ensure!(store.delete(&username).await?, "user '{username}' not found");
            println!("deleted user '{username}'");
        }
        UserCommand::Password {
            username,
            new_password,
        } => {
            anyhow::ensure!(
                auth.change_password(&username, &new_password).await?,
                "user '{username}' not found"
            );
            println!("password updated for '{username}'");
        }
        UserCommand::Hash { .. } => {}
    }
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    use std::io::Write;
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
        let mut full = vec!["fxmacro", "analyze"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Analyze(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_toggles_means_full_run_over_all_pairs() {
        let args = analyze_args(&[]);
        assert_eq!(args.options(), AnalysisOptions::full());
        assert_eq!(args.pairs().unwrap().len(), 19);
    }

    #[test]
    fn toggles_and_pairs_are_respected() {
        let args = analyze_args(&[
            "--macro",
            "--llm",
            "--pairs",
            "EUR/USD,GBP/JPY",
            "--link",
            "https://a.test",
            "--link",
            "https://b.test",
        ]);
        let o = args.options();
        assert!(o.macro_data && o.llm && !o.news && !o.links);
        assert_eq!(args.pairs().unwrap().len(), 2);
        assert_eq!(args.link.len(), 2);
    }

    #[test]
    fn username_requires_password() {
        assert!(Cli::try_parse_from(["fxmacro", "analyze", "--username", "u"]).is_err());
    }

    #[test]
    fn rejects_unsupported_pairs() {
        let args = analyze_args(&["--pairs", "USD/EUR"]);
        assert!(args.pairs().is_err());
    }
}
