use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use client::app::App;
use client::config::{ClientConfig, SessionPersistence};
use client::net::api::ApiError;
use client::net::types::{BillingCycle, Credential, Subscription};
use client::pages::blog::{BlogPage, BlogPostPage};
use client::pages::dashboard::DashboardPage;
use client::pages::login::{LoginPage, PROVIDERS, query_param};
use client::pages::profile::ProfilePage;
use client::pages::tools::ToolsPage;
use client::pages::{PageContext, sign_out};
use client::routes::Route;
use client::state::auth::AuthEvent;
use client::state::credentials::MemoryCredentials;
use client::state::gate::{GateError, GateState, Navigator};
use client::state::ui::{NoticeLevel, Notices};
use client::util::billing::{days_until, format_won, is_payment_soon};
use client::util::catalog::CategoryFilter;
use client::util::forms::SubscriptionForm;
use time::{Date, OffsetDateTime};
use url::Url;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `cys login`")]
    NotSignedIn,
    #[error("sign-in failed: {0}")]
    SignIn(String),
    #[error("callback URL carries no access_token; paste the full /dashboard#... address")]
    MissingTokens,
    #[error("server rejected the pasted session")]
    SessionRejected,
    #[error("unknown provider `{0}`")]
    UnknownProvider(String),
    #[error("invalid {field}: {value}")]
    InvalidArgument { field: &'static str, value: String },
    #[error("no subscription with id {0}")]
    NoSuchSubscription(Uuid),
    #[error("post `{0}` not found")]
    NoSuchPost(String),
    #[error("view redirected to {0}")]
    Redirected(Route),
    #[error("view did not settle")]
    Unsettled,
    #[error("{0}")]
    Gate(#[from] GateError),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("request failed; see notices above")]
    ActionFailed,
    #[error("auth event channel closed")]
    EventsClosed,
}

#[derive(Parser, Debug)]
#[command(name = "cys", about = "ChekYourSub subscription tracker CLI")]
struct Cli {
    #[arg(long, env = "CYS_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Credential file; defaults to `$HOME/.chekyoursub/credentials.json`.
    #[arg(long, env = "CYS_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Use this access token for one invocation without touching the credential file.
    #[arg(long, env = "CYS_SESSION_TOKEN")]
    session_token: Option<String>,

    /// Keep the session in memory only.
    #[arg(long, env = "CYS_EPHEMERAL")]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Login(LoginArgs),
    Logout,
    Whoami,
    Rename {
        username: String,
    },
    Subs(SubsCommand),
    Tools {
        #[arg(long, default_value = "")]
        query: String,
        /// Category name or ID.
        #[arg(long)]
        category: Option<String>,
    },
    Posts {
        #[arg(long, default_value = "")]
        query: String,
        /// Tag name.
        #[arg(long)]
        tag: Option<String>,
    },
    Post {
        slug: String,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Only print the URL for this provider.
    #[arg(long)]
    provider: Option<String>,

    /// Address the browser landed on after sign-in.
    #[arg(long)]
    callback_url: Option<String>,
}

#[derive(Args, Debug)]
struct SubsCommand {
    #[command(subcommand)]
    command: SubsSubcommand,
}

#[derive(Subcommand, Debug)]
enum SubsSubcommand {
    List,
    Summary,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "monthly")]
        cycle: String,
        /// `YYYY-MM-DD`; defaults to today.
        #[arg(long)]
        next_payment: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        cycle: Option<String>,
        #[arg(long)]
        next_payment: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Delete {
        id: Uuid,
    },
}

/// Logs navigation requests; outcomes are read from the returned view state.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &Route) {
        tracing::debug!(%route, "navigate");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(tracing::Level::WARN).init();
    let cli = Cli::parse();

    let app = start_app(&cli);
    let ctx = app.context(Arc::new(TerminalNavigator));
    let result = match cli.command {
        Command::Ping => run_ping(&app).await,
        Command::Login(args) => run_login(&app, ctx, args).await,
        Command::Logout => run_logout(&ctx).await,
        Command::Whoami => run_whoami(ctx).await,
        Command::Rename { username } => run_rename(ctx, &username).await,
        Command::Subs(subs) => run_subs(ctx, subs).await,
        Command::Tools { query, category } => run_tools(ctx, &query, category.as_deref()).await,
        Command::Posts { query, tag } => run_posts(ctx, &query, tag.as_deref()).await,
        Command::Post { slug } => run_post(ctx, slug).await,
    };
    app.shutdown().await;
    result
}

fn start_app(cli: &Cli) -> App {
    let mut config = ClientConfig::from_env();
    config.base_url = cli.base_url.trim_end_matches('/').to_owned();
    if cli.ephemeral {
        config.persistence = SessionPersistence::Ephemeral;
    } else if let Some(path) = &cli.credentials {
        config.persistence = SessionPersistence::Persistent(path.clone());
    }

    match &cli.session_token {
        Some(token) => {
            let credential = Credential { access_token: token.clone(), refresh_token: String::new() };
            App::with_credentials(config, Arc::new(MemoryCredentials::with(credential)))
        }
        None => App::start(config),
    }
}

async fn run_ping(app: &App) -> Result<(), CliError> {
    app.api.health().await?;
    println!("ok {}", app.config.base_url);
    Ok(())
}

async fn run_login(app: &App, ctx: PageContext, args: LoginArgs) -> Result<(), CliError> {
    let Some(url) = args.callback_url else {
        let page = LoginPage::new(ctx, None);
        for (id, label) in PROVIDERS {
            if args.provider.as_deref().is_some_and(|p| p != id) {
                continue;
            }
            if let Some(link) = page.sign_in_url(id) {
                println!("{label:<8} {link}");
            }
        }
        if let Some(provider) = args.provider.filter(|p| page.sign_in_url(p).is_none()) {
            return Err(CliError::UnknownProvider(provider));
        }
        println!("\nOpen a link, then run `cys login --callback-url '<address you land on>'`.");
        return Ok(());
    };

    let (query, fragment) = split_callback(&url)?;
    let page = LoginPage::new(ctx, query.as_deref());
    if let Some(code) = page.error() {
        return Err(CliError::SignIn(code.to_owned()));
    }
    let credential = callback_credential(&fragment).ok_or(CliError::MissingTokens)?;
    let info = app.api.session_info(&credential).await?.ok_or(CliError::SessionRejected)?;
    let session = info.into_session(credential);
    let name = display_name(session.user.username.as_deref(), session.user.email.as_deref());
    println!("signed in as {name} via {}", session.user.provider);
    app.events().send(AuthEvent::SignedIn(session)).map_err(|_| CliError::EventsClosed)
}

async fn run_logout(ctx: &PageContext) -> Result<(), CliError> {
    ctx.auth.initialize().await;
    let notices = Notices::default();
    sign_out(ctx, &notices).await;
    print_notices(&notices);
    println!("signed out");
    Ok(())
}

async fn run_whoami(ctx: PageContext) -> Result<(), CliError> {
    let provider = {
        let state = ctx.auth.initialize().await;
        state.session().map(|s| s.user.provider.clone())
    };
    let page = ProfilePage::new(ctx);
    let profile = settle(page.open().await, &page.notices)?.ok_or(CliError::ActionFailed)?;
    println!("id       {}", profile.id);
    println!("name     {}", display_name(profile.username.as_deref(), profile.email.as_deref()));
    println!("email    {}", profile.email.as_deref().unwrap_or("-"));
    println!("provider {}", provider.as_deref().unwrap_or("-"));
    if profile.is_admin {
        println!("role     admin");
    }
    Ok(())
}

async fn run_rename(ctx: PageContext, username: &str) -> Result<(), CliError> {
    let page = ProfilePage::new(ctx);
    settle(page.open().await, &page.notices)?;
    let ok = page.rename(username).await;
    finish(ok, &page.notices)
}

async fn run_subs(ctx: PageContext, subs: SubsCommand) -> Result<(), CliError> {
    let today = OffsetDateTime::now_utc().date();
    let page = DashboardPage::new(ctx);
    settle(page.open().await, &page.notices)?;

    match subs.command {
        SubsSubcommand::List => {
            for sub in page.subscriptions() {
                print_subscription(&sub, today);
            }
            Ok(())
        }
        SubsSubcommand::Summary => {
            let totals = page.totals();
            println!("monthly  {}", format_won(totals.monthly));
            println!("yearly   {}", format_won(totals.yearly));
            let upcoming = page.upcoming(today);
            if !upcoming.is_empty() {
                println!("\nupcoming");
                for sub in upcoming {
                    print_subscription(&sub, today);
                }
            }
            Ok(())
        }
        SubsSubcommand::Add { name, amount, cycle, next_payment, notes } => {
            let mut form = SubscriptionForm::blank(today);
            form.service_name = name;
            form.amount = amount;
            form.billing_cycle = parse_cycle(&cycle)?;
            if let Some(date) = next_payment {
                form.next_payment_date = date;
            }
            form.notes = notes.unwrap_or_default();
            let ok = page.save(None, &form).await;
            finish(ok, &page.notices)
        }
        SubsSubcommand::Edit { id, name, amount, cycle, next_payment, notes } => {
            let current = page
                .subscriptions()
                .into_iter()
                .find(|s| s.id == id)
                .ok_or(CliError::NoSuchSubscription(id))?;
            let mut form = SubscriptionForm::from_row(&current);
            if let Some(name) = name {
                form.service_name = name;
            }
            if let Some(amount) = amount {
                form.amount = amount;
            }
            if let Some(cycle) = cycle {
                form.billing_cycle = parse_cycle(&cycle)?;
            }
            if let Some(date) = next_payment {
                form.next_payment_date = date;
            }
            if let Some(notes) = notes {
                form.notes = notes;
            }
            let ok = page.save(Some(id), &form).await;
            finish(ok, &page.notices)
        }
        SubsSubcommand::Delete { id } => {
            let ok = page.delete(id).await;
            finish(ok, &page.notices)
        }
    }
}

async fn run_tools(ctx: PageContext, query: &str, category: Option<&str>) -> Result<(), CliError> {
    let page = ToolsPage::new(ctx);
    let data = settle(page.open().await, &page.notices)?;
    let filter = match category {
        None => CategoryFilter::All,
        Some(raw) => match data.categories.iter().find(|c| c.name.eq_ignore_ascii_case(raw.trim())) {
            Some(found) => CategoryFilter::Only(found.id),
            None => CategoryFilter::parse(raw)
                .ok_or_else(|| CliError::InvalidArgument { field: "category", value: raw.to_owned() })?,
        },
    };
    for tool in page.visible(query, filter) {
        let category = data.category_name(&tool).unwrap_or_else(|| "-".to_owned());
        println!("{:<24} [{category}] {}", tool.name, tool.website_url.as_deref().unwrap_or(""));
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
    }
    Ok(())
}

async fn run_posts(ctx: PageContext, query: &str, tag: Option<&str>) -> Result<(), CliError> {
    let page = BlogPage::new(ctx);
    let data = settle(page.open().await, &page.notices)?;
    let tag = match tag {
        None => None,
        Some(name) => Some(
            data.tags
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
                .map(|t| t.id)
                .ok_or_else(|| CliError::InvalidArgument { field: "tag", value: name.to_owned() })?,
        ),
    };
    for post in page.visible(query, tag) {
        let tags = data.tag_names(&post).join(", ");
        println!("{}  {:<40} {}", post.created_at.date(), post.slug, post.title);
        if !tags.is_empty() {
            println!("    #{tags}");
        }
    }
    Ok(())
}

async fn run_post(ctx: PageContext, slug: String) -> Result<(), CliError> {
    let page = BlogPostPage::new(ctx, slug.clone());
    let state = page.open().await;
    let post = match settle(state, &page.notices) {
        Ok(Some(post)) => post,
        Ok(None) | Err(CliError::Redirected(Route::Blog)) => return Err(CliError::NoSuchPost(slug)),
        Err(e) => return Err(e),
    };
    println!("{}\n", post.title);
    if !post.summary.is_empty() {
        println!("{}\n", post.summary);
    }
    println!("{}", post.content);
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Print queued notices, then turn a settled view into its data or an error.
fn settle<T>(state: GateState<T>, notices: &Notices) -> Result<T, CliError> {
    print_notices(notices);
    match state {
        GateState::Ready(data) => Ok(data),
        GateState::Redirecting(Route::Auth) => Err(CliError::NotSignedIn),
        GateState::Redirecting(route) => Err(CliError::Redirected(route)),
        GateState::Error(e) => Err(CliError::Gate(e)),
        GateState::WaitingForResolution | GateState::CheckingRole | GateState::LoadingData => Err(CliError::Unsettled),
    }
}

fn finish(ok: bool, notices: &Notices) -> Result<(), CliError> {
    print_notices(notices);
    if ok { Ok(()) } else { Err(CliError::ActionFailed) }
}

fn print_notices(notices: &Notices) {
    for notice in notices.drain() {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {}: {}", notice.title, notice.description);
    }
}

fn print_subscription(sub: &Subscription, today: Date) {
    let soon = if is_payment_soon(sub, today) { "*" } else { " " };
    println!(
        "{soon} {}  {:<20} {:>12} {:<4} {} (D-{})",
        sub.id,
        sub.service_name,
        format_won(sub.amount),
        sub.billing_cycle.label(),
        sub.next_payment_date,
        days_until(sub, today),
    );
}

fn parse_cycle(raw: &str) -> Result<BillingCycle, CliError> {
    BillingCycle::parse(raw.trim()).ok_or_else(|| CliError::InvalidArgument { field: "cycle", value: raw.to_owned() })
}

fn display_name<'a>(username: Option<&'a str>, email: Option<&'a str>) -> &'a str {
    username.or(email).unwrap_or("(no name)")
}

/// Split a pasted address into its query string and fragment.
fn split_callback(raw: &str) -> Result<(Option<String>, String), CliError> {
    let url = Url::parse(raw.trim())
        .map_err(|_| CliError::InvalidArgument { field: "callback-url", value: raw.to_owned() })?;
    Ok((url.query().map(str::to_owned), url.fragment().unwrap_or_default().to_owned()))
}

/// Token pair from a `/dashboard#access_token=..&refresh_token=..` fragment.
fn callback_credential(fragment: &str) -> Option<Credential> {
    let access_token = query_param(fragment, "access_token").filter(|t| !t.is_empty())?;
    let refresh_token = query_param(fragment, "refresh_token").unwrap_or_default();
    Some(Credential { access_token, refresh_token })
}
