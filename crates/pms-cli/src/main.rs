//! PMS - a terminal client for the property management service.
//!
//! Logs in against the backend, keeps the session alive in the background
//! and exposes the tenant and landlord screens as one-shot commands.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pms_core::auth::GUEST_USERNAME;
use pms_core::models::{
    ApplicationReview, Attachment, MaintenanceApproval, NewMaintenanceRequest, Registration,
    UserType, VacateNotice,
};
use pms_core::{App, Config, Credentials, GateDecision, LoginError, Route};

// ============================================================================
// Constants
// ============================================================================

/// Rolling log file name prefix (a date suffix is appended daily)
const LOG_FILE: &str = "pms.log";

/// Commands that go through the authenticated route guard
const AUTHENTICATED_COMMANDS: &[&str] = &[
    "properties",
    "apply",
    "overview",
    "report",
    "vacate",
    "dashboard",
    "applications",
    "approve",
    "budget",
    "maintenance",
    "notifications",
    "read",
];

const USAGE: &str = "\
Usage: pms <command> [args]

Session:
  login [email]                 Log in (password is prompted)
  logout                        End the session and forget the saved tokens
  status                        Show who is logged in
  refresh                       Renew the access token now
  keepalive                     Stay running and renew tokens until Ctrl+C
  route <path>                  Show what the route guard decides for a path

Account:
  register <email> <first> <last> <tenant|landlord>
  reset-request <email>         Email a password reset link
  reset-complete <link-path>    Set a new password from a reset link

Tenant:
  properties                    List properties
  apply <property-id>           Apply to rent a property
  overview                      Profile, notifications and maintenance requests
  report <property-id> <type> <severity> <description> [files...]
  vacate <YYYY-MM-DD> <reason>  Give notice to vacate

Landlord:
  dashboard                     Properties, tenants and open maintenance
  applications                  List rental applications
  approve <tenant-email> <property-id>
  budget <property-id> <tenant-id> <amount>
  maintenance                   List maintenance requests
  notifications                 List notifications
  read <notification-id>        Mark a notification read
";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by RUST_LOG (default `warn`). When file
/// logging is enabled a daily rolling log is written under the cache dir;
/// the returned guard must live until exit so buffered lines get flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: failed to load config ({}), using defaults", e);
            let mut config = Config::default();
            config.apply_env();
            config
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprint!("{}", USAGE);
        return Ok(());
    };
    if matches!(command, "help" | "-h" | "--help") {
        print!("{}", USAGE);
        return Ok(());
    }

    let config = load_config();
    let log_dir = if config.log_to_file {
        config.cache_dir().ok()
    } else {
        None
    };
    let _log_guard = init_tracing(log_dir.as_deref());
    info!(command, api_url = %config.api_url, "PMS starting");

    let mut app = App::start(config).await?;
    let result = run(&mut app, command, &args[1..]).await;
    app.shutdown().await;

    info!("PMS shutting down");
    result
}

async fn run(app: &mut App, command: &str, args: &[String]) -> Result<()> {
    match command {
        "login" => login(app, args.first().cloned()).await,
        "logout" => {
            app.logout().await;
            println!("Logged out.");
            Ok(())
        }
        "status" | "whoami" => status(app).await,
        "refresh" => {
            let outcome = app.session().refresh().await;
            println!("Refresh: {:?}", outcome);
            status(app).await
        }
        "keepalive" => keepalive(app).await,
        "route" => {
            let path = arg(args, 0, "path")?;
            let route = Route::parse(path);
            match app.gate(&route).await {
                GateDecision::Render => println!("{} -> render", route),
                GateDecision::Redirect(to) => println!("{} -> redirect to {}", route, to),
                GateDecision::Pending => println!("{} -> loading", route),
            }
            Ok(())
        }
        "register" => register(app, args).await,
        "reset-request" => {
            let email = arg(args, 0, "email")?;
            app.request_password_reset(email).await?;
            println!("If an account exists for {}, a reset link is on its way.", email);
            Ok(())
        }
        "reset-complete" => reset_complete(app, args).await,
        _ if AUTHENTICATED_COMMANDS.contains(&command) => {
            authenticated_command(app, command, args).await
        }
        other => {
            eprint!("{}", USAGE);
            bail!("Unknown command: {}", other);
        }
    }
}

/// Commands that need a logged-in user.
async fn authenticated_command(app: &App, command: &str, args: &[String]) -> Result<()> {
    if let GateDecision::Redirect(to) = app.gate(&Route::Dashboard).await {
        bail!("Not logged in (go to {}). Run `pms login` first.", to);
    }
    let api = app.api().await;
    let identity = app.session().identity().await;

    match command {
        "properties" => {
            let properties = api.fetch_properties().await?;
            if properties.is_empty() {
                println!("No properties.");
            }
            for property in properties {
                let availability = if property.available { "" } else { " [occupied]" };
                println!("#{} {}{}", property.id, property.summary(), availability);
            }
        }
        "apply" => {
            let property_id = parse_id(arg(args, 0, "property-id")?)?;
            let tenant_id = identity
                .user_id()
                .ok_or_else(|| anyhow!("No user id in session"))?;
            api.apply_for_property(property_id, tenant_id).await?;
            println!("Application for property #{} submitted.", property_id);
        }
        "overview" => {
            let overview = api.fetch_tenant_overview().await?;
            let profile = &overview.profile;
            println!("{}", profile.user.full_name());
            match profile.property {
                Some(ref property) => println!("Renting: {}", property.summary()),
                None => println!("Not renting a property yet."),
            }
            if let Some(ref status) = profile.rent_status {
                println!("Rent status: {}", status);
            }
            if let Some(ref arrears) = profile.arrears {
                println!("Arrears: {}", arrears);
            }
            println!("\nNotifications ({}):", overview.notifications.len());
            for notification in &overview.notifications {
                println!("  {}", notification.headline());
            }
            println!("\nMaintenance requests ({}):", overview.maintenance_requests.len());
            for request in &overview.maintenance_requests {
                println!("  [{}] {} - {}", request.status, request.kind.as_str(), request.description);
            }
        }
        "report" => {
            let request = NewMaintenanceRequest {
                property_id: parse_id(arg(args, 0, "property-id")?)?,
                kind: arg(args, 1, "type")?.parse().map_err(|e: String| anyhow!(e))?,
                severity: arg(args, 2, "severity")?.parse().map_err(|e: String| anyhow!(e))?,
                description: arg(args, 3, "description")?.to_string(),
                images: args
                    .iter()
                    .skip(4)
                    .filter(|p| !is_video(p))
                    .map(|p| Attachment::from_path(Path::new(p)))
                    .collect::<Result<Vec<_>>>()?,
                video: args
                    .iter()
                    .skip(4)
                    .find(|p| is_video(p))
                    .map(|p| Attachment::from_path(Path::new(p)))
                    .transpose()?,
            };
            api.submit_maintenance_request(&request).await?;
            println!("Maintenance request submitted.");
        }
        "vacate" => {
            let vacate_date = NaiveDate::parse_from_str(arg(args, 0, "date")?, "%Y-%m-%d")
                .context("Date must be YYYY-MM-DD")?;
            let reason = args.get(1..).map(|r| r.join(" ")).unwrap_or_default();
            api.submit_vacate_notice(&VacateNotice { vacate_date, reason })
                .await?;
            println!("Notice to vacate on {} sent.", vacate_date);
        }
        "dashboard" => {
            let dashboard = api.fetch_landlord_dashboard().await?;
            println!(
                "{} properties, {} occupied, {} open maintenance requests",
                dashboard.properties.len(),
                dashboard.occupied_count(),
                dashboard.open_maintenance_count()
            );
            for entry in &dashboard.properties {
                let tenant = entry
                    .tenant_profile
                    .as_ref()
                    .map(|t| t.user.full_name())
                    .unwrap_or_else(|| "vacant".to_string());
                println!("  #{} {} - {}", entry.property.id, entry.property.title, tenant);
            }
        }
        "applications" => {
            for application in api.fetch_applications().await? {
                println!(
                    "property #{} tenant #{} - {:?}",
                    application.property, application.tenant, application.status
                );
            }
        }
        "approve" => {
            let review = ApplicationReview {
                tenant_email: arg(args, 0, "tenant-email")?.to_string(),
                property: parse_id(arg(args, 1, "property-id")?)?,
            };
            api.approve_application(&review).await?;
            println!("Application approved.");
        }
        "budget" => {
            let approval = MaintenanceApproval {
                property: parse_id(arg(args, 0, "property-id")?)?,
                tenant: parse_id(arg(args, 1, "tenant-id")?)?,
                budget: arg(args, 2, "amount")?.to_string(),
            };
            api.approve_maintenance(&approval).await?;
            println!("Maintenance budget approved.");
        }
        "maintenance" => {
            for request in api.fetch_maintenance_requests().await? {
                let budget = request.budget.as_deref().unwrap_or("-");
                println!(
                    "[{}] {} ({}) {} budget {}",
                    request.status,
                    request.kind.as_str(),
                    request.severity.as_str(),
                    request.description,
                    budget
                );
            }
        }
        "notifications" => {
            for notification in api.fetch_notifications().await? {
                let marker = if notification.read { " " } else { "*" };
                match notification.id {
                    Some(id) => println!("{} #{} {}", marker, id, notification.headline()),
                    None => println!("{} {}", marker, notification.headline()),
                }
            }
        }
        "read" => {
            let id = parse_id(arg(args, 0, "notification-id")?)?;
            api.mark_notification_read(id).await?;
            println!("Notification #{} marked read.", id);
        }
        other => bail!("Unknown command: {}", other),
    }
    Ok(())
}

async fn login(app: &mut App, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| app.config().last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    match app.login(&Credentials::new(email.clone(), password)).await {
        Ok(route) => {
            app.config_mut().last_email = Some(email);
            if let Err(e) = app.config().save() {
                warn!(error = %e, "Failed to save config");
            }
            status(app).await?;
            println!("Landing on {}", route);
            Ok(())
        }
        Err(LoginError::Rejected(_)) => bail!("Invalid email or password"),
        Err(e) => Err(e.into()),
    }
}

async fn status(app: &App) -> Result<()> {
    let session = app.snapshot().await;
    match session.identity.claims() {
        Some(claims) => {
            let name = claims.full_name();
            let name = if name.is_empty() {
                session.identity.username().to_string()
            } else {
                name
            };
            println!("Logged in as {} <{}> ({})", name, claims.email, claims.user_type);
            if let Some(expires) = claims.expires_at() {
                println!("Access token expires {}", expires.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => println!("Not logged in ({}).", GUEST_USERNAME),
    }
    Ok(())
}

/// Keep the refresher running until Ctrl+C.
async fn keepalive(app: &App) -> Result<()> {
    if !app.snapshot().await.is_authenticated() {
        bail!("Not logged in. Run `pms login` first.");
    }
    println!(
        "Keeping the session alive (refresh every {}s). Press Ctrl+C to stop.",
        app.config().refresh_interval_secs
    );

    let mut statuses = app.session().subscribe();
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                return Ok(());
            }
            changed = statuses.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let status = *statuses.borrow_and_update();
                info!(?status, "Session status changed");
                if !app.snapshot().await.is_authenticated() {
                    bail!("Session ended: the server refused to renew it");
                }
            }
        }
    }
}

async fn register(app: &App, args: &[String]) -> Result<()> {
    let user_type: UserType = arg(args, 3, "tenant|landlord")?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let email = arg(args, 0, "email")?.to_string();
    let password = rpassword::prompt_password("Choose a password: ")?;
    let confirm = rpassword::prompt_password("Repeat password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let registration = Registration {
        email: email.clone(),
        password,
        first_name: arg(args, 1, "first")?.to_string(),
        last_name: arg(args, 2, "last")?.to_string(),
        user_type,
    };
    app.register(&registration).await?;
    println!("Account created for {}. Run `pms login {}`.", email, email);
    Ok(())
}

async fn reset_complete(app: &App, args: &[String]) -> Result<()> {
    let link = Route::parse(arg(args, 0, "link-path")?);
    if let GateDecision::Redirect(to) = app.gate(&link).await {
        bail!("Already logged in (go to {}). Log out to reset a password.", to);
    }
    if !matches!(link, Route::ResetPassword { .. }) {
        bail!("Not a password reset link: {}", link);
    }

    let password = rpassword::prompt_password("New password: ")?;
    let response = app.complete_password_reset(&link, &password).await?;
    println!("Password updated.");
    if !response.is_null() {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing argument <{}>", name))
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Not a valid id: {}", value))
}

fn is_video(path: &str) -> bool {
    let extension = PathBuf::from(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    matches!(extension.as_str(), "mp4" | "mov" | "webm" | "mkv" | "avi")
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("No input given");
    }
    Ok(value)
}
