use crate::{
    audit::Audit,
    auth,
    calendar::{self, Notes},
    config::Config,
    directory::{self, UserDirectory, UserEntry, UserForm},
    guard::{Access, RouteGuard},
    profile::{self, Profile, ROLE_ADMIN},
    routes::Route,
    session::{self, SessionRecord, SessionStore},
    storage::FileStorage,
    views, Args,
};
use anyhow::Result;
use chrono::{Local, Timelike};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::PathBuf;

pub struct Context {
    pub args: Args,
    pub config: Config,
    pub data_dir: PathBuf,
    pub session_id: String,
    pub audit: Option<RefCell<Audit>>,
    pub sessions: RefCell<SessionStore<FileStorage>>,
    pub directory: RefCell<UserDirectory<FileStorage>>,
    pub notes: RefCell<Notes>,
    pub route: RefCell<Route>,
    pub calendar_month: RefCell<(i32, u32)>,
    pub tracing: RefCell<bool>,
}

fn audit_with(ctx: &Context, f: impl FnOnce(&mut Audit) -> Result<()>) {
    if let Some(audit) = &ctx.audit {
        if let Err(e) = f(&mut audit.borrow_mut()) {
            eprintln!("Warning: failed to write audit event: {}", e);
        }
    }
}

pub fn run_once(ctx: &Context, command: &str) -> Result<()> {
    let command = command.trim();
    let line = if command.starts_with('/') {
        command.to_string()
    } else {
        format!("/{}", command)
    };
    handle_command(ctx, &line);
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history_path = ctx.data_dir.join("history.txt");
    if ctx.config.portal.history {
        let _ = rl.load_history(&history_path);
    }

    println!("toolbox - type /help for commands, /exit to quit");
    startup_route(&ctx);

    loop {
        let prompt = format!("{}> ", ctx.route.borrow().path());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line.starts_with('/') {
                    if handle_command(&ctx, line) {
                        break;
                    }
                } else {
                    println!("Commands start with '/'. Try /help.");
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if ctx.config.portal.history {
        let _ = rl.save_history(&history_path);
    }
    Ok(())
}

/// Pick the first screen: an existing valid session lands on its dashboard
/// (or the configured default route); everyone else sees the login screen.
fn startup_route(ctx: &Context) {
    let mut guard = RouteGuard::new();
    let access = match guard.resolve(&mut *ctx.sessions.borrow_mut(), None) {
        Ok(access) => access,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    if guard.cleared_corrupt() {
        audit_with(ctx, |a| a.session_cleared());
    }

    match access {
        Access::Granted(p) => {
            let target = ctx
                .config
                .portal
                .default_route
                .as_deref()
                .and_then(Route::parse)
                .unwrap_or_else(|| auth::landing_route(&p.role));
            navigate(ctx, target);
        }
        _ => {
            *ctx.route.borrow_mut() = Route::Login;
            views::login_screen();
        }
    }
}

/// Move to a route through the guard. Public routes render directly;
/// everything else is re-resolved against the session store, and a denial
/// lands on the guard's redirect target instead.
pub fn navigate(ctx: &Context, target: Route) {
    if target.is_public() {
        *ctx.route.borrow_mut() = target;
        render(ctx, target, None);
        return;
    }

    let required = target.required_role();
    let mut guard = RouteGuard::new();
    let access = match guard.resolve(&mut *ctx.sessions.borrow_mut(), required) {
        Ok(access) => access,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    if guard.cleared_corrupt() {
        audit_with(ctx, |a| a.session_cleared());
    }
    if *ctx.tracing.borrow() {
        println!(
            "[guard] {} -> {} (required role: {})",
            target,
            access.as_str(),
            required.unwrap_or("none")
        );
    }
    audit_with(ctx, |a| a.access(target.path(), access.as_str(), required));

    match access {
        Access::Granted(p) => {
            *ctx.route.borrow_mut() = target;
            render(ctx, target, Some(&p));
        }
        Access::Denied { redirect } => {
            println!("Access denied, redirecting to {}", redirect);
            *ctx.route.borrow_mut() = redirect;
            render(ctx, redirect, None);
        }
        Access::Pending => {}
    }
}

fn render(ctx: &Context, route: Route, profile: Option<&Profile>) {
    match route {
        Route::Login => views::login_screen(),
        Route::Unauthorized => views::unauthorized(),
        Route::AdminDashboard => match ctx.directory.borrow_mut().load() {
            Ok(users) => views::admin_dashboard(&users),
            Err(e) => eprintln!("Error: {}", e),
        },
        Route::UserDashboard => match ctx.directory.borrow_mut().load() {
            Ok(users) => {
                let user = directory::primary_user(&users)
                    .cloned()
                    .unwrap_or_else(views::guest_user);
                views::user_dashboard(&user, Local::now().hour());
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        Route::UserProfile => {
            if let Some(p) = profile {
                views::profile_card(p);
                println!();
                let (year, month) = *ctx.calendar_month.borrow();
                views::calendar(year, month, &ctx.notes.borrow(), Local::now().date_naive());
            }
        }
    }
}

/// Resolve the guard for a command surface that is not itself a route.
/// Returns the profile on success; on denial, follows the redirect.
fn require_role(ctx: &Context, required: Option<&str>) -> Option<Profile> {
    let mut guard = RouteGuard::new();
    let access = match guard.resolve(&mut *ctx.sessions.borrow_mut(), required) {
        Ok(access) => access,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };
    if guard.cleared_corrupt() {
        audit_with(ctx, |a| a.session_cleared());
    }

    match access {
        Access::Granted(p) => Some(p),
        Access::Denied { redirect } => {
            println!("Access denied, redirecting to {}", redirect);
            *ctx.route.borrow_mut() = redirect;
            render(ctx, redirect, None);
            None
        }
        Access::Pending => None,
    }
}

fn handle_command(ctx: &Context, cmd: &str) -> bool {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let rest = if parts.len() > 1 { parts[1] } else { "" };
    match parts[0] {
        "/exit" | "/quit" => return true,
        "/help" => {
            println!("Commands:");
            println!("  /exit                 - quit");
            println!("  /help                 - show commands");
            println!("  /session              - show session info");
            println!("  /routes               - list portal routes");
            println!("  /trace                - toggle guard tracing");
            println!("Account:");
            println!("  /login <username> <password>");
            println!("  /logout");
            println!("  /whoami               - show the derived profile");
            println!("  /open <route>         - navigate to a route");
            println!("Directory (admin):");
            println!("  /users [list]         - user-management table");
            println!("  /users add key=value...");
            println!("  /users edit <#|id> key=value...   (blank password keeps the stored one)");
            println!("  /users rm <#|id>");
            println!("  Fields: username fullName password role position department phoneNumber email");
            println!("Calendar:");
            println!("  /calendar [YYYY-MM|next|prev]");
            println!("  /note <YYYY-M-D> [text]           (blank text clears the note)");
        }
        "/session" => {
            println!("Session: {}", ctx.session_id);
            match &ctx.audit {
                Some(audit) => println!("Audit log: {:?}", audit.borrow().path),
                None => println!("Audit log: disabled"),
            }
            println!("Route: {}", ctx.route.borrow());
            match ctx.sessions.borrow_mut().load() {
                Ok(loaded) => match loaded.record() {
                    Some(record) => {
                        println!("Logged in as {} (token {})", record.username, record.token)
                    }
                    None => println!("Not logged in"),
                },
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        "/routes" => print_routes(),
        "/trace" => {
            let mut t = ctx.tracing.borrow_mut();
            *t = !*t;
            println!("Guard tracing: {}", if *t { "on" } else { "off" });
        }
        "/login" => handle_login(ctx, rest),
        "/logout" => handle_logout(ctx),
        "/whoami" => handle_whoami(ctx),
        "/open" => {
            let target = rest.trim();
            match Route::parse(target) {
                Some(route) => navigate(ctx, route),
                None => {
                    if target.is_empty() {
                        println!("Usage: /open <route>");
                    } else {
                        println!("Unknown route: {}", target);
                    }
                    print_routes();
                }
            }
        }
        "/users" => handle_users_command(ctx, rest),
        "/calendar" => handle_calendar_command(ctx, rest),
        "/note" => handle_note_command(ctx, rest),
        _ => println!("Unknown command: {}", parts[0]),
    }
    false
}

pub fn print_routes() {
    println!("Routes:");
    for route in Route::all() {
        let access = if route.is_public() {
            "public".to_string()
        } else {
            match route.required_role() {
                Some(role) => format!("role: {}", role),
                None => "any session".to_string(),
            }
        };
        println!("  {:<24} ({})", route.path(), access);
    }
}

fn handle_login(ctx: &Context, args: &str) {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let username = parts.first().copied().unwrap_or("");
    let password = parts.get(1).copied().unwrap_or("");

    let users = match ctx.directory.borrow_mut().load() {
        Ok(users) => users,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    match auth::authenticate(&users, username, password) {
        Ok(granted) => {
            let record = SessionRecord {
                username: granted.username.clone(),
                token: session::new_token(),
            };
            if let Err(e) = ctx.sessions.borrow_mut().save(&record) {
                eprintln!("Error: {}", e);
                return;
            }
            audit_with(ctx, |a| a.login_ok(&granted.username, &granted.role));
            println!("Logged in as {} ({})", granted.username, granted.role);
            navigate(ctx, auth::landing_route(&granted.role));
        }
        Err(e) => {
            audit_with(ctx, |a| a.login_failed(username, &e.to_string()));
            println!("Login failed: {}", e);
        }
    }
}

fn handle_logout(ctx: &Context) {
    let username = match ctx.sessions.borrow_mut().load() {
        Ok(loaded) => loaded.record().map(|r| r.username),
        Err(_) => None,
    };
    if let Err(e) = ctx.sessions.borrow_mut().clear() {
        eprintln!("Error: {}", e);
        return;
    }
    match username {
        Some(username) => {
            audit_with(ctx, |a| a.logout(&username));
            println!("Logged out {}", username);
        }
        None => println!("Not logged in."),
    }
    navigate(ctx, Route::Login);
}

fn handle_whoami(ctx: &Context) {
    let derived = match profile::derive(&mut *ctx.sessions.borrow_mut()) {
        Ok(derived) => derived,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    if derived.cleared_corrupt {
        audit_with(ctx, |a| a.session_cleared());
    }
    match derived.profile {
        Some(p) => {
            println!("{} <{}>", p.name, p.email);
            println!("  id: {}  role: {}  token: {}", p.id, p.role, p.token);
            println!("  {} / {}", p.title, p.department);
        }
        None => println!("Not logged in."),
    }
}

fn handle_users_command(ctx: &Context, args: &str) {
    // The whole surface is admin-only; gate before touching the directory.
    let Some(_admin) = require_role(ctx, Some(ROLE_ADMIN)) else {
        return;
    };

    let parts: Vec<&str> = args.splitn(2, ' ').collect();
    let sub_args = if parts.len() > 1 { parts[1] } else { "" };
    match parts[0].trim() {
        "" | "list" => render(ctx, Route::AdminDashboard, None),
        "add" => handle_user_add(ctx, sub_args),
        "edit" => handle_user_edit(ctx, sub_args),
        "rm" => handle_user_rm(ctx, sub_args),
        other => {
            println!("Unknown subcommand: {}", other);
            println!("Usage: /users [list|add|edit|rm]");
        }
    }
}

/// Apply `key=value` tokens onto a form.
fn parse_form(tokens: &[String], mut form: UserForm) -> Result<UserForm, String> {
    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            return Err(format!("Expected key=value, got '{}'", token));
        };
        match key {
            "username" => form.username = value.to_string(),
            "fullName" | "full_name" => form.full_name = value.to_string(),
            "email" => form.email = value.to_string(),
            "role" => form.role = value.to_string(),
            "position" => form.position = value.to_string(),
            "department" => form.department = value.to_string(),
            "phoneNumber" | "phone_number" | "phone" => form.phone_number = value.to_string(),
            "password" => form.password = value.to_string(),
            _ => return Err(format!("Unknown field '{}'", key)),
        }
    }
    Ok(form)
}

/// Accept either a row number from the table or an entry id.
fn resolve_target(users: &[UserEntry], target: &str) -> Option<String> {
    if let Ok(index) = target.parse::<usize>() {
        if let Some(entry) = users.get(index) {
            return Some(entry.id.clone());
        }
    }
    users.iter().find(|u| u.id == target).map(|u| u.id.clone())
}

fn handle_user_add(ctx: &Context, args: &str) {
    let tokens = match shell_words::split(args) {
        Ok(tokens) => tokens,
        Err(e) => {
            println!("Invalid arguments: {}", e);
            return;
        }
    };
    if tokens.is_empty() {
        println!("Usage: /users add username=... fullName=... password=... ...");
        return;
    }

    let base = UserForm {
        role: "user".to_string(),
        ..UserForm::default()
    };
    let form = match parse_form(&tokens, base) {
        Ok(form) => form,
        Err(msg) => {
            println!("{}", msg);
            return;
        }
    };
    if let Err(errors) = form.validate(false) {
        println!("Cannot save user:");
        for error in errors {
            println!("  {}", error);
        }
        return;
    }

    let mut dir = ctx.directory.borrow_mut();
    let duplicate = match dir.load() {
        Ok(users) => users.iter().any(|u| u.username == form.username),
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    match dir.create(&form) {
        Ok(entry) => {
            drop(dir);
            // Uniqueness is not enforced; surface the collision instead.
            if duplicate {
                println!(
                    "Warning: username '{}' already exists in the directory",
                    entry.username
                );
            }
            audit_with(ctx, |a| a.user_created(&entry.id, &entry.username, duplicate));
            println!("Added user {} ({})", entry.username, entry.id);
            if *ctx.route.borrow() == Route::AdminDashboard {
                render(ctx, Route::AdminDashboard, None);
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_user_edit(ctx: &Context, args: &str) {
    let parts: Vec<&str> = args.trim().splitn(2, ' ').collect();
    if parts[0].is_empty() || parts.len() < 2 {
        println!("Usage: /users edit <#|id> key=value...");
        return;
    }
    let target = parts[0];

    let users = match ctx.directory.borrow_mut().load() {
        Ok(users) => users,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let Some(id) = resolve_target(&users, target) else {
        println!("No user matches '{}'", target);
        return;
    };
    let Some(existing) = users.iter().find(|u| u.id == id) else {
        return;
    };

    let tokens = match shell_words::split(parts[1]) {
        Ok(tokens) => tokens,
        Err(e) => {
            println!("Invalid arguments: {}", e);
            return;
        }
    };
    // Pre-fill from the stored entry; an untouched (or blank) password
    // keeps the stored one.
    let form = match parse_form(&tokens, UserForm::from_entry(existing)) {
        Ok(form) => form,
        Err(msg) => {
            println!("{}", msg);
            return;
        }
    };
    if let Err(errors) = form.validate(true) {
        println!("Cannot save user:");
        for error in errors {
            println!("  {}", error);
        }
        return;
    }

    let result = ctx.directory.borrow_mut().update(&id, &form);
    match result {
        Ok(Some(updated)) => {
            audit_with(ctx, |a| a.user_updated(&updated.id, &updated.username));
            println!("Updated user {} ({})", updated.username, updated.id);
            if *ctx.route.borrow() == Route::AdminDashboard {
                render(ctx, Route::AdminDashboard, None);
            }
        }
        Ok(None) => println!("No user matches '{}'", target),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_user_rm(ctx: &Context, args: &str) {
    let target = args.trim();
    if target.is_empty() {
        println!("Usage: /users rm <#|id>");
        return;
    }

    let users = match ctx.directory.borrow_mut().load() {
        Ok(users) => users,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };
    let Some(id) = resolve_target(&users, target) else {
        println!("No user matches '{}'", target);
        return;
    };
    let Some(entry) = users.iter().find(|u| u.id == id) else {
        return;
    };

    if ctx.config.portal.confirm_delete && !confirm_delete(ctx, entry) {
        println!("Cancelled.");
        return;
    }

    let result = ctx.directory.borrow_mut().delete(&id);
    match result {
        Ok(true) => {
            audit_with(ctx, |a| a.user_deleted(&id));
            println!("Removed user {} ({})", entry.username, id);
            if *ctx.route.borrow() == Route::AdminDashboard {
                render(ctx, Route::AdminDashboard, None);
            }
        }
        Ok(false) => println!("No user matches '{}'", target),
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Prompt before a destructive delete. One-shot mode refuses without
/// `--yes`; `--yes` approves everywhere.
fn confirm_delete(ctx: &Context, entry: &UserEntry) -> bool {
    if ctx.args.yes {
        return true;
    }
    if ctx.args.command.is_some() {
        println!(
            "Refusing to delete '{}' in one-shot mode; pass --yes to confirm.",
            entry.full_name
        );
        return false;
    }

    print!(
        "Delete user '{}'? This cannot be undone. [y/N]: ",
        entry.full_name
    );
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let input = input.trim().to_lowercase();
        input == "y" || input == "yes"
    } else {
        false
    }
}

fn handle_calendar_command(ctx: &Context, args: &str) {
    if require_role(ctx, None).is_none() {
        return;
    }

    let arg = args.trim();
    if !arg.is_empty() {
        if arg == "next" || arg == "prev" {
            let offset = if arg == "next" { 1 } else { -1 };
            let (year, month) = *ctx.calendar_month.borrow();
            *ctx.calendar_month.borrow_mut() = calendar::shift_month(year, month, offset);
        } else if let Some(year_month) = parse_year_month(arg) {
            *ctx.calendar_month.borrow_mut() = year_month;
        } else {
            println!("Usage: /calendar [YYYY-MM|next|prev]");
            return;
        }
    }

    let (year, month) = *ctx.calendar_month.borrow();
    views::calendar(year, month, &ctx.notes.borrow(), Local::now().date_naive());
}

fn parse_year_month(s: &str) -> Option<(i32, u32)> {
    let (year, month) = s.split_once('-')?;
    let year = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

fn handle_note_command(ctx: &Context, args: &str) {
    if require_role(ctx, None).is_none() {
        return;
    }

    let parts: Vec<&str> = args.trim().splitn(2, ' ').collect();
    let Some(date) = calendar::parse_date(parts[0]) else {
        println!("Usage: /note <YYYY-M-D> [text]   (blank text clears the note)");
        return;
    };
    let text = if parts.len() > 1 { parts[1] } else { "" };

    let stored = calendar::save_note(&mut *ctx.notes.borrow_mut(), date, text);
    let key = calendar::note_key(date);
    audit_with(ctx, |a| a.note_saved(&key, stored));
    if stored {
        println!("Saved note for {}: {}", key, text.trim());
    } else {
        println!("Cleared note for {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, username: &str) -> UserEntry {
        UserEntry {
            id: id.to_string(),
            username: username.to_string(),
            full_name: username.to_uppercase(),
            email: String::new(),
            role: "user".to_string(),
            position: "Staff".to_string(),
            department: "Umum".to_string(),
            phone_number: "0812".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn test_parse_form_applies_fields() {
        let tokens: Vec<String> = [
            "username=budi_dharma",
            "fullName=Budi Dharmawan",
            "password=pw1",
            "position=Manager Proyek",
            "department=IT",
            "phoneNumber=0812",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let form = parse_form(
            &tokens,
            UserForm {
                role: "user".to_string(),
                ..UserForm::default()
            },
        )
        .unwrap();
        assert_eq!(form.username, "budi_dharma");
        assert_eq!(form.full_name, "Budi Dharmawan");
        assert_eq!(form.role, "user");
        assert!(form.validate(false).is_ok());
    }

    #[test]
    fn test_parse_form_rejects_unknown_field() {
        let tokens = vec!["nickname=b".to_string()];
        assert!(parse_form(&tokens, UserForm::default()).is_err());
    }

    #[test]
    fn test_parse_form_rejects_bare_token() {
        let tokens = vec!["username".to_string()];
        assert!(parse_form(&tokens, UserForm::default()).is_err());
    }

    #[test]
    fn test_resolve_target_by_index_and_id() {
        let users = vec![entry("aaa", "a"), entry("bbb", "b")];
        assert_eq!(resolve_target(&users, "0").as_deref(), Some("aaa"));
        assert_eq!(resolve_target(&users, "1").as_deref(), Some("bbb"));
        assert_eq!(resolve_target(&users, "bbb").as_deref(), Some("bbb"));
        assert_eq!(resolve_target(&users, "2"), None);
        assert_eq!(resolve_target(&users, "ccc"), None);
    }

    #[test]
    fn test_parse_year_month() {
        assert_eq!(parse_year_month("2025-06"), Some((2025, 6)));
        assert_eq!(parse_year_month("2025-6"), Some((2025, 6)));
        assert_eq!(parse_year_month("2025-13"), None);
        assert_eq!(parse_year_month("june"), None);
    }
}
