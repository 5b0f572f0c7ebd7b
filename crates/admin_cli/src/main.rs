use std::{error::Error, io::Write};

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::Engine;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "chiplog_admin")]
#[command(about = "Admin utilities for chiplog (operator hash, tenant bootstrap)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./chiplog.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hash a password for the `[operator]` section of settings.toml.
    HashPassword,
    Tenant(Tenant),
}

#[derive(Args, Debug)]
struct Tenant {
    #[command(subcommand)]
    command: TenantCommand,
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    Create(TenantCreateArgs),
    List,
}

#[derive(Args, Debug)]
struct TenantCreateArgs {
    /// Subdomain label, lowercase `[a-z0-9-]`, 3-30 chars.
    #[arg(long)]
    name: String,
    #[arg(long)]
    admin_username: String,
    #[arg(long)]
    owner_id: Option<String>,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.len() < 8 {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must be at least 8 characters.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

fn hash_password(password: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| format!("hashing failed: {err}"))?;
    Ok(hash.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Command::HashPassword => {
            let password = prompt_password_twice()?;
            println!("{}", hash_password(&password)?);
        }
        Command::Tenant(Tenant {
            command: TenantCommand::Create(args),
        }) => {
            let db = connect_db(&cli.database_url).await?;
            let engine = Engine::builder().database(db).build();

            let password = prompt_password_twice()?;
            let hash = hash_password(&password)?;

            let tenant = engine
                .create_tenant(
                    &args.name,
                    args.owner_id,
                    &args.admin_username,
                    &hash,
                    "admin_cli",
                )
                .await?;
            println!("created tenant: {} ({})", tenant.name, tenant.id);
        }
        Command::Tenant(Tenant {
            command: TenantCommand::List,
        }) => {
            let db = connect_db(&cli.database_url).await?;
            let engine = Engine::builder().database(db).build();

            for tenant in engine.list_tenants().await? {
                println!("{}\t{}\t{}", tenant.name, tenant.id, tenant.created_at);
            }
        }
    }

    Ok(())
}
