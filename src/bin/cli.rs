use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lync::utils::{create_slug, hash_password, utc_now};

#[derive(Parser, Debug)]
#[command(author, version, about = "lync maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Reset the database and load demo users, organizations and events
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::Seed => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            seed(&pool).await?;
            println!("Database seeded");
        }
    }

    Ok(())
}

struct SeedUser {
    id: Uuid,
    name: &'static str,
    email: &'static str,
}

async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    // Clear existing data in dependency order.
    for table in [
        "event_settings",
        "events",
        "players",
        "teams",
        "member_invites",
        "members",
        "organizations",
        "tokens",
        "sports",
        "users",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await
            .with_context(|| format!("failed to clear {table}"))?;
    }

    let password_hash = hash_password("password123")
        .map_err(|err| anyhow::anyhow!("failed to hash seed password: {err}"))?;
    let now = utc_now();

    let users = [
        SeedUser { id: Uuid::new_v4(), name: "John Doe", email: "john.doe@lync.com" },
        SeedUser { id: Uuid::new_v4(), name: "Jane Smith", email: "jane.smith@lync.com" },
        SeedUser { id: Uuid::new_v4(), name: "Mike Johnson", email: "mike.johnson@lync.com" },
        SeedUser { id: Uuid::new_v4(), name: "Sarah Connor", email: "sarah.connor@eliteathletics.com" },
        SeedUser { id: Uuid::new_v4(), name: "Tom Parker", email: "tom.parker@eliteathletics.com" },
    ];

    for user in &users {
        sqlx::query(
            "INSERT INTO users (id, name, email, avatar_url, password_hash, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(user.name)
        .bind(user.email)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    let sports = [
        ("Football", "TEAM", "MATCH"),
        ("Basketball", "TEAM", "SCORE_BASED"),
        ("Running", "INDIVIDUAL", "TIME_TRIAL"),
    ];
    let mut sport_ids = Vec::new();

    for (name, sport_type, format) in sports {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO sports (id, name, sport_type, competition_format) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(sport_type)
        .bind(format)
        .execute(pool)
        .await?;
        sport_ids.push(id);
    }

    let org1 = seed_organization(
        pool,
        "Lync Sports Club",
        Some("lyncsports.com"),
        true,
        users[0].id,
        &[(users[0].id, "ADMIN"), (users[1].id, "MEMBER"), (users[2].id, "MEMBER")],
    )
    .await?;

    let org2 = seed_organization(
        pool,
        "Elite Athletics",
        Some("eliteathletics.com"),
        false,
        users[1].id,
        &[(users[1].id, "ADMIN"), (users[3].id, "MEMBER"), (users[4].id, "MEMBER")],
    )
    .await?;

    seed_team(
        pool,
        "Lync Wolves",
        "Professional football team",
        users[0].id,
        org1,
        &[(users[0].id, "ADMIN"), (users[1].id, "PLAYER"), (users[2].id, "PLAYER")],
    )
    .await?;

    seed_team(
        pool,
        "Elite Hoops",
        "Basketball championship team",
        users[1].id,
        org2,
        &[(users[1].id, "ADMIN"), (users[3].id, "PLAYER"), (users[4].id, "PLAYER")],
    )
    .await?;

    let event_id = Uuid::new_v4();
    let event_name = "Summer Football Championship";
    sqlx::query(
        "INSERT INTO events (id, name, slug, description, start_date, end_date, owner_id, organization_id, sport_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(event_name)
    .bind(create_slug(event_name))
    .bind("Annual summer football tournament")
    .bind(Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap())
    .bind(Utc.with_ymd_and_hms(2025, 7, 30, 0, 0, 0).unwrap())
    .bind(users[0].id)
    .bind(org1)
    .bind(sport_ids[0])
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO event_settings (id, event_id, slots, players_per_team) VALUES (?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(16)
    .bind(11)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_organization(
    pool: &SqlitePool,
    name: &str,
    domain: Option<&str>,
    attach_by_domain: bool,
    owner_id: Uuid,
    members: &[(Uuid, &str)],
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO organizations (id, name, slug, domain, should_attach_users_by_domain, avatar_url, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, NULL, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(create_slug(name))
    .bind(domain)
    .bind(attach_by_domain)
    .bind(owner_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    for (user_id, role) in members {
        sqlx::query(
            "INSERT INTO members (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(user_id)
        .bind(role)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(id)
}

async fn seed_team(
    pool: &SqlitePool,
    name: &str,
    description: &str,
    owner_id: Uuid,
    organization_id: Uuid,
    players: &[(Uuid, &str)],
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO teams (id, name, slug, description, avatar_url, owner_id, organization_id, created_at, updated_at) VALUES (?, ?, ?, ?, NULL, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(create_slug(name))
    .bind(description)
    .bind(owner_id)
    .bind(organization_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    for (user_id, role) in players {
        sqlx::query(
            "INSERT INTO players (id, team_id, user_id, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(user_id)
        .bind(role)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(id)
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let table_exists = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied_versions: HashSet<i64> = if table_exists.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter()
            .filter_map(|row| row.try_get::<i64, _>("version").ok())
            .collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let applied = applied_versions.contains(&migration.version);
        let status = if applied { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when running from the repo root; fall back to the
    // crate-local folder when the CWD differs (containers, IDE runners).
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
