use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./spendwise.db?mode=rwc";

fn usage() -> ! {
    eprintln!("Usage: migration [up [N]|down [N]|fresh|status]");
    std::process::exit(2);
}

fn steps(arg: Option<String>) -> Option<u32> {
    let raw = arg?;
    match raw.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => usage(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => migration::Migrator::up(&db, steps(args.next())).await?,
        "down" => migration::Migrator::down(&db, steps(args.next()).or(Some(1))).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        _ => usage(),
    }

    Ok(())
}
