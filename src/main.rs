use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::EnvFilter;

use parlour_desk::model::Role;
use parlour_desk::validate::LoginForm;
use parlour_desk::{cache::keys, guard, Config, ParlourClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let file_appender = rolling::daily("logs", "app.log");
    let (writer, _guard) = non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .pretty()
        .init();

    let config = Config::from_env();
    let client = ParlourClient::init(config)?;

    // Resume the previous session if the cookies still hold, otherwise sign
    // in with the operator credentials from the environment.
    let user = match client.check_session().await {
        Ok(user) => user,
        Err(_) => {
            let (Ok(email), Ok(password)) = (
                std::env::var("PARLOUR_EMAIL"),
                std::env::var("PARLOUR_PASSWORD"),
            ) else {
                anyhow::bail!("no live session and PARLOUR_EMAIL/PARLOUR_PASSWORD are not set");
            };
            client
                .login(LoginForm { email, password })
                .await
                .context("sign-in failed")?
        }
    };
    info!(user = %user.email, home = guard::home_for(user.role), "signed in");

    client.start_attendance_listener();
    let _today = client.observe(&keys::employees_today());

    match user.role {
        Role::Admin => {
            let stats = client.dashboard_stats().await?;
            info!(
                employees = stats.total_employees,
                active_tasks = stats.active_tasks,
                present_today = stats.present_today,
                "dashboard"
            );
        }
        Role::Employee => {
            let logs = client.my_attendance().await?;
            let tasks = client.my_tasks().await?;
            info!(logs = logs.len(), tasks = tasks.len(), "attendance view");
        }
    }

    client.dispose();
    Ok(())
}
