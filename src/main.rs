use tokio::net::TcpListener;

use banchoserver::config::Config;
use banchoserver::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banchoserver=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let db = banchoserver::db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let port = config.port;
    let state = AppState::new(db, config);

    match banchoserver::db::permissions::load_groups(&state.db).await {
        Ok(groups) => {
            let count = groups.len();
            for group in groups.into_values() {
                state.permissions.add_group(group);
            }
            if count > 0 {
                tracing::info!("loaded {count} permission group(s)");
            }
        }
        Err(e) => {
            tracing::error!("failed to load permission groups: {e}");
        }
    }

    if let Err(e) = banchoserver::bot::install(&state).await {
        tracing::error!("failed to install resident bot: {e}");
    }

    banchoserver::sweep::spawn(state.clone());

    let app = banchoserver::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let sha = env!("GIT_SHA");
    let channels: Vec<&str> = config.channels.iter().map(|c| c.name.as_str()).collect();

    eprintln!();
    eprintln!("  \x1b[1;36mbancho\x1b[0m \x1b[2mv{version} ({sha})\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m             {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m         {}", config.database_url);
    eprintln!(
        "  \x1b[2msession timeout\x1b[0m  {}s",
        config.session_timeout_secs
    );
    eprintln!("  \x1b[2mchannels\x1b[0m         {}", channels.join(", "));
    eprintln!();
}
