use clap::Parser;

/// Insert a user (and optional group memberships) into the bancho
/// database. The credential argument is the digest the client submits at
/// login, not a plaintext password.
#[derive(Parser)]
#[command(name = "bancho-seed")]
struct Args {
    username: String,
    credential_digest: String,
    /// Permission group to add the user to. Repeatable.
    #[arg(long)]
    group: Vec<String>,
    #[arg(long, default_value = "sqlite:bancho.db?mode=rwc")]
    database_url: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let pool = banchoserver::db::create_pool(&args.database_url)
        .await
        .expect("failed to open database");

    let hash = banchoserver::routes::bancho::hash_credentials(&args.credential_digest);
    let id = banchoserver::db::users::create(&pool, &args.username, &hash, 0)
        .await
        .expect("failed to create user");

    for group in &args.group {
        banchoserver::db::permissions::add_member(&pool, id, group)
            .await
            .expect("failed to add group membership");
    }

    println!("created user {} with id {id}", args.username);
}
