use rubika_bot_core::{build_rocket, Config};

#[rocket::main]
async fn main() {
    let config = Config::from_env();
    if let Err(err) = build_rocket(config).launch().await {
        eprintln!("server error: {err}");
        std::process::exit(1);
    }
}
