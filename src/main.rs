use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware};

use rpms::{AppState, config::Config, db};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    log::info!("Loaded {config:?}");

    std::fs::create_dir_all(&config.media_root)?;

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    db::run_migrations(&pool).await.map_err(std::io::Error::other)?;

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        db::seed_admin(&pool, username, password)
            .await
            .map_err(std::io::Error::other)?;
    }

    let secret_key = config.cookie_key();
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config);

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        let state = state.clone();
        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(bind_addr)?
    .run()
    .await
}
