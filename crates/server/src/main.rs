use std::error::Error;
use std::net::SocketAddr;

use axum::Router;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use study_server::{app, AppState, Config};
use tokio::net::TcpListener;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    if let Err(err) = run(config) {
        error!("server stopped: {err}");
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), Box<dyn Error>> {
    if !study_pdf::fonts::default_fonts_available() && config.fonts_dir.is_none() {
        log::warn!(
            "No font family found; PDF exports will fail until {} is set",
            study_pdf::fonts::FONTS_DIR_ENV
        );
    }

    // Blocking HTTP clients are created and dropped outside the async runtime.
    let state = AppState::from_config(&config)?;
    let router = app(state.clone()).layer(config.cors_layer()?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config.bind, router))?;
    drop(runtime);
    drop(state);
    Ok(())
}

async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
