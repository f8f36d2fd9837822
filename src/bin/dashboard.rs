// src/bin/dashboard.rs
use std::sync::Arc;
use env_logger::Env;
use log::{ error, info, warn };
use tokio::io::{ AsyncBufReadExt, BufReader };
use status_hub::config::DashboardConfig;
use status_hub::presenter::clipboard::{ probe_clipboards, Clipboard };
use status_hub::presenter::render::render;
use status_hub::presenter::source::HttpStatusSource;
use status_hub::presenter::{ LogNotifier, Presenter };

enum Command {
    Refresh,
    Copy(String),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "r" | "refresh" => Some(Command::Refresh),
        "c" | "copy" => parts.next().map(|id| Command::Copy(id.to_string())),
        "q" | "quit" => Some(Command::Quit),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = DashboardConfig::from_env();
    let source = match HttpStatusSource::new(&config.status_url, config.fetch_timeout()) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to build status client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let clipboards = probe_clipboards();
    info!(
        "Clipboard strategies: {} (fallback {})",
        clipboards.primary.name(),
        clipboards.fallback.name()
    );

    info!("Watching {}", config.status_url);
    let presenter = Presenter::new(Arc::new(source), clipboards, Arc::new(LogNotifier), config);
    let mut revisions = presenter.subscribe();
    presenter.mount();
    println!("Commands: r = refresh, c <id> = copy address, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                print!("{}", render(&presenter.view()));
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read command: {}", e);
                        break;
                    }
                };
                match parse_command(&line) {
                    Some(Command::Refresh) => {
                        presenter.refresh().await;
                    }
                    Some(Command::Copy(id)) => {
                        let address = presenter
                            .view()
                            .snapshot
                            .into_iter()
                            .find(|server| server.id == id)
                            .map(|server| server.ip);
                        match address {
                            Some(address) => {
                                presenter.copy_address(&address, &id).await;
                            }
                            None => warn!("No server with id {}", id),
                        }
                    }
                    Some(Command::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => warn!("Unknown command: {}", line.trim()),
                }
            }
        }
    }

    presenter.unmount();
    Ok(())
}
