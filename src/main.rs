use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use trisearch::cli::{Cli, Commands};
use trisearch::command::Command;
use trisearch::error::{Result, TrisearchError};
use trisearch::script::ScriptRunner;
use trisearch::{scorer, Catalog, Element, ElementKind, Notification, Pane, SearchConfig, Session};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to a file when TRISEARCH_LOG is set, otherwise to stderr with --verbose
    if let Ok(log_file) = std::env::var("TRISEARCH_LOG") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .filter_level(log::LevelFilter::Debug)
            .init();

        log::info!("Trisearch starting up");
    } else if cli.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let session = open_session(cli.universe.as_deref(), cli.config.as_deref())?;
            run_interactive(session).await
        }
        Commands::Script {
            script,
            settle_timeout,
        } => {
            let session = open_session(cli.universe.as_deref(), cli.config.as_deref())?;
            run_script(session, &script, settle_timeout).await
        }
        Commands::Rank {
            abbreviation,
            names,
        } => {
            rank(&abbreviation, names);
            Ok(())
        }
    }
}

fn open_session(universe_path: Option<&str>, config_path: Option<&str>) -> Result<Session> {
    let catalog = match universe_path {
        Some(path) => {
            log::info!("📚 Loading catalog from {}", path);
            Catalog::load_from_file(path)?
        }
        None => Catalog::sample()?,
    };
    let config = SearchConfig::load(config_path.map(Path::new))?;
    log::info!("📚 Catalog has {} elements", catalog.len());
    Ok(Session::new(Arc::new(catalog), config))
}

async fn run_script(mut session: Session, script_path: &str, settle_timeout: u64) -> Result<()> {
    log::info!("🧪 Script: {}", script_path);

    let mut runner = ScriptRunner::from_file(script_path)?;
    runner.max_settle_time = Duration::from_secs(settle_timeout);

    let result = runner.run(&mut session).await?;
    result.print_summary();

    if result.success {
        log::info!("🧪 Script completed successfully");
        Ok(())
    } else {
        log::error!("🧪 Script failed");
        Err(TrisearchError::Script("Script failed".to_string()))
    }
}

/// Map an input line to a command. A bare character is typed, and the
/// configured trigger toggles text mode.
fn parse_line(line: &str, text_mode_trigger: char) -> std::result::Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c == text_mode_trigger => Ok(Command::ToggleTextMode),
        (Some(c), None) if c == ' ' => Ok(Command::ToggleSecondary),
        (Some(c), None) => Ok(Command::Input(c)),
        _ => Command::from_string(line.trim()),
    }
}

async fn run_interactive(mut session: Session) -> Result<()> {
    let (command_sender, command_receiver) = mpsc::channel::<Command>(32);
    let (notification_sender, mut notification_receiver) = mpsc::unbounded_channel();
    let trigger = session.config().text_mode_trigger;

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.is_empty() {
                continue;
            }
            match parse_line(&line, trigger) {
                Ok(command) => {
                    if command_sender.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(notification) = notification_receiver.recv().await {
            print_notification(&notification);
        }
    });

    session.run(command_receiver, notification_sender).await;
    session.settle().await;
    if let Err(e) = reader.await {
        log::warn!("Input reader stopped: {}", e);
    }
    if let Err(e) = printer.await {
        log::warn!("Notification printer stopped: {}", e);
    }
    for notification in session.take_notifications() {
        print_notification(&notification);
    }

    print_panes(&mut session);
    Ok(())
}

fn print_notification(notification: &Notification) {
    if let Notification::SearchFinished {
        pane,
        selection,
        query,
        ..
    } = notification
    {
        let selected = selection.as_ref().map(|e| e.name.as_str()).unwrap_or("-");
        println!("{}: '{}' -> {}", pane, query, selected);
    }
}

fn print_panes(session: &mut Session) {
    for pane in Pane::ALL {
        let results = session.results(pane);
        let cursor = session.context(pane).cursor();
        let mode = if session.text_mode(pane) { " [text]" } else { "" };
        println!("== {} '{}'{}", pane, session.query(pane), mode);
        for (index, element) in results.iter().enumerate() {
            let marker = if index == cursor { ">" } else { " " };
            let secondary = if session.secondary(pane).contains(element) { "*" } else { " " };
            println!("{}{} {} ({})", marker, secondary, element.name, element.kind);
        }
    }
}

fn rank(abbreviation: &str, names: Vec<String>) {
    let elements: Vec<Element> = names
        .into_iter()
        .map(|name| Element::new(name.clone(), name, ElementKind::Item))
        .collect();
    for element in scorer::rank(elements, abbreviation) {
        println!("{:.4}  {}", scorer::score(&element.name, abbreviation), element.name);
    }
}
