// # Command Line Parsing
//
// One input line is one command:
//
// ```text
// <name>                 name history
// available <name>       availability
// bedrock <gamertag>     cross-platform account (gamertag may contain spaces)
// watch <name>           add to watchlist
// unwatch <name>         remove from watchlist
// watchlist [clear]      show or clear the watchlist
// cache [clear]          show cache size or clear it
// help | quit | exit
// ```

use namewatch_core::CommandFacade;

use crate::render;

/// A parsed user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    History(String),
    Available(String),
    Bedrock(String),
    Watch(String),
    Unwatch(String),
    ShowWatchlist,
    ClearWatchlist,
    ShowCache,
    ClearCache,
    Help,
    Quit,
}

impl Command {
    /// Whether the command talks to a remote service
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::History(_) | Self::Available(_) | Self::Bedrock(_))
    }
}

/// Parse one input line
///
/// Returns `Ok(None)` for a blank line and `Err` with a usage hint for
/// anything malformed.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    if line.is_empty() {
        return Ok(None);
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    let command = match keyword.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "available" => Command::Available(single_argument("available", rest)?),
        "watch" => Command::Watch(single_argument("watch", rest)?),
        "unwatch" => Command::Unwatch(single_argument("unwatch", rest)?),
        "bedrock" => {
            if rest.is_empty() {
                return Err("Usage: bedrock <gamertag>".to_string());
            }
            Command::Bedrock(rest.to_string())
        }
        "watchlist" => match rest {
            "" => Command::ShowWatchlist,
            "clear" => Command::ClearWatchlist,
            _ => return Err("Usage: watchlist [clear]".to_string()),
        },
        "cache" => match rest {
            "" => Command::ShowCache,
            "clear" => Command::ClearCache,
            _ => return Err("Usage: cache [clear]".to_string()),
        },
        _ if rest.is_empty() => Command::History(keyword.to_string()),
        _ => {
            return Err(format!(
                "Unknown command '{}'. Type 'help' for the list of commands.",
                keyword
            ));
        }
    };

    Ok(Some(command))
}

fn single_argument(command: &str, rest: &str) -> Result<String, String> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(name), None) => Ok(name.to_string()),
        _ => Err(format!("Usage: {} <name>", command)),
    }
}

/// Run a command against the facade and render its outcome
pub async fn execute(facade: &CommandFacade, session: &str, command: Command) -> String {
    match command {
        Command::History(name) => match facade.check_history(session, &name).await {
            Ok(report) => render::history(&name, &report),
            Err(e) => render::error(&e),
        },
        Command::Available(name) => match facade.check_availability(session, &name).await {
            Ok(report) => render::availability(&name, &report),
            Err(e) => render::error(&e),
        },
        Command::Bedrock(gamertag) => match facade.check_bedrock(session, &gamertag).await {
            Ok(report) => render::bedrock(&report),
            Err(e) => render::error(&e),
        },
        Command::Watch(name) => match facade.watch(&name).await {
            Ok(true) => render::line(&format!(
                "Added {} to watchlist! You will be notified when this name becomes available.",
                name
            )),
            Ok(false) => render::line("This name is already on your watchlist!"),
            Err(e) => render::error(&e),
        },
        Command::Unwatch(name) => {
            if facade.unwatch(&name).await {
                render::line(&format!("Removed {} from watchlist!", name))
            } else {
                render::line("This name is not on your watchlist!")
            }
        }
        Command::ShowWatchlist => render::watchlist(&facade.watchlist().await),
        Command::ClearWatchlist => {
            let removed = facade.clear_watchlist().await;
            render::line(&format!("Watchlist cleared! ({} removed)", removed))
        }
        Command::ShowCache => {
            render::line(&format!("Cache contains {} players.", facade.cache_size().await))
        }
        Command::ClearCache => {
            let removed = facade.clear_cache().await;
            render::line(&format!("Cache cleared! ({} removed)", removed))
        }
        Command::Help => render::help(),
        Command::Quit => String::new(),
    }
}
