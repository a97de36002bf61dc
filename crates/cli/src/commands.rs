//! Parsing of interactive input lines.

use anyhow::{bail, Context, Result};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: the new contents of the search field.
    Query(String),
    /// `:more <index>` - the row at `index` scrolled into view.
    More(usize),
    /// `:fav <id>` - toggle a movie's favorite flag.
    Favorite(i64),
    /// `:favorites` - list favorites from the local store.
    Favorites,
    /// `:details <id>`
    Details(i64),
    /// `:refresh` - re-run the current query now.
    Refresh,
    /// `:stats` - cache statistics.
    Stats,
    /// `:metrics` - Prometheus text output.
    Metrics,
    Help,
    Quit,
}

pub const HELP: &str = "\
Type text to search. Commands:
  :more <index>    load the next page when row <index> is near the end
  :fav <id>        toggle favorite
  :favorites       list favorites
  :details <id>    show movie details
  :refresh         search the current query again
  :stats           cache statistics
  :metrics         prometheus metrics
  :help            this text
  :quit            exit";

/// Parse an input line. Anything not starting with `:` is a query edit,
/// including an empty line (which clears the search).
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return Ok(Command::Query(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    if parts.next().is_some() {
        bail!("Too many arguments for :{}", name);
    }

    let command = match (name, arg) {
        ("more", Some(index)) => Command::More(
            index
                .parse()
                .with_context(|| format!("Invalid row index '{}'", index))?,
        ),
        ("fav", Some(id)) => Command::Favorite(parse_id(id)?),
        ("details", Some(id)) => Command::Details(parse_id(id)?),
        ("favorites", None) => Command::Favorites,
        ("refresh", None) => Command::Refresh,
        ("stats", None) => Command::Stats,
        ("metrics", None) => Command::Metrics,
        ("help", None) => Command::Help,
        ("quit" | "q", None) => Command::Quit,
        ("more" | "fav" | "details", None) => bail!(":{} needs an argument", name),
        _ => bail!("Unknown command ':{}' (try :help)", rest.trim()),
    };
    Ok(command)
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid movie id '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_query() {
        assert_eq!(
            parse_command("batman begins\n").unwrap(),
            Command::Query("batman begins".to_string())
        );
        assert_eq!(parse_command("").unwrap(), Command::Query(String::new()));
        assert_eq!(
            parse_command("  ba ").unwrap(),
            Command::Query("  ba ".to_string())
        );
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse_command(":more 16").unwrap(), Command::More(16));
        assert_eq!(parse_command(":fav 603").unwrap(), Command::Favorite(603));
        assert_eq!(parse_command(" :details 949").unwrap(), Command::Details(949));
    }

    #[test]
    fn test_commands_without_arguments() {
        assert_eq!(parse_command(":favorites").unwrap(), Command::Favorites);
        assert_eq!(parse_command(":refresh").unwrap(), Command::Refresh);
        assert_eq!(parse_command(":stats").unwrap(), Command::Stats);
        assert_eq!(parse_command(":metrics").unwrap(), Command::Metrics);
        assert_eq!(parse_command(":help").unwrap(), Command::Help);
        assert_eq!(parse_command(":q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_invalid_commands() {
        assert!(parse_command(":more").is_err());
        assert!(parse_command(":more -1").is_err());
        assert!(parse_command(":fav abc").is_err());
        assert!(parse_command(":refresh now").is_err());
        assert!(parse_command(":fav 1 2").is_err());

        let err = parse_command(":launch").unwrap_err();
        assert!(err.to_string().contains("Unknown command"));
    }
}
