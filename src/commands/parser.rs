//! Prefix command parsing.

/// A command line split into a lowercased name and whitespace-separated args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Parse `content` as a command if it starts with `prefix`.
///
/// A bare prefix parses to an empty name, which no handler matches.
pub fn parse_command(content: &str, prefix: &str) -> Option<ParsedCommand> {
    let rest = content.strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default().to_lowercase();
    let args = words.map(str::to_string).collect();
    Some(ParsedCommand { name, args })
}
