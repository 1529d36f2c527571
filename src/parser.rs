//! Line grammar: `#` starts a comment, `;` ends a command, and a command is a name
//! followed by whitespace-separated arguments.

/// Starts a comment that runs to the end of the line.
pub const COMMENT: char = '#';

/// Terminates a command unit. Implied at the end of every line.
pub const TERMINATOR: char = ';';

/// A command unit split into its name and argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub arguments: Vec<String>,
}

impl ParsedCommand {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Split one raw input line into its commands, in order.
///
/// Never fails: blank lines, comment-only lines and empty units (`;;`) simply
/// contribute no commands.
pub fn parse_line(line: &str) -> Vec<ParsedCommand> {
    let code = strip_comment(line);
    if code.is_empty() {
        return Vec::new();
    }
    command_units(code).filter_map(parse_unit).collect()
}

/// Everything before the first `#`.
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT) {
        Some(at) => &line[..at],
        None => line,
    }
}

/// Text between terminators. A missing final terminator is implied, so
/// `"a;b"` and `"a;b;"` yield the same units.
fn command_units(code: &str) -> impl Iterator<Item = &str> {
    let code = code.strip_suffix(TERMINATOR).unwrap_or(code);
    code.split(TERMINATOR)
}

fn parse_unit(unit: &str) -> Option<ParsedCommand> {
    let unit = unit.trim();
    if unit.is_empty() {
        return None;
    }
    let command = match unit.split_once(char::is_whitespace) {
        Some((name, rest)) => {
            ParsedCommand::new(name, rest.split_whitespace().map(str::to_string).collect())
        }
        None => ParsedCommand::new(unit, Vec::new()),
    };
    Some(command)
}
