use crate::domain::UserId;

/// Sequence character selecting the refund command.
pub const REFUND_KEY: char = '!';

/// One entry of the command table.
///
/// Every variant maps to exactly one sequence character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Refund,
    Bronze,
    Silver,
    Gold,
    Sapphire,
    Ruby,
    Emerald,
}

impl Command {
    /// Table order, used for help output.
    pub const ALL: [Command; 7] = [
        Command::Refund,
        Command::Bronze,
        Command::Silver,
        Command::Gold,
        Command::Sapphire,
        Command::Ruby,
        Command::Emerald,
    ];

    pub fn from_key(key: char) -> Option<Self> {
        match key {
            REFUND_KEY => Some(Command::Refund),
            'b' => Some(Command::Bronze),
            'i' => Some(Command::Silver),
            'g' => Some(Command::Gold),
            'a' => Some(Command::Sapphire),
            'r' => Some(Command::Ruby),
            'e' => Some(Command::Emerald),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Command::Refund => REFUND_KEY,
            Command::Bronze => 'b',
            Command::Silver => 'i',
            Command::Gold => 'g',
            Command::Sapphire => 'a',
            Command::Ruby => 'r',
            Command::Emerald => 'e',
        }
    }

    /// Bot command name (first word of the dispatched text).
    pub fn name(self) -> &'static str {
        match self {
            Command::Refund => "kakerarefund",
            Command::Bronze => "bronze",
            Command::Silver => "silver",
            Command::Gold => "gold",
            Command::Sapphire => "sapphire",
            Command::Ruby => "ruby",
            Command::Emerald => "emerald",
        }
    }

    pub fn is_refund(self) -> bool {
        self == Command::Refund
    }

    /// Command text without prefix or amount. Only the refund command
    /// carries the user id.
    pub fn text(self, user_id: &UserId) -> String {
        match self {
            Command::Refund => format!("{} {}", self.name(), user_id),
            other => other.name().to_string(),
        }
    }

    /// Reply the bot expects after this command.
    pub fn confirmation(self) -> &'static str {
        if self.is_refund() {
            "confirm"
        } else {
            "y"
        }
    }
}

/// `  b\tbronze` lines for the CLI help epilog.
pub fn alphabet_help() -> String {
    Command::ALL
        .iter()
        .map(|c| format!("  {}\t{}", c.key(), c.name()))
        .collect::<Vec<_>>()
        .join("\n")
}
