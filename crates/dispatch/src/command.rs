/// Slash commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Show the interaction counters.
    Stat,
    /// Zero every interaction counter.
    StatReset,
    Unknown(String),
}

impl Command {
    /// Parses `/name`, `/name@bot` and `/name args`. Returns `None` for
    /// anything that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix('/')?;
        let word = rest.split(char::is_whitespace).next().unwrap_or_default();
        let name = word.split_once('@').map_or(word, |(name, _bot)| name);
        if name.is_empty() {
            return None;
        }

        Some(match name {
            "start" => Self::Start,
            "stat" => Self::Stat,
            "statreset" => Self::StatReset,
            other => Self::Unknown(other.to_string()),
        })
    }
}
