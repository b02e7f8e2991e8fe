use precis_common::RequestKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Summarize(RequestKind), // /page | /video
    Key(Option<String>),    // /key <api key> | /key
    Help,                   // /help
    Quit,                   // /quit or /exit
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Command::Unknown(trimmed.to_string());
    }
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match verb {
        "/page" => Command::Summarize(RequestKind::PageContent),
        "/video" => Command::Summarize(RequestKind::VideoTranscript),
        "/key" => Command::Key(rest.map(str::to_string)),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

const KEY_PREFIX: &str = "/key ";

/// The input line as displayed: anything typed after `/key ` is masked.
pub fn masked_input(input: &str) -> String {
    match input.strip_prefix(KEY_PREFIX) {
        Some(secret) => {
            let mut out = String::from(KEY_PREFIX);
            out.extend(secret.chars().map(|_| '•'));
            out
        }
        None => input.to_string(),
    }
}
