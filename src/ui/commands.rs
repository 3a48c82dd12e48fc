use thiserror::Error;

pub const USAGE: &str = "\
commands:
  list                              show the roster again
  refresh                           reload all activities from the server
  signup <email> <activity name>    sign up for an activity
  email <address>                   fill the form's email
  select <activity name>            pick the form's activity
  submit                            sign up with the form
  remove <email> <activity name>    remove a participant
  undo                              restore the last removal
  help                              show this help
  quit                              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Refresh,
    Signup { email: String, activity: String },
    SetEmail(String),
    SelectActivity(String),
    Submit,
    Remove { email: String, activity: String },
    Undo,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parses one input line. Activity names may contain spaces, so they always
/// come last and take the rest of the line.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "list" | "ls" => Ok(Command::List),
        "refresh" | "reload" => Ok(Command::Refresh),
        "signup" => {
            let (email, activity) =
                email_and_activity(rest).ok_or(ParseError::Usage("signup <email> <activity name>"))?;
            Ok(Command::Signup { email, activity })
        }
        "remove" | "unregister" => {
            let (email, activity) =
                email_and_activity(rest).ok_or(ParseError::Usage("remove <email> <activity name>"))?;
            Ok(Command::Remove { email, activity })
        }
        "email" if !rest.is_empty() && !rest.contains(char::is_whitespace) => {
            Ok(Command::SetEmail(rest.to_string()))
        }
        "email" => Err(ParseError::Usage("email <address>")),
        "select" if !rest.is_empty() => Ok(Command::SelectActivity(rest.to_string())),
        "select" => Err(ParseError::Usage("select <activity name>")),
        "submit" => Ok(Command::Submit),
        "undo" => Ok(Command::Undo),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        _ => Err(ParseError::Unknown(word.to_string())),
    }
}

fn email_and_activity(rest: &str) -> Option<(String, String)> {
    let (email, activity) = rest.split_once(char::is_whitespace)?;
    let activity = activity.trim();
    if email.is_empty() || activity.is_empty() {
        return None;
    }
    Some((email.to_string(), activity.to_string()))
}
