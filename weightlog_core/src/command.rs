//! Command parsing and dispatch.
//!
//! Transports hand over a command name plus a raw argument string. Parsing
//! produces a closed [`Command`]; [`execute`] runs it against a
//! [`Tracker`]; [`respond`] turns any outcome, failures included, into the
//! reply text.

use crate::clock::Clock;
use crate::engine::Tracker;
use crate::report::format_theoretical_weight;
use crate::store::UserStore;
use crate::{Error, Result, SetupRequest};
use std::str::FromStr;

/// Reply for anything that is not a known command
pub const HELP_TEXT: &str = "Unknown command. Use setup, log-weight, log-food, log-exercise, \
history, projection, or theoretical-weight (short forms: /s, /wi, /f, /e, /h, /p, /tw)";

/// A fully parsed engine command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Setup(SetupRequest),
    LogWeight { weight_kg: i32 },
    LogFood { tag: String, kcal: i32 },
    LogExercise { tag: String, minutes: u32 },
    History,
    Projection,
    TheoreticalWeight,
    Unknown(String),
}

impl Command {
    /// Parse a command name and its argument string.
    ///
    /// Unknown names are not an error; they become [`Command::Unknown`].
    pub fn parse(name: &str, args: Option<&str>) -> Result<Self> {
        let args = args.unwrap_or("").trim();
        let command = match name.trim().to_lowercase().as_str() {
            "setup" | "/s" => Command::Setup(parse_setup(args)?),
            "log-weight" | "/wi" => {
                let [weight] = exact_args::<1>("log-weight", args, "weight")?;
                Command::LogWeight {
                    weight_kg: parse_number(weight, "weight")?,
                }
            }
            "log-food" | "/f" => {
                let (tag, kcal) = split_tag_amount("log-food", args, "kcal")?;
                Command::LogFood {
                    tag,
                    kcal: parse_number(kcal, "kcal")?,
                }
            }
            "log-exercise" | "/e" => {
                let (tag, minutes) = split_tag_amount("log-exercise", args, "minutes")?;
                Command::LogExercise {
                    tag,
                    minutes: parse_number(minutes, "minutes")?,
                }
            }
            "history" | "/h" => Command::History,
            "projection" | "/p" => Command::Projection,
            "theoretical-weight" | "/tw" => Command::TheoreticalWeight,
            other => Command::Unknown(other.to_string()),
        };
        Ok(command)
    }

    /// Parse a raw line such as `/f peanut butter 190`, splitting the
    /// command from its arguments on the first run of whitespace.
    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some((name, args)) => Self::parse(name, Some(args)),
            None => Self::parse(line, None),
        }
    }
}

fn parse_setup(args: &str) -> Result<SetupRequest> {
    let [age, sex, height, initial, target] = exact_args::<5>(
        "setup",
        args,
        "age sex height initialWeight targetWeight",
    )?;
    Ok(SetupRequest {
        age: parse_number(age, "age")?,
        sex: sex.parse()?,
        height_cm: parse_number(height, "height")?,
        initial_weight_kg: parse_number(initial, "initial weight")?,
        target_weight_kg: parse_number(target, "target weight")?,
    })
}

fn exact_args<'a, const N: usize>(
    command: &str,
    args: &'a str,
    usage: &str,
) -> Result<[&'a str; N]> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    parts.try_into().map_err(|parts: Vec<&str>| {
        Error::Parse(format!(
            "{} expects {} argument(s) ({}), got {}",
            command,
            N,
            usage,
            parts.len()
        ))
    })
}

/// Split `tag words... amount`: the last token is the amount, everything
/// before it is the tag.
fn split_tag_amount<'a>(command: &str, args: &'a str, amount: &str) -> Result<(String, &'a str)> {
    match args.rsplit_once(char::is_whitespace) {
        Some((tag, value)) if !tag.trim().is_empty() => Ok((tag.trim().to_string(), value)),
        _ => Err(Error::Parse(format!(
            "{} expects arguments: tag {}",
            command, amount
        ))),
    }
}

fn parse_number<T>(value: &str, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Parse(format!("invalid {} '{}': {}", what, value, e)))
}

/// Run a command for a user and produce the success reply
pub fn execute<S, C>(tracker: &Tracker<S, C>, user_id: &str, command: Command) -> Result<String>
where
    S: UserStore,
    C: Clock,
{
    let reply = match command {
        Command::Setup(request) => {
            tracker.setup(user_id, request)?;
            "User setup complete.".to_string()
        }
        Command::LogWeight { weight_kg } => {
            tracker.log_weight(user_id, weight_kg)?;
            "Weight logged successfully.".to_string()
        }
        Command::LogFood { tag, kcal } => {
            tracker.log_food(user_id, &tag, kcal)?;
            "Food logged successfully.".to_string()
        }
        Command::LogExercise { tag, minutes } => {
            tracker.log_exercise(user_id, &tag, minutes)?;
            "Exercise logged successfully.".to_string()
        }
        Command::History => tracker.history(user_id)?.to_string(),
        Command::Projection => tracker.projection(user_id)?.to_string(),
        Command::TheoreticalWeight => {
            format_theoretical_weight(tracker.theoretical_weight(user_id)?)
        }
        Command::Unknown(name) => {
            tracing::debug!("Unknown command '{}' from user {}", name, user_id);
            HELP_TEXT.to_string()
        }
    };
    Ok(reply)
}

/// Reply text for a failed command
pub fn error_reply(err: &Error) -> String {
    match err {
        Error::UserNotFound(_) => "User not found.".to_string(),
        Error::Validation(msg) => msg.clone(),
        other => format!("Error processing command: {}", other),
    }
}

/// Parse and run one raw line. Always produces a reply; nothing that goes
/// wrong here affects later calls.
pub fn respond<S, C>(tracker: &Tracker<S, C>, user_id: &str, line: &str) -> String
where
    S: UserStore,
    C: Clock,
{
    match Command::parse_line(line).and_then(|command| execute(tracker, user_id, command)) {
        Ok(reply) => reply,
        Err(e) => {
            if e.is_expected() {
                tracing::info!("Command '{}' for user {}: {}", line, user_id, e);
            } else {
                tracing::warn!("Command '{}' for user {} failed: {}", line, user_id, e);
            }
            error_reply(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use crate::Sex;
    use chrono::NaiveDate;

    fn create_tracker() -> Tracker<MemoryStore, FixedClock> {
        Tracker::new(
            MemoryStore::new(),
            FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        )
    }

    #[test]
    fn test_parse_setup() {
        let command = Command::parse("setup", Some("30 M 175 80 70")).unwrap();
        assert_eq!(
            command,
            Command::Setup(SetupRequest {
                age: 30,
                sex: Sex::Male,
                height_cm: 175,
                initial_weight_kg: 80,
                target_weight_kg: 70,
            })
        );
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Command::parse_line("/h").unwrap(), Command::History);
        assert_eq!(Command::parse_line("/P").unwrap(), Command::Projection);
        assert_eq!(Command::parse_line("/tw").unwrap(), Command::TheoreticalWeight);
        assert_eq!(
            Command::parse_line("/wi 75").unwrap(),
            Command::LogWeight { weight_kg: 75 }
        );
    }

    #[test]
    fn test_parse_food_with_multiword_tag() {
        assert_eq!(
            Command::parse_line("log-food peanut butter toast 310").unwrap(),
            Command::LogFood {
                tag: "peanut butter toast".into(),
                kcal: 310,
            }
        );
    }

    #[test]
    fn test_parse_exercise() {
        assert_eq!(
            Command::parse("/e", Some("running 30")).unwrap(),
            Command::LogExercise {
                tag: "running".into(),
                minutes: 30,
            }
        );
    }

    #[test]
    fn test_parse_errors_name_the_cause() {
        let err = Command::parse("setup", Some("thirty M 175 80 70")).unwrap_err();
        assert!(err.to_string().contains("invalid age 'thirty'"));

        let err = Command::parse("setup", Some("30 M 175")).unwrap_err();
        assert!(err.to_string().contains("got 3"));

        let err = Command::parse("log-food", Some("apple")).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));

        let err = Command::parse("log-exercise", Some("run -5")).unwrap_err();
        assert!(err.to_string().contains("invalid minutes"));
    }

    #[test]
    fn test_unknown_sex_rejected_at_parse() {
        let err = Command::parse("setup", Some("30 X 175 80 70")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            Command::parse_line("dance 5").unwrap(),
            Command::Unknown("dance".into())
        );
        let tracker = create_tracker();
        assert_eq!(respond(&tracker, "u", "dance"), HELP_TEXT);
    }

    #[test]
    fn test_respond_full_flow() {
        let tracker = create_tracker();

        assert_eq!(respond(&tracker, "u", "/s 30 M 175 80 70"), "User setup complete.");
        assert_eq!(respond(&tracker, "u", "/wi 75"), "Weight logged successfully.");
        assert_eq!(respond(&tracker, "u", "/f apple 95"), "Food logged successfully.");
        assert_eq!(respond(&tracker, "u", "/e running 30"), "Exercise logged successfully.");
        assert_eq!(respond(&tracker, "u", "/tw"), "Theoretical weight: 80.0 kg");

        let history = respond(&tracker, "u", "history");
        assert!(history.starts_with("Date | Theoretical weight | Actual weight"));
        assert!(history.ends_with("2024-03-01 | 79.8 kg | 75 kg"));
    }

    #[test]
    fn test_respond_expected_failures() {
        let tracker = create_tracker();
        assert_eq!(respond(&tracker, "ghost", "history"), "User not found.");

        respond(&tracker, "u", "setup 30 F 165 65 60");
        assert_eq!(
            respond(&tracker, "u", "log-weight 1001"),
            "Invalid weight. Must be between 42 and 1000 kg."
        );
    }

    #[test]
    fn test_bad_line_does_not_poison_next_line() {
        let tracker = create_tracker();
        respond(&tracker, "u", "setup 30 M 175 80 70");

        let reply = respond(&tracker, "u", "log-weight heavy");
        assert!(reply.starts_with("Error processing command: invalid weight 'heavy'"));

        assert_eq!(respond(&tracker, "u", "log-weight 80"), "Weight logged successfully.");
    }
}
