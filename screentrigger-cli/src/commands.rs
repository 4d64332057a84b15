//! Operator commands read from stdin and `--task` arguments.

use std::path::PathBuf;
use std::time::Duration;

use screentrigger::ActionKind;

/// One line of operator input.
#[derive(Debug, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Add { path: PathBuf, action: ActionKind },
    Remove(String),
    Screenshot,
    Scan,
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  start                       start the automation loop
  stop                        stop the automation loop
  add PATH [click]            add a click trigger from an image file
  add PATH drag [DX DY MS]    add a drag trigger (default 100 0 500)
  remove NAME                 remove a trigger by name
  screenshot                  take the baseline screenshot
  scan                        run a single cycle while stopped
  list                        list triggers in evaluation order
  help                        show this help
  quit                        stop and exit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = tokens.collect();
    let command = match verb {
        "start" => Command::Start,
        "stop" => Command::Stop,
        "screenshot" => Command::Screenshot,
        "scan" => Command::Scan,
        "list" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "remove" => {
            if rest.is_empty() {
                return Err("usage: remove NAME".to_string());
            }
            Command::Remove(rest.join(" "))
        }
        "add" => {
            let (path, action_tokens) = rest
                .split_first()
                .ok_or_else(|| "usage: add PATH [click|drag DX DY MS]".to_string())?;
            Command::Add {
                path: PathBuf::from(path),
                action: parse_action(action_tokens)?,
            }
        }
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}

/// Parses `[]`, `[click]`, `[drag]` or `[drag DX DY MS]`.
pub fn parse_action(tokens: &[&str]) -> Result<ActionKind, String> {
    match tokens {
        [] | ["click"] => Ok(ActionKind::Click),
        ["drag"] => Ok(ActionKind::default_drag()),
        ["drag", dx, dy, ms] => Ok(ActionKind::Drag {
            dx: parse_number(dx, "DX")?,
            dy: parse_number(dy, "DY")?,
            duration: Duration::from_millis(parse_number(ms, "MS")?),
        }),
        _ => Err(format!("invalid action: {}", tokens.join(" "))),
    }
}

/// Parses a `--task` argument: `PATH`, `PATH=click`, `PATH=drag` or
/// `PATH=drag:DX,DY,MS`. An `=` not followed by an action belongs to the path.
pub fn parse_task_arg(arg: &str) -> Result<(PathBuf, ActionKind), String> {
    let split = arg.rsplit_once('=').filter(|(_, spec)| {
        let kind = spec.split(':').next().unwrap_or_default();
        kind == "click" || kind == "drag"
    });
    let Some((path, spec)) = split else {
        return Ok((PathBuf::from(arg), ActionKind::Click));
    };
    let tokens: Vec<&str> = match spec.split_once(':') {
        Some((kind, params)) => std::iter::once(kind).chain(params.split(',')).collect(),
        None => vec![spec],
    };
    Ok((PathBuf::from(path), parse_action(&tokens)?))
}

fn parse_number<T: std::str::FromStr>(token: &str, what: &str) -> Result<T, String> {
    token
        .parse()
        .map_err(|_| format!("{what} must be a number, got `{token}`"))
}
