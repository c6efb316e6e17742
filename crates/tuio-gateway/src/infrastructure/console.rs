//! Line-oriented command surface read from stdin.
//!
//! | Command             | Effect                                              |
//! |---------------------|-----------------------------------------------------|
//! | `connect` / `c`     | Re-run the mode controller with the current config |
//! | `mode <name or 0-3>`| Select a mode; applied at the next `connect`       |
//! | `display <n> <id>`  | Set the tile count and target tile                  |
//! | `down <x> <y>`      | Press the local pointer at a normalized position    |
//! | `drag <x> <y>`      | Move the pressed local pointer                      |
//! | `up`                | Release the local pointer                           |
//! | `status` / `s`      | Print the status line and live cursor count         |
//! | `save`              | Write the config file                               |
//! | `help` / `h` / `?`  | List the commands                                   |
//! | `quit` / `q`        | Exit                                                |

use std::str::FromStr;

use thiserror::Error;
use tracing::warn;
use tuio_core::{Mode, ParseModeError};

use super::gateway::Gateway;

/// Error returned for a line that is not a valid command.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}' (try: connect, mode, display, down, drag, up, status, save, help, quit)")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Mode(#[from] ParseModeError),
}

/// One parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect,
    Mode(Mode),
    Display { tiles: i32, target: i32 },
    Down { x: f32, y: f32 },
    Drag { x: f32, y: f32 },
    Up,
    Status,
    Save,
    Help,
    Quit,
}

/// Reply to [`Command::Help`].
pub const HELP: &str = "\
commands:
  connect | c            re-bind sockets with the current settings
  mode <name|0-3>        receiver, sender, router or random (apply with connect)
  display <n> <id>       split into n tiles and forward tile id
  down <x> <y>           press the local pointer (normalized coordinates)
  drag <x> <y>           move the pressed local pointer
  up                     release the local pointer
  status | s             show the status line
  save                   write the config file
  help | h | ?           show this list
  quit | q               exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let args: Vec<&str> = words.collect();

        match head.to_ascii_lowercase().as_str() {
            "connect" | "c" => Ok(Command::Connect),
            "mode" | "m" => match args.as_slice() {
                [name] => Ok(Command::Mode(name.parse()?)),
                _ => Err(usage("mode", "a mode name or index")),
            },
            "display" | "d" => match parse_pair::<i32>(&args) {
                Some((tiles, target)) => Ok(Command::Display { tiles, target }),
                None => Err(usage("display", "<tiles> <target>")),
            },
            "down" => parse_pair::<f32>(&args)
                .map(|(x, y)| Command::Down { x, y })
                .ok_or_else(|| usage("down", "<x> <y>")),
            "drag" => parse_pair::<f32>(&args)
                .map(|(x, y)| Command::Drag { x, y })
                .ok_or_else(|| usage("drag", "<x> <y>")),
            "up" => Ok(Command::Up),
            "status" | "s" => Ok(Command::Status),
            "save" => Ok(Command::Save),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn usage(command: &'static str, expected: &'static str) -> CommandError {
    CommandError::Usage { command, expected }
}

fn parse_pair<T: FromStr>(args: &[&str]) -> Option<(T, T)> {
    match args {
        [a, b] => Some((a.parse().ok()?, b.parse().ok()?)),
        _ => None,
    }
}

/// Executes `command` and returns the line to print.
///
/// [`Command::Quit`] is left to the caller.
///
/// Must be called from within a Tokio runtime.
pub fn execute(gateway: &mut Gateway, command: Command) -> String {
    match command {
        Command::Connect => {
            gateway.connect();
            gateway.status_line()
        }
        Command::Mode(mode) => {
            gateway.update_config(|cfg| cfg.gateway.mode = mode.index());
            format!("mode set to {mode}; type 'connect' to apply")
        }
        Command::Display { tiles, target } => {
            gateway.update_config(|cfg| {
                cfg.display.n_displays = tiles;
                cfg.display.remote_display_id = target;
            });
            let p = gateway.settings().partition;
            format!("display {} of {}", p.target_tile(), p.tile_count())
        }
        // Console coordinates are already normalized: the surface is 1 × 1.
        Command::Down { x, y } => {
            gateway.input().pointer_down(x, y, 1.0, 1.0);
            format!("pointer down at ({x}, {y})")
        }
        Command::Drag { x, y } => {
            if !gateway.input().is_pressed() {
                return "pointer is up; 'down' first".to_string();
            }
            gateway.input().pointer_drag(x, y, 1.0, 1.0);
            format!("pointer at ({x}, {y})")
        }
        Command::Up => {
            gateway.input().pointer_up();
            "pointer up".to_string()
        }
        Command::Status => format!(
            "{} | {} live cursors",
            gateway.status_line(),
            gateway.table().len()
        ),
        Command::Save => match gateway.save() {
            Ok(path) => format!("saved {}", path.display()),
            Err(e) => {
                warn!("failed to save config: {e}");
                format!("save failed: {e}")
            }
        },
        Command::Help => HELP.to_string(),
        Command::Quit => "bye".to_string(),
    }
}
