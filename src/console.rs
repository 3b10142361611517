use crate::domain::commands::{Command, TargetRef};
use crate::domain::events::Event;
use crate::domain::{AlertOptions, Coordinate, InvalidCoordinate};
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::Sender;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, error, info, instrument, warn};

/// Reads one command per line and sends it to the app until a quit command. The end of the input
/// quits the app as well.
#[instrument(skip_all)]
pub async fn read_commands<R>(reader: R, tx: Sender<Event>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LinesStream::new(BufReader::new(reader).lines());
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("❌ Unable to read a command: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                debug!("⌨️ Received command: {:?}", command);
                let quit = command == Command::Quit;
                if tx.send(Event::Command(command)).await.is_err() || quit {
                    return;
                }
            }
            Err(e) => warn!("⚠️ {}", e),
        }
    }

    info!("⌨️ Input closed");
    tx.send(Event::Command(Command::Quit)).await.unwrap_or_default();
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ParseCommandError::Empty);
        };
        let arguments = words.collect::<Vec<_>>();

        let command = match (name, arguments.as_slice()) {
            ("target", [location, name @ ..]) => Command::SetTarget(parse_target(location, name)?),
            ("target", []) => return Err(ParseCommandError::MissingArgument("target", "a place id or <lat>,<lon>")),
            ("clear", []) => Command::ClearTarget,
            ("start", []) => Command::StartTracking,
            ("stop", []) => Command::StopTracking,
            ("ack", []) => Command::Acknowledge,
            ("show", []) => Command::Visibility(true),
            ("hide", []) => Command::Visibility(false),
            ("status", []) => Command::Status,
            ("radius", [distances]) => Command::SetThresholds(parse_distances(distances)?),
            ("radius", _) => return Err(ParseCommandError::MissingArgument("radius", "<m>[,<m>...]")),
            ("options", channels) => Command::SetOptions(parse_options(channels)?),
            ("retry", []) => Command::ClearPositionError,
            ("reenable", [id]) => Command::ReenableAlarm(id.to_string()),
            ("reenable", _) => return Err(ParseCommandError::MissingArgument("reenable", "an alarm id")),
            ("quit", []) => Command::Quit,
            (name @ ("clear" | "start" | "stop" | "ack" | "show" | "hide" | "status" | "retry" | "quit"), _) => {
                return Err(ParseCommandError::UnexpectedArguments(name.to_string()));
            }
            (name, _) => return Err(ParseCommandError::Unknown(name.to_string())),
        };
        Ok(command)
    }
}

fn parse_target(location: &str, name: &[&str]) -> Result<TargetRef, ParseCommandError> {
    let Some((latitude, longitude)) = location.split_once(',') else {
        // Anything without a comma is a saved place
        return match name {
            [] => Ok(TargetRef::Place(location.to_string())),
            _ => Err(ParseCommandError::UnexpectedArguments("target".to_string())),
        };
    };

    let latitude = parse_number(latitude)?;
    let longitude = parse_number(longitude)?;
    let coordinate = Coordinate::try_new(latitude, longitude)?;
    let name = Some(name.join(" ")).filter(|name| !name.is_empty());

    Ok(TargetRef::Coordinate { coordinate, name })
}

fn parse_distances(distances: &str) -> Result<Vec<f64>, ParseCommandError> {
    distances.split(',').map(parse_number).collect()
}

fn parse_number(value: &str) -> Result<f64, ParseCommandError> {
    value.trim().parse::<f64>().map_err(|_| ParseCommandError::InvalidNumber(value.to_string()))
}

fn parse_options(channels: &[&str]) -> Result<AlertOptions, ParseCommandError> {
    let mut options = AlertOptions {
        sound: false,
        vibration: false,
        voice: false,
    };

    for channel in channels {
        match *channel {
            "sound" => options.sound = true,
            "vibration" => options.vibration = true,
            "voice" => options.voice = true,
            other => return Err(ParseCommandError::UnknownChannel(other.to_string())),
        }
    }
    Ok(options)
}

#[derive(Error, PartialEq, Debug)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' expects {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("'{0}' got unexpected arguments")]
    UnexpectedArguments(String),
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),
    #[error("unknown alert channel '{0}', expected sound, vibration or voice")]
    UnknownChannel(String),
}
