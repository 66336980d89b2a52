//! Program launcher
//!
//! Reads command lines from stdin and turns each one into a `run_program`
//! command for the host.

use framesync_proto::ProgramCommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Parse one launcher line, `None` for blank input
///
/// With `argv` the line is split on whitespace; otherwise it is passed to
/// the host as a single command string.
pub fn parse_command(line: &str, argv: bool) -> Option<ProgramCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if argv {
        Some(ProgramCommand::Argv(
            line.split_whitespace().map(str::to_string).collect(),
        ))
    } else {
        Some(ProgramCommand::Line(line.to_string()))
    }
}

/// Spawn the stdin reader; the channel closes at end of input
pub fn spawn_stdin_launcher(argv: bool) -> mpsc::Receiver<ProgramCommand> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(command) = parse_command(&line, argv) else {
                        continue;
                    };
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Launcher input closed");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read launcher input: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_and_argv() {
        assert_eq!(
            parse_command("  xterm -e top \n", false),
            Some(ProgramCommand::Line("xterm -e top".into()))
        );
        assert_eq!(
            parse_command("xterm  -e top", true),
            Some(ProgramCommand::Argv(vec![
                "xterm".into(),
                "-e".into(),
                "top".into()
            ]))
        );
        assert_eq!(parse_command("   ", true), None);
    }
}
