// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::commands::{Command, CommandSender};

/// Key bindings: `q` quits, space or `p` toggles the pause.
pub fn key_to_command(key: char) -> Option<Command> {
    match key {
        'q' | 'Q' => Some(Command::Quit),
        ' ' | 'p' | 'P' => Some(Command::Pause),
        _ => None,
    }
}

/// Reads lines from `reader` and forwards every bound key as a command.
///
/// Returns after a quit was sent, at end of input, or once the receiving side
/// is gone.
pub fn forward_keys<R: BufRead>(reader: R, sender: &CommandSender) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        for command in line.chars().filter_map(key_to_command) {
            if sender.send(command).is_err() {
                debug!("command queue closed, stopping input");
                return Ok(());
            }
            if command == Command::Quit {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Forwards stdin on a background thread. Keys only arrive once the terminal
/// hands over a line.
pub fn spawn_stdin_listener(sender: CommandSender) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("alertsim-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            if let Err(e) = forward_keys(stdin.lock(), &sender) {
                warn!("stopped reading input: {}", e);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command_channel;
    use std::io::Cursor;

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_to_command('q'), Some(Command::Quit));
        assert_eq!(key_to_command(' '), Some(Command::Pause));
        assert_eq!(key_to_command('p'), Some(Command::Pause));
        assert_eq!(key_to_command('x'), None);
    }

    #[test]
    fn test_forward_stops_after_quit() {
        let (tx, rx) = command_channel(8);
        forward_keys(Cursor::new("xp\n \nq p\n"), &tx).unwrap();
        assert_eq!(
            rx.drain(),
            vec![Command::Pause, Command::Pause, Command::Quit]
        );
    }
}
