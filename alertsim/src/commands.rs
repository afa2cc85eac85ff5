// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, SendError, Sender, TryRecvError};
use log::{debug, warn};

use crate::simulation::context::SimulationContext;

/// Requests the user can make while the simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Quit,
    Pause,
}

/// Whether the run loop keeps going after a command was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub type Handler = Box<dyn FnMut(&mut SimulationContext) -> Flow + Send>;

/// Creates the bounded command channel between the input thread and the run
/// loop.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandQueue) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    (CommandSender { tx }, CommandQueue { rx })
}

#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Blocks while the channel is full. Fails once the queue side is gone.
    pub fn send(&self, command: Command) -> Result<(), SendError<Command>> {
        self.tx.send_blocking(command)
    }
}

#[derive(Debug)]
pub struct CommandQueue {
    rx: Receiver<Command>,
}

impl CommandQueue {
    /// Takes every command that is waiting, without blocking.
    pub fn drain(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        commands
    }

    /// True once every sender was dropped and nothing is left to read.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed() && self.rx.is_empty()
    }
}

/// One handler per command, registered at startup.
#[derive(Default)]
pub struct CommandHandlers {
    quit: Option<Handler>,
    pause: Option<Handler>,
}

impl CommandHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quit stops the loop, pause toggles the pause flag.
    pub fn with_defaults() -> Self {
        let mut handlers = Self::new();
        handlers.register(Command::Quit, Box::new(|_ctx| Flow::Stop));
        handlers.register(
            Command::Pause,
            Box::new(|ctx| {
                ctx.toggle_pause();
                Flow::Continue
            }),
        );
        handlers
    }

    pub fn register(&mut self, command: Command, handler: Handler) {
        let slot = match command {
            Command::Quit => &mut self.quit,
            Command::Pause => &mut self.pause,
        };
        if slot.replace(handler).is_some() {
            warn!("replaced the handler of command {:?}", command);
        }
    }

    pub fn dispatch(&mut self, command: Command, ctx: &mut SimulationContext) -> Flow {
        let handler = match command {
            Command::Quit => self.quit.as_mut(),
            Command::Pause => self.pause.as_mut(),
        };
        match handler {
            Some(handler) => {
                debug!("handling command {:?}", command);
                handler(ctx)
            }
            None => {
                warn!("no handler registered for command {:?}", command);
                Flow::Continue
            }
        }
    }

    /// Handles everything waiting in `queue`. Stops at the first handler that
    /// asks to stop; later commands are dropped.
    pub fn process(&mut self, queue: &CommandQueue, ctx: &mut SimulationContext) -> Flow {
        for command in queue.drain() {
            if self.dispatch(command, ctx) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }
}
