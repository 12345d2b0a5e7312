//! High-level robot commands on top of a [`ConnectionManager`].
//!
//! All commands are fire-and-forget.  The only one with a sequence is
//! [`CommandDispatcher::return_to_base`]: a cleaning robot ignores `dock`,
//! so it is paused first and given a bounded number of poll intervals for
//! the pause to show up in telemetry.

use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::app::commands::{Command, CommandName};
use crate::app::ports::TransportPort;
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::interpreter::{LifecycleState, StateInterpreter};

pub struct CommandDispatcher<'a, T: TransportPort> {
    connection: &'a ConnectionManager<T>,
    interpreter: StateInterpreter,
}

impl<T: TransportPort> Clone for CommandDispatcher<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: TransportPort> Copy for CommandDispatcher<'_, T> {}

impl<'a, T: TransportPort> CommandDispatcher<'a, T> {
    pub fn new(connection: &'a ConnectionManager<T>) -> Self {
        Self {
            connection,
            interpreter: StateInterpreter::new(connection.config()),
        }
    }

    fn current_state(&self) -> LifecycleState {
        self.interpreter
            .state(&self.connection.feed().store().snapshot())
    }

    fn send(&self, name: CommandName) -> Result<()> {
        self.connection.send(&Command::new(name))
    }

    /// Start a mission, or resume it if the robot is paused.
    pub fn start(&self) -> Result<()> {
        if self.current_state() == LifecycleState::Paused {
            info!("robot paused, resuming");
            self.send(CommandName::Resume)
        } else {
            self.send(CommandName::Start)
        }
    }

    pub fn stop(&self) -> Result<()> {
        self.send(CommandName::Stop)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(CommandName::Pause)
    }

    /// Play the locator sound.
    pub fn locate(&self) -> Result<()> {
        self.send(CommandName::Find)
    }

    /// Pause if cleaning, wait for the pause to land, then dock.
    ///
    /// The wait is bounded; if the robot never reports Paused, `dock` is
    /// still sent.  Teardown during the wait returns [`Error::Cancelled`]
    /// and nothing further is sent.
    pub async fn return_to_base(&self) -> Result<()> {
        if self.current_state() == LifecycleState::Cleaning {
            self.pause()?;

            let config = self.connection.config();
            let mut paused = false;
            for attempt in 1..=config.dock_wait_attempts {
                if self.current_state() == LifecycleState::Paused {
                    paused = true;
                    break;
                }
                debug!("waiting for pause before docking ({}/{})", attempt, config.dock_wait_attempts);
                if !self.connection.teardown().sleep(config.poll_interval()).await {
                    return Err(Error::Cancelled);
                }
            }
            if !paused && self.current_state() != LifecycleState::Paused {
                warn!(
                    "robot did not report paused after {} polls, docking anyway",
                    config.dock_wait_attempts
                );
            }
        }
        self.send(CommandName::Dock)
    }

    /// Raw passthrough.  Unknown names travel verbatim.
    pub fn send_command(&self, name: &str, params: Option<Map<String, Value>>) -> Result<()> {
        self.dispatch(Command {
            name: CommandName::parse(name),
            params,
        })
    }

    pub fn dispatch(&self, command: Command) -> Result<()> {
        self.connection.send(&command)
    }

    pub fn connection(&self) -> &'a ConnectionManager<T> {
        self.connection
    }

    pub fn interpreter(&self) -> StateInterpreter {
        self.interpreter
    }
}
