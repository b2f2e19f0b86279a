//! Typed machine commands
//!
//! Each command knows which endpoint it goes to and what JSON body it
//! carries. Range checks happen here so that a bad slider value never
//! reaches the network.

use std::str::FromStr;

use serde_json::{json, Value};

use crate::endpoints::Endpoints;
use crate::error::ValidationError;

/// Upper bound of the feed override ratio
pub const MAX_FEED_OVERRIDE: f64 = 1.2;

/// Upper bound of the spindle override ratio
pub const MAX_SPINDLE_OVERRIDE: f64 = 1.0;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted wire name
            pub const NAMES: &'static [&'static str] = &[$($wire),+];

            /// Name sent to the bridge
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(ValidationError::UnknownCommand {
                        command: other.to_string(),
                        expected: Self::NAMES.iter().map(|n| n.to_string()).collect(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Power and e-stop commands
    MachineStatusCommand {
        /// Engage the e-stop
        EStop => "E_STOP",
        /// Release the e-stop
        EStopReset => "E_STOP_RESET",
        /// Power the machine on
        PowerOn => "POWER_ON",
        /// Power the machine off
        PowerOff => "POWER_OFF",
    }
}

wire_enum! {
    /// Homing commands, applied to every axis
    HomeCommand {
        /// Home all axes
        Home => "home",
        /// Clear the homed flag of all axes
        Unhome => "unhome",
    }
}

wire_enum! {
    /// Program control commands
    ProgramCommand {
        /// Run the loaded file from the start
        Start => "start",
        /// Pause a running program
        Pause => "pause",
        /// Abort the running program
        Stop => "stop",
        /// Resume a paused program
        Resume => "resume",
    }
}

wire_enum! {
    /// Spindle speed step
    SpindleSpeedStep {
        /// Faster
        Increase => "spindle_increase",
        /// Slower
        Decrease => "spindle_decrease",
    }
}

wire_enum! {
    /// Spindle brake command
    BrakeCommand {
        /// Engage the brake
        Engage => "brake_engage",
        /// Release the brake
        Release => "brake_release",
    }
}

wire_enum! {
    /// Spindle rotation direction command
    DirectionCommand {
        /// Clockwise
        Forward => "spindle_forward",
        /// Counter-clockwise
        Reverse => "spindle_reverse",
    }
}

wire_enum! {
    /// Spindle on/off command
    SpindleSwitch {
        /// Start the spindle
        On => "spindle_on",
        /// Stop the spindle
        Off => "spindle_off",
    }
}

/// Spindle commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpindleCommand {
    /// Step the speed up or down
    Speed(SpindleSpeedStep),
    /// Engage or release the brake
    Brake(BrakeCommand),
    /// Set the direction
    Direction(DirectionCommand),
    /// Switch the spindle on or off
    Enabled(SpindleSwitch),
    /// Set the override ratio (0..=1)
    Override(f64),
}

/// One jog step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JogRequest {
    /// Axis index as the controller numbers them (x = 0)
    pub axis: u32,
    /// Jog speed
    pub speed: f64,
    /// Signed distance to travel
    pub increment: f64,
}

/// A state-mutating request for the command channel
#[derive(Debug, Clone, PartialEq)]
pub enum MachineCommand {
    /// Power / e-stop
    SetMachineStatus(MachineStatusCommand),
    /// Jog one axis
    Jog(JogRequest),
    /// Execute one MDI line
    Mdi(String),
    /// Home or unhome all axes
    Home(HomeCommand),
    /// Program control
    Program(ProgramCommand),
    /// Spindle control
    Spindle(SpindleCommand),
    /// Feed override ratio (0..=1.2)
    FeedOverride(f64),
    /// Maximum velocity in machine units per minute
    MaxVelocity(f64),
    /// Raw HAL command line; the bridge checks the first word against its allow-list
    Halcmd(String),
}

impl MachineCommand {
    /// Reject values the bridge would refuse
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            MachineCommand::Mdi(line) if line.trim().is_empty() => {
                Err(ValidationError::EmptyInput {
                    field: "MDI command".to_string(),
                })
            }
            MachineCommand::Jog(jog) => {
                check_range("jog speed", jog.speed, 0.0, f64::MAX)?;
                check_range("jog increment", jog.increment, f64::MIN, f64::MAX)
            }
            MachineCommand::Spindle(SpindleCommand::Override(value)) => {
                check_range("spindle override", *value, 0.0, MAX_SPINDLE_OVERRIDE)
            }
            MachineCommand::FeedOverride(value) => {
                check_range("feed override", *value, 0.0, MAX_FEED_OVERRIDE)
            }
            MachineCommand::MaxVelocity(value) => {
                check_range("max velocity", *value, 0.0, f64::MAX)
            }
            MachineCommand::Halcmd(line) if line.trim().is_empty() => {
                Err(ValidationError::EmptyInput {
                    field: "HAL command".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Endpoint path for this command
    pub fn endpoint<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            MachineCommand::SetMachineStatus(_) => &endpoints.set_machine_status,
            MachineCommand::Jog(_) => &endpoints.manual,
            MachineCommand::Mdi(_) => &endpoints.mdi,
            MachineCommand::Home(_) => &endpoints.home,
            MachineCommand::Program(_) => &endpoints.program,
            MachineCommand::Spindle(SpindleCommand::Speed(_)) => &endpoints.spindle_speed,
            MachineCommand::Spindle(SpindleCommand::Brake(_)) => &endpoints.spindle_brake,
            MachineCommand::Spindle(SpindleCommand::Direction(_)) => &endpoints.spindle_direction,
            MachineCommand::Spindle(SpindleCommand::Enabled(_)) => &endpoints.spindle_enabled,
            MachineCommand::Spindle(SpindleCommand::Override(_)) => &endpoints.spindle_override,
            MachineCommand::FeedOverride(_) => &endpoints.feed_override,
            MachineCommand::MaxVelocity(_) => &endpoints.max_velocity,
            MachineCommand::Halcmd(_) => &endpoints.halcmd,
        }
    }

    /// JSON request body
    pub fn payload(&self) -> Value {
        match self {
            MachineCommand::SetMachineStatus(cmd) => json!({ "command": cmd.as_str() }),
            MachineCommand::Jog(jog) => json!({
                "axes": jog.axis,
                "speed": jog.speed,
                "increment": jog.increment,
                "command": "",
            }),
            MachineCommand::Mdi(line) => json!({ "command": line.trim() }),
            MachineCommand::Home(cmd) => json!({ "command": cmd.as_str() }),
            MachineCommand::Program(cmd) => json!({ "command": cmd.as_str() }),
            MachineCommand::Spindle(SpindleCommand::Speed(step)) => {
                json!({ "spindle_speed": step.as_str() })
            }
            MachineCommand::Spindle(SpindleCommand::Brake(cmd)) => {
                json!({ "spindle_brake": cmd.as_str() })
            }
            MachineCommand::Spindle(SpindleCommand::Direction(cmd)) => {
                json!({ "spindle_direction": cmd.as_str() })
            }
            MachineCommand::Spindle(SpindleCommand::Enabled(cmd)) => {
                json!({ "spindle_enabled": cmd.as_str() })
            }
            MachineCommand::Spindle(SpindleCommand::Override(value)) => {
                json!({ "spindle_override": value })
            }
            MachineCommand::FeedOverride(value) | MachineCommand::MaxVelocity(value) => {
                json!({ "command": value })
            }
            MachineCommand::Halcmd(line) => json!({ "halcmd": line.trim() }),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            MachineCommand::SetMachineStatus(cmd) => cmd.as_str(),
            MachineCommand::Jog(_) => "jog",
            MachineCommand::Mdi(_) => "mdi",
            MachineCommand::Home(cmd) => cmd.as_str(),
            MachineCommand::Program(cmd) => cmd.as_str(),
            MachineCommand::Spindle(SpindleCommand::Speed(step)) => step.as_str(),
            MachineCommand::Spindle(SpindleCommand::Brake(cmd)) => cmd.as_str(),
            MachineCommand::Spindle(SpindleCommand::Direction(cmd)) => cmd.as_str(),
            MachineCommand::Spindle(SpindleCommand::Enabled(cmd)) => cmd.as_str(),
            MachineCommand::Spindle(SpindleCommand::Override(_)) => "spindle_override",
            MachineCommand::FeedOverride(_) => "feed_override",
            MachineCommand::MaxVelocity(_) => "max_velocity",
            MachineCommand::Halcmd(_) => "halcmd",
        }
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}
