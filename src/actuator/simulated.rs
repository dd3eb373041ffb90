use super::ActuatorLink;
use crate::{
    constants::{ACK_OK, SIM_HISTORY_LIMIT},
    quantizer::StepCommand,
    Result,
};
use log::info;
use std::collections::VecDeque;

/// Actuator without hardware: tracks a signed step position in memory
#[derive(Debug)]
pub struct SimulatedActuator {
    position: i64,
    connected: bool,
    history: VecDeque<StepCommand>,
    history_limit: usize,
    applied: u64,
}

impl Default for SimulatedActuator {
    fn default() -> Self {
        Self {
            position: 0,
            connected: false,
            history: VecDeque::new(),
            history_limit: SIM_HISTORY_LIMIT,
            applied: 0,
        }
    }
}

impl SimulatedActuator {
    /// Create a simulator at position zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulator starting at the given position
    #[must_use]
    pub fn at_position(position: i64) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Current step position (negative is left of start)
    #[must_use]
    pub const fn position(&self) -> i64 {
        self.position
    }

    /// Keep at most `limit` recent commands (0 disables recording)
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.history.truncate(limit);
        self
    }

    /// Most recent commands applied, oldest first
    #[must_use]
    pub const fn history(&self) -> &VecDeque<StepCommand> {
        &self.history
    }

    /// Total commands applied, including ones no longer in the history
    #[must_use]
    pub const fn applied(&self) -> u64 {
        self.applied
    }
}

impl ActuatorLink for SimulatedActuator {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<String> {
        let step: StepCommand = command.parse()?;
        self.position += step.signed_steps();
        self.applied += 1;
        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back(step);
        }
        info!("[SIM] {command} -> pos={}", self.position);
        Ok(ACK_OK.to_string())
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn name(&self) -> &str {
        "simulator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{position::Direction, Error};

    #[test]
    fn test_position_round_trip() {
        let mut sim = SimulatedActuator::new();
        assert_eq!(sim.send_command("R050").unwrap(), "OK");
        assert_eq!(sim.position(), 50);
        assert_eq!(sim.send_command("L020").unwrap(), "OK");
        assert_eq!(sim.position(), 30);
        assert_eq!(
            sim.history(),
            &[
                StepCommand::new(Direction::Right, 50),
                StepCommand::new(Direction::Left, 20)
            ]
        );
    }

    #[test]
    fn test_history_keeps_most_recent() {
        let mut sim = SimulatedActuator::new().with_history_limit(2);
        for command in ["R010", "R020", "L005"] {
            sim.send_command(command).unwrap();
        }
        assert_eq!(sim.applied(), 3);
        assert_eq!(sim.position(), 25);
        assert_eq!(
            sim.history(),
            &[
                StepCommand::new(Direction::Right, 20),
                StepCommand::new(Direction::Left, 5)
            ]
        );
    }

    #[test]
    fn test_history_can_be_disabled() {
        let mut sim = SimulatedActuator::new().with_history_limit(0);
        sim.send_command("R010").unwrap();
        assert!(sim.history().is_empty());
        assert_eq!(sim.applied(), 1);
    }

    #[test]
    fn test_malformed_command_rejected() {
        let mut sim = SimulatedActuator::at_position(7);
        assert!(matches!(sim.send_command("X010"), Err(Error::InvalidCommand(_))));
        assert_eq!(sim.position(), 7);
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_connect_and_close_are_noops() {
        let mut sim = SimulatedActuator::new();
        sim.close();
        sim.connect().unwrap();
        sim.connect().unwrap();
        assert!(sim.is_connected());
        sim.close();
        sim.close();
        assert!(!sim.is_connected());
        assert_eq!(sim.position(), 0);
    }
}
