//! Tracking control loop.
//!
//! Each tick reads one frame, detects faces, and turns the first detection
//! into at most one step command. Ticks never overlap; a stop request is
//! observed between ticks only.

use crate::{
    actuator::ActuatorLink,
    config::Config,
    constants::ACK_OK,
    pid::PidController,
    position::PositionCalculator,
    quantizer::{StepCommand, StepQuantizer},
    vision::{FaceDetector, FrameSource},
    Error, Result,
};
use log::{debug, error, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cooperative stop request shared with signal handlers
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after the current tick
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, nothing acquired
    Idle,
    /// Frame source and link acquired
    Running,
    /// Resources released
    Stopped,
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No face in the frame
    NoFace,
    /// Subject within the dead zone
    InDeadZone { offset: i32 },
    /// Correction rounds down to zero steps
    BelowResolution { offset: i32 },
    /// Command transmitted and acknowledged
    Commanded { command: StepCommand, response: String },
    /// Command transmitted but not acknowledged in time
    TimedOut { command: StepCommand },
}

/// Counters for a tracking session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames processed
    pub ticks: u64,
    /// Commands acknowledged
    pub commands: u64,
    /// Frames without a face
    pub no_face: u64,
    /// Frames with the subject inside the dead zone
    pub in_dead_zone: u64,
    /// Corrections too small to move a step
    pub below_resolution: u64,
    /// Acknowledgment timeouts
    pub timeouts: u64,
    /// Acknowledgments other than `OK`
    pub rejected: u64,
}

/// Owns one frame source, detector and actuator link for a tracking session
pub struct ControlLoop<S, D, A>
where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
    A: ActuatorLink,
{
    source: S,
    detector: D,
    link: A,
    calculator: PositionCalculator,
    quantizer: StepQuantizer,
    pid: Option<PidController>,
    sample_interval: f64,
    max_ticks: u64,
    state: LoopState,
    stop: StopSignal,
    stats: SessionStats,
}

impl<S, D, A> ControlLoop<S, D, A>
where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
    A: ActuatorLink,
{
    /// Create an idle loop from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn new(source: S, detector: D, link: A, config: &Config) -> Result<Self> {
        config.validate()?;

        let calculator = PositionCalculator::new(config.camera.geometry(), config.tracking.dead_zone);
        let quantizer = StepQuantizer::new(config.tracking.step_gain, config.tracking.max_steps)?;
        let pid = config.pid.enabled.then(|| PidController::new(config.pid.gains()));

        Ok(Self {
            source,
            detector,
            link,
            calculator,
            quantizer,
            pid,
            sample_interval: config.pid.sample_interval,
            max_ticks: config.tracking.max_ticks,
            state: LoopState::Idle,
            stop: StopSignal::new(),
            stats: SessionStats::default(),
        })
    }

    /// Use an externally owned stop signal
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for requesting a stop from another thread
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub const fn link(&self) -> &A {
        &self.link
    }

    #[must_use]
    pub const fn pid(&self) -> Option<&PidController> {
        self.pid.as_ref()
    }

    /// Acquire the frame source, then the link. `Idle -> Running`.
    ///
    /// # Errors
    ///
    /// Propagates the acquisition failure; anything already acquired is released first.
    pub fn start(&mut self) -> Result<()> {
        if self.state != LoopState::Idle {
            return Err(Error::InvalidState(format!(
                "Cannot start a control loop in state {:?}",
                self.state
            )));
        }

        info!("Starting tracking session on {}", self.link.name());
        self.source.open()?;

        if let Err(e) = self.link.connect() {
            self.source.release();
            return Err(e);
        }

        if let Some(pid) = &mut self.pid {
            pid.reset();
        }
        self.stats = SessionStats::default();
        self.state = LoopState::Running;
        Ok(())
    }

    /// Run one read -> detect -> compute -> send iteration
    ///
    /// # Errors
    ///
    /// Frame, detector, encoding and non-transient link failures are fatal: the
    /// loop releases its resources, moves to [`LoopState::Stopped`] and returns
    /// the error. Acknowledgment timeouts are reported as [`TickOutcome::TimedOut`].
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.state != LoopState::Running {
            return Err(Error::InvalidState(format!(
                "Cannot tick a control loop in state {:?}",
                self.state
            )));
        }

        self.process_frame().map_err(|e| {
            error!("Tracking session failed in {} stage: {e}", e.stage());
            self.stop();
            e
        })
    }

    fn process_frame(&mut self) -> Result<TickOutcome> {
        let frame = self.source.read()?;
        self.stats.ticks += 1;

        let faces = self.detector.detect(&frame)?;
        let Some(subject) = faces.first() else {
            self.stats.no_face += 1;
            return Ok(TickOutcome::NoFace);
        };

        let offset = self.calculator.offset(subject);
        if !self.calculator.needs_adjustment(offset) {
            self.stats.in_dead_zone += 1;
            return Ok(TickOutcome::InDeadZone { offset });
        }

        // PID state is committed only once the command has gone out
        let (command, next_pid) = match &self.pid {
            Some(pid) => {
                let mut next = pid.clone();
                let correction = next.update(f64::from(offset), self.sample_interval)?;
                (self.quantizer.quantize(correction), Some(next))
            }
            None => (self.quantizer.quantize_offset(offset), None),
        };

        if command.magnitude == 0 {
            self.stats.below_resolution += 1;
            return Ok(TickOutcome::BelowResolution { offset });
        }

        let wire = command.encode()?;
        debug!("offset={offset} -> {wire}");

        match self.link.send_command(&wire) {
            Ok(response) => {
                if next_pid.is_some() {
                    self.pid = next_pid;
                }
                self.stats.commands += 1;
                if response != ACK_OK {
                    self.stats.rejected += 1;
                    warn!("Actuator answered {wire} with {response:?}");
                }
                Ok(TickOutcome::Commanded { command, response })
            }
            Err(e) if e.is_transient() => {
                self.stats.timeouts += 1;
                warn!("{e}; skipping {wire}");
                Ok(TickOutcome::TimedOut { command })
            }
            Err(e) => Err(e),
        }
    }

    /// Release link, detector and frame source, in that order. Runs once.
    pub fn stop(&mut self) {
        match self.state {
            LoopState::Running => {
                info!("Stopping tracking session");
                self.link.close();
                self.detector.close();
                self.source.release();
                self.state = LoopState::Stopped;
                info!(
                    "Session finished: {} ticks, {} commands, {} timeouts",
                    self.stats.ticks, self.stats.commands, self.stats.timeouts
                );
            }
            LoopState::Idle => self.state = LoopState::Stopped,
            LoopState::Stopped => {}
        }
    }

    /// Start, tick until stopped or a fatal error occurs, then release everything
    ///
    /// # Errors
    ///
    /// Returns the startup or fatal tick error after resources have been released.
    pub fn run(&mut self) -> Result<SessionStats> {
        self.start()?;

        let result = loop {
            if self.stop.is_requested() {
                info!("Stop requested");
                break Ok(());
            }
            if self.max_ticks > 0 && self.stats.ticks >= self.max_ticks {
                info!("Reached tick limit of {}", self.max_ticks);
                break Ok(());
            }
            if let Err(e) = self.tick() {
                break Err(e);
            }
        };

        self.stop();
        result.map(|()| self.stats)
    }
}

impl<S, D, A> Drop for ControlLoop<S, D, A>
where
    S: FrameSource,
    D: FaceDetector<S::Frame>,
    A: ActuatorLink,
{
    fn drop(&mut self) {
        self.stop();
    }
}
