//! Control loop lifecycle, failure policy and command emission


use face_pan_tracker::{
    config::Config,
    control::{ControlLoop, LoopState, StopSignal, TickOutcome},
    position::{BoundingBox, Direction},
    quantizer::StepCommand,
    Error,
};
use test_helpers::{Frame, Journal, JournalingDetector, RecordingLink, Reply, ScriptedSource};

const FAR_LEFT: BoundingBox = BoundingBox::new(200, 100, 50, 50);

fn control(
    journal: &Journal,
    source: ScriptedSource,
    link: RecordingLink,
    config: &Config,
) -> ControlLoop<ScriptedSource, JournalingDetector, RecordingLink> {
    ControlLoop::new(source, JournalingDetector::new(journal), link, config).unwrap()
}

#[test]
fn test_acquire_then_release_in_reverse_order() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 3);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());

    // Script runs out after three frames, which is a fatal read failure
    let result = control.run();
    assert!(matches!(result, Err(Error::Camera(_))));
    assert_eq!(control.state(), LoopState::Stopped);
    assert_eq!(control.link().sent(), &["L047", "L047", "L047"]);

    drop(control);
    assert_eq!(
        journal.events(),
        vec![
            "source.open",
            "link.connect",
            "link.close",
            "detector.close",
            "source.release"
        ]
    );
}

#[test]
fn test_link_failure_releases_source() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 3);
    let link = RecordingLink::new(&journal).failing_connect();
    let mut control = control(&journal, source, link, &Config::default());

    let err = control.run().unwrap_err();
    assert_eq!(err.stage(), "link");

    drop(control);
    assert_eq!(
        journal.events(),
        vec!["source.open", "link.connect.failed", "source.release"]
    );
}

#[test]
fn test_source_failure_acquires_nothing() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 3).failing_open();
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());

    let err = control.run().unwrap_err();
    assert_eq!(err.stage(), "camera");

    drop(control);
    assert_eq!(journal.events(), vec!["source.open.failed"]);
}

#[test]
fn test_no_face_is_a_silent_tick() {
    let journal = Journal::default();
    let stop = StopSignal::new();
    let source = ScriptedSource::new(&journal, (0..3).map(|_| Frame::Faces(vec![])).collect())
        .stop_after(3, stop.clone());
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default())
        .with_stop_signal(stop);

    let stats = control.run().unwrap();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.no_face, 3);
    assert_eq!(stats.commands, 0);
    assert!(control.link().sent().is_empty());
}

#[test]
fn test_dead_zone_boundary_sends_nothing() {
    let journal = Journal::default();
    let script = vec![
        // offset +50
        Frame::Faces(vec![BoundingBox::new(345, 100, 50, 50)]),
        // offset -50
        Frame::Faces(vec![BoundingBox::new(245, 100, 50, 50)]),
        // first detection is centered, the second is ignored
        Frame::Faces(vec![BoundingBox::new(295, 100, 50, 50), FAR_LEFT]),
    ];
    let source = ScriptedSource::new(&journal, script);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());
    control.start().unwrap();

    assert_eq!(control.tick().unwrap(), TickOutcome::InDeadZone { offset: 50 });
    assert_eq!(control.tick().unwrap(), TickOutcome::InDeadZone { offset: -50 });
    assert_eq!(control.tick().unwrap(), TickOutcome::InDeadZone { offset: 0 });
    assert!(control.link().sent().is_empty());
    assert_eq!(control.stats().in_dead_zone, 3);
}

#[test]
fn test_just_outside_dead_zone_moves_right() {
    let journal = Journal::default();
    // offset +51
    let source = ScriptedSource::repeating(&journal, BoundingBox::new(346, 100, 50, 50), 1);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());
    control.start().unwrap();

    let outcome = control.tick().unwrap();
    assert_eq!(
        outcome,
        TickOutcome::Commanded {
            command: StepCommand::new(Direction::Right, 25),
            response: "OK".to_string()
        }
    );
    assert_eq!(control.link().sent(), &["R025"]);
}

#[test]
fn test_timeout_is_counted_and_loop_continues() {
    let journal = Journal::default();
    let stop = StopSignal::new();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 2).stop_after(2, stop.clone());
    let link = RecordingLink::new(&journal).with_replies(vec![Reply::Timeout, Reply::Ack("OK")]);
    let mut control = control(&journal, source, link, &Config::default()).with_stop_signal(stop);

    let stats = control.run().unwrap();
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.commands, 1);
    assert_eq!(control.link().sent().len(), 2);
}

#[test]
fn test_timeout_leaves_pid_state_untouched() {
    let journal = Journal::default();
    let mut config = Config::default();
    config.pid.enabled = true;
    config.pid.kp = 1.0;
    config.pid.ki = 1.0;
    config.pid.kd = 0.0;
    config.pid.sample_interval = 1.0;

    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 2);
    let link = RecordingLink::new(&journal).with_replies(vec![Reply::Timeout]);
    let mut control = control(&journal, source, link, &config);
    control.start().unwrap();

    assert!(matches!(control.tick().unwrap(), TickOutcome::TimedOut { .. }));
    let pid = control.pid().unwrap();
    assert_eq!(pid.integral(), 0.0);
    assert_eq!(pid.previous_error(), 0.0);

    // kp * -95 + ki * -95 = -190, times 0.5 gain
    let outcome = control.tick().unwrap();
    assert_eq!(
        outcome,
        TickOutcome::Commanded {
            command: StepCommand::new(Direction::Left, 95),
            response: "OK".to_string()
        }
    );
    assert_eq!(control.pid().unwrap().integral(), -95.0);
    assert_eq!(control.link().sent(), &["L095", "L095"]);
}

#[test]
fn test_link_not_open_is_fatal() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 5);
    let link = RecordingLink::new(&journal).with_replies(vec![Reply::Ack("OK"), Reply::NotOpen]);
    let mut control = control(&journal, source, link, &Config::default());

    assert!(matches!(control.run(), Err(Error::LinkNotOpen)));
    assert_eq!(control.stats().ticks, 2);
    assert_eq!(control.state(), LoopState::Stopped);
    drop(control);
    assert_eq!(journal.count("source.release"), 1);
    assert_eq!(journal.count("link.close"), 1);
}

#[test]
fn test_fatal_tick_stops_and_releases() {
    let journal = Journal::default();
    let script = vec![Frame::ReadError, Frame::Faces(vec![FAR_LEFT])];
    let source = ScriptedSource::new(&journal, script);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());
    control.start().unwrap();

    assert!(matches!(control.tick(), Err(Error::Camera(_))));
    assert_eq!(control.state(), LoopState::Stopped);
    assert_eq!(
        journal.events(),
        vec![
            "source.open",
            "link.connect",
            "link.close",
            "detector.close",
            "source.release"
        ]
    );

    // No motor command may follow a fatal error
    let err = control.tick().unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(err.stage(), "control");
    assert!(control.link().sent().is_empty());

    drop(control);
    assert_eq!(journal.count("source.release"), 1);
}

#[test]
fn test_link_not_open_during_tick_halts() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 3);
    let link = RecordingLink::new(&journal).with_replies(vec![Reply::NotOpen]);
    let mut control = control(&journal, source, link, &Config::default());
    control.start().unwrap();

    assert!(matches!(control.tick(), Err(Error::LinkNotOpen)));
    assert_eq!(control.state(), LoopState::Stopped);
    assert!(matches!(control.tick(), Err(Error::InvalidState(_))));
    assert_eq!(control.stats().ticks, 1);

    drop(control);
    assert_eq!(journal.count("link.close"), 1);
    assert_eq!(journal.count("source.release"), 1);
}

#[test]
fn test_timeout_keeps_loop_running() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 2);
    let link = RecordingLink::new(&journal).with_replies(vec![Reply::Timeout]);
    let mut control = control(&journal, source, link, &Config::default());
    control.start().unwrap();

    assert!(matches!(control.tick().unwrap(), TickOutcome::TimedOut { .. }));
    assert_eq!(control.state(), LoopState::Running);
    assert_eq!(journal.count("link.close"), 0);
}

#[test]
fn test_other_acknowledgments_are_counted() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 1);
    let link = RecordingLink::new(&journal).with_replies(vec![Reply::Ack("BUSY")]);
    let mut control = control(&journal, source, link, &Config::default());
    control.start().unwrap();

    let outcome = control.tick().unwrap();
    assert!(matches!(outcome, TickOutcome::Commanded { ref response, .. } if response == "BUSY"));
    assert_eq!(control.stats().rejected, 1);
    assert_eq!(control.stats().commands, 1);
}

#[test]
fn test_correction_below_one_step_is_not_sent() {
    let journal = Journal::default();
    let mut config = Config::default();
    config.tracking.step_gain = 0.01;

    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 1);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &config);
    control.start().unwrap();

    assert_eq!(control.tick().unwrap(), TickOutcome::BelowResolution { offset: -95 });
    assert!(control.link().sent().is_empty());
}

#[test]
fn test_stop_requested_before_run() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 5);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());
    control.stop_signal().request();

    let stats = control.run().unwrap();
    assert_eq!(stats.ticks, 0);
    drop(control);
    assert_eq!(journal.count("link.close"), 1);
    assert_eq!(journal.count("source.release"), 1);
}

#[test]
fn test_release_runs_exactly_once() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 5);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());
    control.start().unwrap();
    control.tick().unwrap();

    control.stop();
    control.stop();
    drop(control);

    assert_eq!(journal.count("link.close"), 1);
    assert_eq!(journal.count("detector.close"), 1);
    assert_eq!(journal.count("source.release"), 1);
}

#[test]
fn test_drop_releases_running_loop() {
    let journal = Journal::default();
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 5);
    let mut control = control(&journal, source, RecordingLink::new(&journal), &Config::default());
    control.start().unwrap();
    drop(control);

    assert_eq!(journal.count("link.close"), 1);
    assert_eq!(journal.count("source.release"), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let journal = Journal::default();
    let mut config = Config::default();
    config.tracking.max_steps = 5000;
    let source = ScriptedSource::repeating(&journal, FAR_LEFT, 1);
    let result = ControlLoop::new(source, JournalingDetector::new(&journal), RecordingLink::new(&journal), &config);
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
