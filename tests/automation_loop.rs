//! Behavior of the automation loop with instrumented capture and dispatch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use screentrigger::{
    ActionDispatcher, ActionKind, AutomationConfig, AutomationEvent, AutomationLoop, Dispatch,
    Frame, LogLevel, Point, RecordingDispatcher, ReplayCapture, RunState, ScreenCapture,
    TriggerError, TriggerResult,
};

const FAST: Duration = Duration::from_millis(10);

fn noise_frame(width: usize, height: usize, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<u8> = (0..width * height * 3).map(|_| rng.random()).collect();
    Frame::from_rgb(data, width, height).unwrap()
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn drain(events: &mpsc::Receiver<AutomationEvent>) -> Vec<AutomationEvent> {
    events.try_iter().collect()
}

fn log_messages(events: &[AutomationEvent], level: LogLevel) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            AutomationEvent::Log {
                level: l, message, ..
            } if *l == level => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Returns queued frames first, then repeats the last one.
struct SequenceCapture {
    frames: VecDeque<Frame>,
    last: Frame,
}

impl SequenceCapture {
    fn new(frames: Vec<Frame>) -> Self {
        let last = frames.last().cloned().unwrap();
        Self {
            frames: frames.into(),
            last,
        }
    }
}

impl ScreenCapture for SequenceCapture {
    fn capture(&mut self) -> TriggerResult<Frame> {
        Ok(self.frames.pop_front().unwrap_or_else(|| self.last.clone()))
    }
}

/// Fails every odd-numbered call.
struct FlakyCapture {
    frame: Frame,
    calls: Arc<AtomicUsize>,
}

impl ScreenCapture for FlakyCapture {
    fn capture(&mut self) -> TriggerResult<Frame> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 1 {
            return Err(TriggerError::CaptureUnavailable {
                reason: "display asleep".to_string(),
            });
        }
        Ok(self.frame.clone())
    }
}

/// Panics on the first action.
struct PanickingDispatcher;

impl ActionDispatcher for PanickingDispatcher {
    fn dispatch(&mut self, _action: &ActionKind, _point: Point) -> TriggerResult<()> {
        panic!("input backend crashed");
    }
}

/// Records each action, then blocks until released.
struct GatedDispatcher {
    log: RecordingDispatcher,
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

impl ActionDispatcher for GatedDispatcher {
    fn dispatch(&mut self, action: &ActionKind, point: Point) -> TriggerResult<()> {
        self.log.dispatch(action, point)?;
        let _ = self.entered.send(());
        let _ = self.release.recv();
        Ok(())
    }
}

/// Rejects every action.
struct RejectingDispatcher {
    attempts: Arc<AtomicUsize>,
}

impl ActionDispatcher for RejectingDispatcher {
    fn dispatch(&mut self, _action: &ActionKind, _point: Point) -> TriggerResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TriggerError::InputInjectionFailed {
            reason: "accessibility permission denied".to_string(),
        })
    }
}

fn solid_loop() -> (AutomationLoop, mpsc::Receiver<AutomationEvent>, RecordingDispatcher) {
    let frame = Frame::filled(10, 10, [30, 60, 90]).unwrap();
    let dispatcher = RecordingDispatcher::new();
    let (automation, events) = AutomationLoop::with_channel(
        Box::new(ReplayCapture::new(vec![frame])),
        Box::new(dispatcher.clone()),
    );
    (
        automation.with_config(AutomationConfig::default().with_interval(FAST)),
        events,
        dispatcher,
    )
}

#[test]
fn start_without_tasks_is_rejected() {
    let (mut automation, _events, _) = solid_loop();
    automation.capture_baseline().unwrap();
    assert_eq!(automation.start(), Err(TriggerError::NoTasksConfigured));
    assert_eq!(automation.run_state(), RunState::Stopped);
}

#[test]
fn start_without_baseline_is_rejected() {
    let (mut automation, _events, _) = solid_loop();
    let template = Frame::filled(10, 10, [30, 60, 90]).unwrap();
    automation
        .add_task_frame("solid", template, ActionKind::Click)
        .unwrap();
    assert_eq!(automation.start(), Err(TriggerError::NoBaselineCapture));
    assert_eq!(automation.run_state(), RunState::Stopped);
}

#[test]
fn solid_frame_dispatches_at_center() {
    let (mut automation, events, dispatcher) = solid_loop();
    let template = Frame::filled(10, 10, [30, 60, 90]).unwrap();
    automation
        .add_task_frame("solid", template, ActionKind::Click)
        .unwrap();
    automation.capture_baseline().unwrap();

    let report = automation.run_once().unwrap();
    assert_eq!(report.detections, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(
        dispatcher.log().entries(),
        vec![Dispatch {
            action: ActionKind::Click,
            point: Point::new(5, 5),
        }]
    );

    let events = drain(&events);
    let infos = log_messages(&events, LogLevel::Info);
    assert!(infos.contains(&"Found solid at (5, 5)".to_string()));
    assert!(infos.contains(&"Clicked (5, 5)".to_string()));
    let detection = events
        .iter()
        .find_map(|event| match event {
            AutomationEvent::Detection {
                task_name,
                point,
                confidence,
                annotated_png,
                ..
            } => Some((task_name.clone(), *point, *confidence, annotated_png.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(detection.0, "solid");
    assert_eq!(detection.1, Point::new(5, 5));
    assert_eq!(detection.2, 1.0);

    let preview = image::load_from_memory(&detection.3).unwrap().to_rgb8();
    assert_eq!(preview.dimensions(), (10, 10));
    assert_eq!(preview.get_pixel(0, 0).0, [0, 255, 0]);
    assert_eq!(preview.get_pixel(5, 5).0, [30, 60, 90]);
}

#[test]
fn tasks_fire_in_insertion_order_every_cycle() {
    let frame = noise_frame(80, 60, 11);
    let dispatcher = RecordingDispatcher::new();
    let (mut automation, _events) = AutomationLoop::with_channel(
        Box::new(ReplayCapture::new(vec![frame.clone()])),
        Box::new(dispatcher.clone()),
    );
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("later-on-screen", frame.crop(40, 30, 12, 10).unwrap(), ActionKind::default_drag())
        .unwrap();
    automation
        .add_task_frame("earlier-on-screen", frame.crop(10, 10, 8, 8).unwrap(), ActionKind::Click)
        .unwrap();

    automation.run_once().unwrap();
    automation.run_once().unwrap();

    let first = Dispatch {
        action: ActionKind::default_drag(),
        point: Point::new(46, 35),
    };
    let second = Dispatch {
        action: ActionKind::Click,
        point: Point::new(14, 14),
    };
    assert_eq!(dispatcher.log().entries(), vec![first, second, first, second]);
}

#[test]
fn stop_halts_dispatch() {
    let (mut automation, _events, dispatcher) = solid_loop();
    let template = Frame::filled(10, 10, [30, 60, 90]).unwrap();
    automation
        .add_task_frame("solid", template, ActionKind::Click)
        .unwrap();
    automation.capture_baseline().unwrap();

    automation.start().unwrap();
    assert_eq!(automation.run_state(), RunState::Running);
    let log = dispatcher.log();
    assert!(wait_until(Duration::from_secs(5), || log.len() >= 3));

    automation.stop();
    assert_eq!(automation.run_state(), RunState::Stopped);
    let after_stop = log.len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(log.len(), after_stop);
}

#[test]
fn start_while_running_is_a_noop_and_restart_works() {
    let (mut automation, _events, dispatcher) = solid_loop();
    let template = Frame::filled(10, 10, [30, 60, 90]).unwrap();
    automation
        .add_task_frame("solid", template, ActionKind::Click)
        .unwrap();
    automation.capture_baseline().unwrap();

    automation.start().unwrap();
    assert_eq!(automation.start(), Ok(()));
    automation.stop();

    let log = dispatcher.log();
    let before = log.len();
    automation.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || log.len() > before));
    automation.stop();
}

#[test]
fn capture_failures_skip_cycles_without_stopping() {
    let frame = Frame::filled(10, 10, [1, 2, 3]).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = RecordingDispatcher::new();
    let (automation, events) = AutomationLoop::with_channel(
        Box::new(FlakyCapture {
            frame: frame.clone(),
            calls: Arc::clone(&calls),
        }),
        Box::new(dispatcher.clone()),
    );
    let mut automation = automation.with_config(AutomationConfig::default().with_interval(FAST));
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("solid", frame, ActionKind::Click)
        .unwrap();

    automation.start().unwrap();
    let log = dispatcher.log();
    assert!(wait_until(Duration::from_secs(5), || log.len() >= 2));
    assert_eq!(automation.run_state(), RunState::Running);
    automation.stop();

    let warnings = log_messages(&drain(&events), LogLevel::Warn);
    assert!(warnings
        .iter()
        .any(|m| m.starts_with("Capture failed, skipping cycle")));
}

#[test]
fn rejected_input_skips_action_without_stopping() {
    let frame = Frame::filled(10, 10, [5, 5, 5]).unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let (automation, events) = AutomationLoop::with_channel(
        Box::new(ReplayCapture::new(vec![frame.clone()])),
        Box::new(RejectingDispatcher {
            attempts: Arc::clone(&attempts),
        }),
    );
    let mut automation = automation.with_config(AutomationConfig::default().with_interval(FAST));
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("solid", frame, ActionKind::Click)
        .unwrap();

    automation.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || attempts
        .load(Ordering::SeqCst)
        >= 3));
    assert_eq!(automation.run_state(), RunState::Running);
    automation.stop();

    let events = drain(&events);
    let warnings = log_messages(&events, LogLevel::Warn);
    assert!(warnings
        .iter()
        .any(|m| m.starts_with("Action for solid skipped")));
    assert!(events
        .iter()
        .any(|e| matches!(e, AutomationEvent::Detection { .. })));
}

#[test]
fn template_larger_than_later_frames_never_dispatches() {
    let large = noise_frame(40, 40, 21);
    let small = noise_frame(20, 20, 22);
    let dispatcher = RecordingDispatcher::new();
    let (mut automation, events) = AutomationLoop::with_channel(
        Box::new(SequenceCapture::new(vec![large.clone(), small])),
        Box::new(dispatcher.clone()),
    );
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("wide", large.crop(0, 0, 30, 30).unwrap(), ActionKind::Click)
        .unwrap();

    for _ in 0..3 {
        let report = automation.run_once().unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.dispatched, 0);
    }
    assert!(dispatcher.log().is_empty());

    let warnings = log_messages(&drain(&events), LogLevel::Warn);
    assert_eq!(warnings.len(), 3);
    assert!(warnings[0].starts_with("Skipping wide: template 30x30 is larger than frame 20x20"));
}

#[test]
fn template_larger_than_baseline_is_rejected_at_add_time() {
    let (automation, _events, _) = solid_loop();
    automation.capture_baseline().unwrap();
    let err = automation
        .add_task_frame("huge", noise_frame(11, 4, 1), ActionKind::Click)
        .unwrap_err();
    assert_eq!(
        err,
        TriggerError::TemplateLargerThanFrame {
            template_width: 11,
            template_height: 4,
            frame_width: 10,
            frame_height: 10,
        }
    );
    assert!(automation.tasks().is_empty());
}

#[test]
fn task_management_errors() {
    let (automation, events, _) = solid_loop();
    let template = Frame::filled(2, 2, [0, 0, 0]).unwrap();
    automation
        .add_task_frame("a", template.clone(), ActionKind::Click)
        .unwrap();
    assert_eq!(
        automation.add_task_frame("a", template, ActionKind::Click),
        Err(TriggerError::DuplicateTask {
            name: "a".to_string()
        })
    );
    assert_eq!(
        automation.remove_task("b"),
        Err(TriggerError::UnknownTask {
            name: "b".to_string()
        })
    );
    automation.remove_task("a").unwrap();
    assert!(automation.tasks().is_empty());

    let infos = log_messages(&drain(&events), LogLevel::Info);
    assert_eq!(infos, vec!["Added task: a -> click", "Removed task: a"]);
}

#[test]
fn baseline_capture_while_running_uses_the_live_screen() {
    let small = Frame::filled(10, 10, [30, 60, 90]).unwrap();
    let large = Frame::filled(20, 20, [30, 60, 90]).unwrap();
    let (automation, _events) = AutomationLoop::with_channel(
        Box::new(SequenceCapture::new(vec![small.clone(), large])),
        Box::new(RecordingDispatcher::new()),
    );
    let mut automation = automation.with_config(AutomationConfig::default().with_interval(FAST));
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("solid", small, ActionKind::Click)
        .unwrap();

    automation.start().unwrap();
    automation.capture_baseline().unwrap();
    assert_eq!(automation.baseline().map(|f| f.width()), Some(20));
    automation
        .add_task_frame("wider", Frame::filled(15, 15, [1, 1, 1]).unwrap(), ActionKind::Click)
        .unwrap();
    assert_eq!(automation.run_state(), RunState::Running);
    automation.stop();
}

#[test]
fn worker_panic_stops_the_loop_and_is_reported() {
    let frame = Frame::filled(10, 10, [4, 4, 4]).unwrap();
    let (automation, events) = AutomationLoop::with_channel(
        Box::new(ReplayCapture::new(vec![frame.clone()])),
        Box::new(PanickingDispatcher),
    );
    let mut automation = automation.with_config(AutomationConfig::default().with_interval(FAST));
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("solid", frame, ActionKind::Click)
        .unwrap();

    automation.start().unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        automation.run_state() == RunState::Stopped
    }));
    assert!(matches!(
        automation.start(),
        Err(TriggerError::WorkerUnavailable { .. })
    ));
    assert_eq!(automation.run_state(), RunState::Stopped);

    let errors = log_messages(&drain(&events), LogLevel::Error);
    assert!(errors.iter().any(|m| m.starts_with("Automation worker panicked")));
}

#[test]
fn stop_skips_the_rest_of_the_task_set() {
    let frame = noise_frame(60, 40, 31);
    let recorder = RecordingDispatcher::new();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let (automation, events) = AutomationLoop::with_channel(
        Box::new(ReplayCapture::new(vec![frame.clone()])),
        Box::new(GatedDispatcher {
            log: recorder.clone(),
            entered: entered_tx,
            release: release_rx,
        }),
    );
    let mut automation = automation.with_config(AutomationConfig::default().with_interval(FAST));
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame("first", frame.crop(5, 5, 10, 10).unwrap(), ActionKind::Click)
        .unwrap();
    automation
        .add_task_frame("second", frame.crop(30, 20, 10, 10).unwrap(), ActionKind::Click)
        .unwrap();
    let shared = automation.shared_state();

    automation.start().unwrap();
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let stopper = thread::spawn(move || {
        automation.stop();
        automation
    });
    assert!(wait_until(Duration::from_secs(5), || {
        shared.run_state() == RunState::Stopped
    }));
    release_tx.send(()).unwrap();
    drop(stopper.join().unwrap());

    assert_eq!(
        recorder.log().entries(),
        vec![Dispatch {
            action: ActionKind::Click,
            point: Point::new(10, 10),
        }]
    );
    let infos = log_messages(&drain(&events), LogLevel::Info);
    assert!(infos.iter().any(|m| m.starts_with("Found first")));
    assert!(!infos.iter().any(|m| m.starts_with("Found second")));
}

#[test]
fn stop_interrupts_a_long_interval() {
    let (automation, _events, dispatcher) = solid_loop();
    let mut automation =
        automation.with_config(AutomationConfig::default().with_interval(Duration::from_secs(10)));
    automation.capture_baseline().unwrap();
    automation
        .add_task_frame(
            "solid",
            Frame::filled(10, 10, [30, 60, 90]).unwrap(),
            ActionKind::Click,
        )
        .unwrap();

    automation.start().unwrap();
    let log = dispatcher.log();
    assert!(wait_until(Duration::from_secs(5), || log.len() == 1));

    let started = Instant::now();
    automation.stop();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(log.len(), 1);
}
