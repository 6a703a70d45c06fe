use std::sync::mpsc;
use std::time::Duration;

use typetrial::controller::Controller;
use typetrial::runtime::{ChannelEventSource, Runner, SessionEvent, Step, Tick};
use typetrial::session::{Session, SessionPhase};
use typetrial::stats::{ResultStore, StatsDb};
use typetrial::surface::{Notice, ViewState};
use typetrial::word_generator::FixedPrompt;

type TestController = Controller<StatsDb, ViewState, SessionEvent>;

fn controller(
    prompt: &str,
    secs: u64,
    tick: Duration,
) -> (TestController, mpsc::Sender<SessionEvent>, mpsc::Receiver<SessionEvent>) {
    let session = Session::new(
        Duration::from_secs(secs),
        Box::new(FixedPrompt(prompt.to_string())),
    )
    .unwrap();
    let (tx, rx) = mpsc::channel();
    let c = Controller::new(
        session,
        StatsDb::open_in_memory().unwrap(),
        ViewState::new(Duration::from_secs(secs)),
        tx.clone(),
        tick,
    );
    (c, tx, rx)
}

// Headless run of the real event loop: keystrokes and timer ticks share one queue.
#[test]
fn headless_trial_expires_and_submits() {
    let (mut c, tx, rx) = controller("the cat sat", 3, Duration::from_millis(5));
    let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(50));

    tx.send(SessionEvent::Start {
        username: "ada".into(),
    })
    .unwrap();
    tx.send(SessionEvent::InputChanged("the".into())).unwrap();
    tx.send(SessionEvent::InputChanged("the bat".into())).unwrap();

    for _ in 0..1000u32 {
        match runner.step() {
            Step::Event(ev) => {
                let _ = c.handle(ev);
            }
            Step::Idle | Step::Closed => {}
        }
        if c.session().phase() == SessionPhase::Expired {
            break;
        }
    }

    assert_eq!(c.session().phase(), SessionPhase::Expired);
    assert_eq!(c.session().typed(), "the bat");
    assert_eq!(c.surface().metrics.remaining_secs, 0);
    assert_eq!(c.timer_generation(), None);

    // Late input after expiry is dropped.
    c.handle(SessionEvent::InputChanged("the bat sat".into()))
        .unwrap();
    assert_eq!(c.session().typed(), "the bat");

    c.handle(SessionEvent::Submit).unwrap();
    assert_eq!(c.session().phase(), SessionPhase::Submitted);

    let saved = c.store().query_by_user(Some("ada")).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].correct_chars, 6);
    assert_eq!(saved[0].incorrect_chars, 1);
    assert_eq!(saved[0].total_chars, 7);
    assert_eq!(saved[0].accuracy, 86);
    assert_eq!(saved[0].duration_secs, 3);

    let time_ups = c
        .surface()
        .notices
        .iter()
        .filter(|n| **n == Notice::TimeUp)
        .count();
    assert_eq!(time_ups, 1);
}

#[test]
fn ticks_from_a_retired_timer_are_ignored() {
    let (mut c, _tx, rx) = controller("abc", 1000, Duration::from_millis(2));

    c.handle(SessionEvent::Start {
        username: "ada".into(),
    })
    .unwrap();
    let old = c.session().generation();

    // Let the first timer queue up ticks that nobody has processed yet.
    std::thread::sleep(Duration::from_millis(30));

    c.handle(SessionEvent::Reset).unwrap();
    c.handle(SessionEvent::Start {
        username: "ada".into(),
    })
    .unwrap();
    let current = c.session().generation();
    assert_ne!(old, current);

    let mut stale = 0;
    while let Ok(ev) = rx.try_recv() {
        if let SessionEvent::Tick(Tick { generation }) = ev {
            let before = c.session().remaining_secs();
            c.handle(ev).unwrap();
            if generation != current {
                stale += 1;
                assert_eq!(c.session().remaining_secs(), before);
            }
        }
    }
    assert!(stale > 0, "expected queued ticks from the retired timer");
}

#[test]
fn repeated_trials_accumulate_history() {
    let (mut c, _tx, _rx) = controller("ab", 1, Duration::from_secs(3600));

    for typed in ["ab", "ax", "a"] {
        c.handle(SessionEvent::Start {
            username: "bob".into(),
        })
        .unwrap();
        c.handle(SessionEvent::InputChanged(typed.into())).unwrap();
        let generation = c.session().generation();
        c.handle(SessionEvent::Tick(Tick { generation })).unwrap();
        c.handle(SessionEvent::Submit).unwrap();
    }

    let history = c.history(Some("bob")).unwrap();
    assert_eq!(history.len(), 3);

    let best = c.best_stats_for("bob").unwrap();
    assert_eq!(best.total_tests, 3);
    assert_eq!(best.best_accuracy, 100);
}
