//! Property-based invariant tests for synchronized playback.
//!
//! 1. A frozen offset always addresses a cached frame set
//! 2. Freeze then resume goes back to live, and the next tick reads fresh frames
//! 3. `m` steps back then `m` steps forward land on the same frames
//! 4. Stepping back at the oldest entry is refused with a notice
//! 5. Melting replays every offset up to the newest, in order, exactly once
//! 6. Every stream shows the same frame index on every tick

use proptest::prelude::*;
use syncplay::display::RecordingDisplay;
use syncplay::media::process::solid_rgb;
use syncplay::media::Frame;
use syncplay::playback::{
    Command, Notice, PlaybackMachine, PlaybackState, Response, TickAction,
};
use syncplay::source::{MemoryOpener, MemorySource};
use syncplay::{Player, PlayerConfig};

// ── Strategies ──────────────────────────────────────────────────────────

/// One step of an operator session: a tick, or a tick followed by a command
#[derive(Debug, Clone, Copy)]
enum Step {
    Tick,
    Command(Command),
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Freeze),
        Just(Command::Resume),
        Just(Command::StepForward),
        Just(Command::StepBackward),
        Just(Command::JumpToLatest),
        Just(Command::JumpToEarliest),
        Just(Command::Progress),
        Just(Command::Help),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::Tick),
        3 => command_strategy().prop_map(Step::Command),
    ]
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Frame whose pixel encodes its index in the stream
fn numbered(i: u32) -> Frame {
    solid_rgb(1, 1, ((i >> 16) as u8, (i >> 8) as u8, i as u8))
}

fn index_of(frame: &Frame) -> u32 {
    let (r, g, b) = frame.rgb_at(0, 0);
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Tick the bare state machine against a simulated cache length
fn machine_tick(machine: &mut PlaybackMachine, len: &mut usize, capacity: usize) -> isize {
    let offset = match machine.begin_tick() {
        TickAction::Advance => {
            *len = (*len + 1).min(capacity);
            -1
        }
        TickAction::Replay(o) => o,
    };
    machine.end_tick();
    offset
}

fn player(streams: usize, frames: u32, capacity: usize) -> Player<MemorySource, RecordingDisplay> {
    let names: Vec<String> = (0..streams).map(|i| format!("cam{}", i)).collect();
    let opener = names.iter().fold(MemoryOpener::new(), |o, name| {
        o.with_stream(name.as_str(), (0..frames).map(numbered).collect())
    });
    let config = PlayerConfig::with_streams(names).cache_capacity(capacity);

    runtime()
        .block_on(Player::open(config, &opener, RecordingDisplay::new()))
        .unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

/// Frame indices shown by the last tick, one per stream
fn last_shown(player: &Player<MemorySource, RecordingDisplay>) -> Vec<u32> {
    player
        .display()
        .presented
        .last()
        .map(|set| set.iter().map(|(_, f)| index_of(f)).collect())
        .unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Frozen offsets stay inside the cache
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn frozen_offset_always_cached(
        capacity in 1usize..12,
        steps in prop::collection::vec(step_strategy(), 1..120),
    ) {
        let mut machine = PlaybackMachine::new();
        let mut len = 0usize;

        for step in steps {
            let shown = machine_tick(&mut machine, &mut len, capacity);
            prop_assert!(shown >= -(len as isize) && shown <= -1);

            if let Step::Command(command) = step {
                machine.apply(command, len);
            }
            match machine.state() {
                PlaybackState::Frozen(o) | PlaybackState::Melting(o) => {
                    prop_assert!(o >= -(len as isize), "offset {} with {} cached", o, len);
                    prop_assert!(o <= -1);
                }
                PlaybackState::Live => {}
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Freeze then resume
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn freeze_resume_reads_fresh(warmup in 1usize..20, capacity in 1usize..12) {
        let mut machine = PlaybackMachine::new();
        let mut len = 0usize;
        for _ in 0..warmup {
            machine_tick(&mut machine, &mut len, capacity);
        }

        prop_assert_eq!(machine.apply(Command::Freeze, len), Response::Continue(None));
        prop_assert_eq!(machine.apply(Command::Resume, len), Response::Continue(None));
        prop_assert_eq!(machine.state(), PlaybackState::Live);
        prop_assert_eq!(machine.begin_tick(), TickAction::Advance);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Back and forth
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn back_then_forward_restores_frames(
        streams in 1usize..4,
        capacity in 2usize..10,
        warmup in 1u32..15,
        m_seed in any::<usize>(),
    ) {
        let rt = runtime();
        let mut player = player(streams, 40, capacity);
        for _ in 0..warmup {
            rt.block_on(player.tick()).unwrap();
        }
        player.handle(Command::Freeze).unwrap();
        rt.block_on(player.tick()).unwrap();
        let before = last_shown(&player);

        let m = m_seed % player.cache().len();
        for _ in 0..m {
            player.handle(Command::StepBackward).unwrap();
        }
        prop_assert_eq!(player.state(), PlaybackState::Frozen(-1 - m as isize));
        for _ in 0..m {
            player.handle(Command::StepForward).unwrap();
        }
        rt.block_on(player.tick()).unwrap();

        prop_assert_eq!(player.state(), PlaybackState::Frozen(-1));
        prop_assert_eq!(last_shown(&player), before);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Rewind limit
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn step_back_at_oldest_is_refused(capacity in 1usize..12, extra in 0usize..10) {
        let mut machine = PlaybackMachine::new();
        let mut len = 0usize;
        for _ in 0..capacity + extra {
            machine_tick(&mut machine, &mut len, capacity);
        }
        machine.apply(Command::Freeze, len);
        machine.apply(Command::JumpToEarliest, len);
        let oldest = machine.state();

        prop_assert_eq!(
            machine.apply(Command::StepBackward, len),
            Response::Continue(Some(Notice::CannotRewind))
        );
        prop_assert_eq!(machine.state(), oldest);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Melting
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn melting_visits_each_offset_once(capacity in 2usize..15, extra in 0usize..10) {
        let mut machine = PlaybackMachine::new();
        let mut len = 0usize;
        for _ in 0..capacity + extra {
            machine_tick(&mut machine, &mut len, capacity);
        }
        machine.apply(Command::Freeze, len);
        machine.apply(Command::JumpToEarliest, len);
        let start = machine.offset().unwrap();
        machine.apply(Command::Resume, len);

        let mut visited = Vec::new();
        while machine.state() != PlaybackState::Live {
            visited.push(machine_tick(&mut machine, &mut len, capacity));
        }

        let expected: Vec<isize> = (start + 1..=-1).collect();
        prop_assert_eq!(visited, expected);
        prop_assert_eq!(machine.begin_tick(), TickAction::Advance);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Streams stay in lockstep
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn streams_stay_in_lockstep(
        streams in 1usize..4,
        capacity in 1usize..8,
        steps in prop::collection::vec(step_strategy(), 1..60),
    ) {
        let rt = runtime();
        let mut player = player(streams, 200, capacity);

        for step in steps {
            rt.block_on(player.tick()).unwrap();

            let shown = last_shown(&player);
            prop_assert_eq!(shown.len(), streams);
            prop_assert!(shown.iter().all(|&i| i == shown[0]), "{:?}", shown);

            let positions = player.sources().positions();
            prop_assert!(positions.iter().all(|&p| p == positions[0]));

            if let Step::Command(command) = step {
                player.handle(command).unwrap();
            }
        }
    }
}
