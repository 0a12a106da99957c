use std::{sync::Arc, thread};

use shtrace_common::{
    logging::ensure_test_logging, FunctionId, NumberKind, SlotDebugInfo, SlotId, Trace,
    TraceBuilder,
};
use shtrace_engine::{read_trace, CorruptTrace, PlaybackState, Player, PlayerError};
use tracing::info;

/// `int main() { return 2 + 2; }` with the return on line 3.
fn main_returns_four() -> (Arc<Trace>, SlotId) {
    let mut builder = TraceBuilder::new();
    builder.set_source("\nint main() {\n    return 2 + 2;\n}");
    let main = builder.add_function("int main()");
    let result = builder
        .add_slot(SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 2).returning(main));
    builder.enter(main).line(3).var(result, 4).exit(main);
    (builder.build().unwrap().into_shared(), result)
}

struct Nested {
    trace: Arc<Trace>,
    fn_b_result: SlotId,
    fn_a_result: SlotId,
    main_result: SlotId,
}

/// `main` (line 8) calls `fnA` (line 5) which calls `fnB` (line 2).
fn nested_calls() -> Nested {
    let mut builder = TraceBuilder::new();
    builder.set_source(
        "int fnB() {\n    return 2 + 2;\n}\nint fnA() {\n    return fnB();\n}\nint main() {\n    return fnA();\n}",
    );
    let fn_b = builder.add_function("int fnB()");
    let fn_a = builder.add_function("int fnA()");
    let main = builder.add_function("int main()");
    let fn_b_result = builder
        .add_slot(SlotDebugInfo::scalar("[fnB].result", NumberKind::Signed, 1).returning(fn_b));
    let fn_a_result = builder
        .add_slot(SlotDebugInfo::scalar("[fnA].result", NumberKind::Signed, 4).returning(fn_a));
    let main_result = builder
        .add_slot(SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 7).returning(main));

    builder.enter(main).line(8);
    builder.enter(fn_a).line(5);
    builder.enter(fn_b).line(2).var(fn_b_result, 4).exit(fn_b);
    builder.var(fn_a_result, 4).exit(fn_a);
    builder.var(main_result, 4).exit(main);

    Nested { trace: builder.build().unwrap().into_shared(), fn_b_result, fn_a_result, main_result }
}

fn global_values(player: &Player) -> Vec<(SlotId, f64)> {
    player.get_global_variables().iter().map(|var| (var.slot, var.value)).collect()
}

fn local_slots(player: &Player) -> Vec<(SlotId, bool)> {
    let frame = player.get_stack_depth() - 1;
    player.get_local_variables(frame).unwrap().iter().map(|var| (var.slot, var.dirty)).collect()
}

#[test]
fn test_simple_function_steps_to_completion() {
    ensure_test_logging(None);
    info!("Running test");
    let (trace, result) = main_returns_four();
    let mut player = Player::with_trace(trace);
    assert_eq!(player.state(), PlaybackState::NotStarted);

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(3));
    assert_eq!(player.call_stack_names().join(" -> "), "int main()");
    assert_eq!(player.state(), PlaybackState::Running);
    assert!(player.get_global_variables().is_empty());

    player.step().unwrap();
    assert!(player.trace_has_completed());
    assert_eq!(player.state(), PlaybackState::Completed);
    assert!(player.get_call_stack().is_empty());
    assert_eq!(global_values(&player), vec![(result, 4.0)]);
    assert!(player.get_global_variables()[0].dirty);
}

#[test]
fn test_nested_calls_step_into_every_frame() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(8));
    assert_eq!(player.call_stack_names().join(" -> "), "int main()");

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(5));
    assert_eq!(player.call_stack_names().join(" -> "), "int main() -> int fnA()");

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(2));
    assert_eq!(player.call_stack_names().join(" -> "), "int main() -> int fnA() -> int fnB()");
    assert_eq!(player.get_call_stack(), vec![FunctionId::new(2), FunctionId::new(1), FunctionId::new(0)]);
    assert_eq!(player.get_current_line_in_stack_frame(0).unwrap(), Some(8));
    assert_eq!(player.get_current_line_in_stack_frame(1).unwrap(), Some(5));
    assert_eq!(player.get_current_line_in_stack_frame(2).unwrap(), Some(2));

    // Returning from fnB pauses in fnA, which now sees fnB's result.
    player.step().unwrap();
    assert_eq!(player.get_stack_depth(), 2);
    assert_eq!(player.get_current_line(), Some(5));
    assert_eq!(local_slots(&player), vec![(nested.fn_b_result, true)]);

    // The next step withdraws it again.
    player.step().unwrap();
    assert_eq!(player.get_stack_depth(), 1);
    assert_eq!(player.get_current_line(), Some(8));
    assert_eq!(local_slots(&player), vec![(nested.fn_a_result, true)]);

    player.step().unwrap();
    assert!(player.trace_has_completed());
    assert_eq!(global_values(&player), vec![(nested.main_result, 4.0)]);
}

#[test]
fn test_step_over_skips_nested_calls() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(8));

    player.step_over().unwrap();
    assert!(player.trace_has_completed());
    assert!(player.get_call_stack().is_empty());
    assert_eq!(global_values(&player), vec![(nested.main_result, 4.0)]);
}

#[test]
fn test_step_out_returns_to_caller() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);
    for _ in 0..3 {
        player.step().unwrap();
    }
    assert_eq!(player.get_stack_depth(), 3);

    player.step_out().unwrap();
    assert_eq!(player.get_stack_depth(), 2);
    assert_eq!(player.get_current_line(), Some(5));

    player.step_out().unwrap();
    assert_eq!(player.get_stack_depth(), 1);
    assert_eq!(player.get_current_line(), Some(8));

    player.step_out().unwrap();
    assert!(player.trace_has_completed());
}

#[test]
fn test_block_scopes_hide_inner_locals() {
    ensure_test_logging(None);
    info!("Running test");
    let mut builder = TraceBuilder::new();
    builder.set_source(
        "int main() {\n    int a = 1;\n    {\n        int b = 2;\n        {\n            int d = 4;\n        }\n        int c = 3;\n    }\n    int e = 5;\n    return 0;\n}",
    );
    let main = builder.add_function("int main()");
    let result = builder
        .add_slot(SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 1).returning(main));
    let a = builder.add_slot(SlotDebugInfo::scalar("a", NumberKind::Signed, 2));
    let b = builder.add_slot(SlotDebugInfo::scalar("b", NumberKind::Signed, 4));
    let d = builder.add_slot(SlotDebugInfo::scalar("d", NumberKind::Signed, 6));
    let c = builder.add_slot(SlotDebugInfo::scalar("c", NumberKind::Signed, 8));
    let e = builder.add_slot(SlotDebugInfo::scalar("e", NumberKind::Signed, 10));
    builder.enter(main).scope(1);
    builder.line(2).var(a, 1).scope(1);
    builder.line(4).var(b, 2).scope(1);
    builder.line(6).var(d, 4).scope(-1);
    builder.line(8).var(c, 3).scope(-1);
    builder.line(10).var(e, 5);
    builder.line(11).var(result, 0).scope(-1).exit(main);
    let mut player = Player::with_trace(builder.build().unwrap().into_shared());

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(2));
    assert!(local_slots(&player).is_empty());

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(4));
    assert_eq!(local_slots(&player), vec![(a, true)]);

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(6));
    assert_eq!(local_slots(&player), vec![(b, true), (a, false)]);

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(8));
    assert_eq!(local_slots(&player), vec![(b, false), (a, false)], "d left with its block");

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(10));
    assert_eq!(local_slots(&player), vec![(a, false)], "b and c left with their block");

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(11));
    assert_eq!(local_slots(&player), vec![(e, true), (a, false)]);

    player.step().unwrap();
    assert!(player.trace_has_completed());
    assert_eq!(global_values(&player), vec![(result, 0.0)]);
}

#[test]
fn test_if_else_skips_untaken_branch() {
    ensure_test_logging(None);
    info!("Running test");
    let mut builder = TraceBuilder::new();
    builder.set_source(
        "int main() {\n    if (true)\n        return 123;\n    else\n        return 456;\n}",
    );
    let main = builder.add_function("int main()");
    let result = builder
        .add_slot(SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 1).returning(main));
    builder.enter(main).scope(1).line(2).line(3).var(result, 123).scope(-1).exit(main);
    let mut player = Player::with_trace(builder.build().unwrap().into_shared());

    let mut lines = Vec::new();
    while !player.trace_has_completed() {
        player.step().unwrap();
        lines.extend(player.get_current_line());
    }
    assert_eq!(lines, vec![2, 3]);
    assert_eq!(global_values(&player), vec![(result, 123.0)]);
}

#[test]
fn test_loop_line_counts_decrease() {
    ensure_test_logging(None);
    info!("Running test");
    let mut builder = TraceBuilder::new();
    builder.set_source(
        "int main() {\n    int val = 0;\n    for (int temp = 0; temp < 2; ++temp) {\n        ++val;\n    }\n    return val;\n}",
    );
    let main = builder.add_function("int main()");
    let result = builder
        .add_slot(SlotDebugInfo::scalar("[main].result", NumberKind::Signed, 1).returning(main));
    let val = builder.add_slot(SlotDebugInfo::scalar("val", NumberKind::Signed, 2));
    let temp = builder.add_slot(SlotDebugInfo::scalar("temp", NumberKind::Signed, 3));
    builder.enter(main).scope(1);
    builder.line(2).var(val, 0);
    builder.line(3).var(temp, 0);
    builder.line(4).var(val, 1);
    builder.line(3).var(temp, 1);
    builder.line(4).var(val, 2);
    builder.line(3).var(temp, 2);
    builder.line(6).var(result, 2).scope(-1).exit(main);
    let mut player = Player::with_trace(builder.build().unwrap().into_shared());

    let counts = |player: &Player| -> Vec<(i32, u32)> {
        player.get_line_numbers_reached().iter().map(|(&line, &count)| (line, count)).collect()
    };
    assert_eq!(counts(&player), vec![(2, 1), (3, 3), (4, 2), (6, 1)]);

    player.step().unwrap();
    assert_eq!(counts(&player), vec![(2, 0), (3, 3), (4, 2), (6, 1)]);
    player.step().unwrap();
    assert_eq!(counts(&player), vec![(2, 0), (3, 2), (4, 2), (6, 1)]);
    player.step().unwrap();
    assert_eq!(counts(&player), vec![(2, 0), (3, 2), (4, 1), (6, 1)]);
    player.step().unwrap();
    assert_eq!(counts(&player), vec![(2, 0), (3, 1), (4, 1), (6, 1)]);

    player.run().unwrap();
    assert!(player.trace_has_completed());
    assert_eq!(counts(&player), vec![(2, 0), (3, 0), (4, 0), (6, 0)]);
    assert_eq!(global_values(&player), vec![(result, 2.0)]);

    let trace = player.trace().cloned();
    player.reset(trace);
    assert_eq!(counts(&player), vec![(2, 1), (3, 3), (4, 2), (6, 1)]);
}

#[test]
fn test_run_visits_breakpoints_in_execution_order() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);
    player.set_breakpoints([2, 5, 8]);

    let mut visited = Vec::new();
    loop {
        player.run().unwrap();
        if player.trace_has_completed() {
            break;
        }
        visited.push((player.get_current_line(), player.get_stack_depth()));
    }
    assert_eq!(visited, vec![(Some(8), 1), (Some(5), 2), (Some(2), 3)]);
}

#[test]
fn test_run_without_breakpoints_completes() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);
    assert!(player.breakpoints().is_empty());

    player.run().unwrap();
    assert!(player.trace_has_completed());
    assert_eq!(global_values(&player), vec![(nested.main_result, 4.0)]);
}

#[test]
fn test_breakpoint_inside_call_stops_step_over() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);
    player.step().unwrap();
    assert!(player.add_breakpoint(2));
    assert!(!player.add_breakpoint(2));

    player.step_over().unwrap();
    assert_eq!(player.get_current_line(), Some(2));
    assert_eq!(player.get_stack_depth(), 3);

    assert!(player.remove_breakpoint(2));
    assert!(!player.remove_breakpoint(2));
    player.step_over().unwrap();
    assert_eq!(player.get_current_line(), Some(5), "the exit from fnB is a stopping point");
}

#[test]
fn test_breakpoint_inside_call_stops_step_out() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);
    player.step().unwrap();
    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(5));
    assert_eq!(player.get_stack_depth(), 2);

    player.add_breakpoint(2);
    player.step_out().unwrap();
    assert_eq!(player.get_current_line(), Some(2));
    assert_eq!(player.get_stack_depth(), 3);

    player.remove_breakpoint(2);
    player.step_out().unwrap();
    assert_eq!(player.get_current_line(), Some(5));
    assert_eq!(player.get_stack_depth(), 2);
}

#[test]
fn test_stepping_a_completed_trace_changes_nothing() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let mut player = Player::with_trace(nested.trace);
    player.run().unwrap();
    assert!(player.trace_has_completed());
    let cursor = player.cursor();
    let expected = vec![(nested.main_result, 4.0)];
    assert_eq!(global_values(&player), expected);
    assert!(player.get_global_variables()[0].dirty);

    player.step().unwrap();
    player.step_over().unwrap();
    player.step_out().unwrap();
    player.run().unwrap();
    assert_eq!(player.cursor(), cursor);
    assert_eq!(player.get_current_line(), None);
    assert_eq!(global_values(&player), expected, "the return value stays visible");
    assert!(player.get_global_variables()[0].dirty);

    let (trace, result) = main_returns_four();
    let mut player = Player::with_trace(trace);
    player.step().unwrap();
    player.step().unwrap();
    player.step().unwrap();
    assert_eq!(global_values(&player), vec![(result, 4.0)]);
}

#[test]
fn test_replay_is_deterministic() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();

    let snapshot = |player: &mut Player| {
        let mut stops = Vec::new();
        while !player.trace_has_completed() {
            player.step().unwrap();
            stops.push((
                player.cursor(),
                player.get_current_line(),
                player.get_call_stack(),
                player.get_global_variables(),
            ));
        }
        stops
    };

    let mut first = Player::with_trace(Arc::clone(&nested.trace));
    let mut second = Player::with_trace(Arc::clone(&nested.trace));
    let expected = snapshot(&mut first);
    assert_eq!(snapshot(&mut second), expected);

    first.reset(Some(Arc::clone(&nested.trace)));
    assert_eq!(first.state(), PlaybackState::NotStarted);
    assert_eq!(snapshot(&mut first), expected);
}

#[test]
fn test_players_share_a_trace_across_threads() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let trace = Arc::clone(&nested.trace);
            thread::spawn(move || {
                let mut player = Player::with_trace(trace);
                player.run().unwrap();
                player.get_global_variables().iter().map(|var| var.value).collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec![4.0]);
    }
    assert_eq!(Arc::strong_count(&nested.trace), 1);
}

#[test]
fn test_float_values_are_interpreted() {
    ensure_test_logging(None);
    info!("Running test");
    let mut builder = TraceBuilder::new();
    builder.set_source("void main() {\n    float x = 1.5;\n}");
    let main = builder.add_function("void main()");
    let x = builder.add_slot(SlotDebugInfo::scalar("x", NumberKind::Float, 2));
    let flag = builder.add_slot(SlotDebugInfo::scalar("flag", NumberKind::Boolean, 2));
    builder.enter(main).line(2).var_f32(x, 1.5).var(flag, 1).line(3).exit(main);
    let mut player = Player::with_trace(builder.build().unwrap().into_shared());

    player.step().unwrap();
    player.step().unwrap();
    let vars = player.get_local_variables(0).unwrap();
    assert_eq!(vars.len(), 2);
    assert_eq!(vars.iter().find(|var| var.slot == x).unwrap().value, 1.5);
    assert_eq!(vars.iter().find(|var| var.slot == flag).unwrap().value, 1.0);
    assert_eq!(player.slot_bits(x), Some(1.5f32.to_bits() as i32));
}

#[test]
fn test_corrupt_trace_from_json_is_reported() {
    ensure_test_logging(None);
    info!("Running test");
    // Reading does not check indices; the player reports them when it gets there.
    let json = br#"{"source":["void main() {}"],"slots":[],"functions":[{"slot":0,"name":"void main()"}],"trace":[[2],[0,1],[1,7,3],[3]]}"#;
    let trace = read_trace(json).unwrap();
    let mut player = Player::with_trace(trace.into_shared());

    player.step().unwrap();
    assert_eq!(player.get_current_line(), Some(1));
    assert_eq!(
        player.step(),
        Err(PlayerError::CorruptTrace(CorruptTrace::SlotOutOfRange {
            position: 2,
            slot: 7,
            slot_count: 0,
        }))
    );
}

#[test]
fn test_serialized_trace_replays_identically() {
    ensure_test_logging(None);
    info!("Running test");
    let nested = nested_calls();
    let bytes = shtrace_engine::to_json_vec(&nested.trace).unwrap();
    let reread = read_trace(&bytes).unwrap();
    assert_eq!(&reread, nested.trace.as_ref());

    let mut original = Player::with_trace(nested.trace);
    let mut replayed = Player::with_trace(reread.into_shared());
    while !original.trace_has_completed() {
        original.step().unwrap();
        replayed.step().unwrap();
        assert_eq!(original.get_current_line(), replayed.get_current_line());
        assert_eq!(original.get_call_stack(), replayed.get_call_stack());
    }
    assert!(replayed.trace_has_completed());
}
