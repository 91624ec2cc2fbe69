//! Selection Tests
//!
//! Validates tie-breaking and policy-specific selection through whole
//! scheduler runs.

use sim_kernel::{AgingConfig, SchedulerConfig, SchedulingPolicy, ScriptedBurstPolicy, StateCode};
use tests_scheduling::Harness;

/// Test: Equal priorities are broken round-robin from the last scheduled
///
/// P2 starts at priority 2 and is demoted to 3 after a one-tick quantum,
/// tying with P4. With the cursor on P2 the scan meets P4 first.
#[test]
fn test_tie_goes_to_next_after_cursor() {
    let config = SchedulerConfig {
        time_quantum: 1,
        aging: AgingConfig::disabled(),
        ..SchedulerConfig::default()
    };
    let mut harness = Harness::scripted(
        config,
        &[(5, 9), (5, 9), (5, 2), (5, 9), (5, 3)],
        ScriptedBurstPolicy::new(),
    )
    .unwrap();
    assert_eq!(harness.scheduler.current_running(), Some(2));

    harness.tick();
    assert_eq!(harness.scheduler.record(2).unwrap().priority, 3);
    assert_eq!(harness.scheduler.last_scheduled(), Some(4));
    assert_eq!(harness.scheduler.current_running(), Some(4));

    // P4 is demoted to 4 in turn; P2 is now the only process at 3.
    harness.tick();
    assert_eq!(harness.scheduler.current_running(), Some(2));
}

/// Test: Round robin cycles through processes regardless of priority
#[test]
fn test_round_robin_cycles() {
    let config = SchedulerConfig {
        time_quantum: 1,
        policy: SchedulingPolicy::RoundRobin,
        ..SchedulerConfig::default()
    };
    let mut harness = Harness::scripted(
        config,
        &[(3, 9), (3, 0), (3, 5)],
        ScriptedBurstPolicy::new(),
    )
    .unwrap();
    harness.run_to_completion(50);

    let order: Vec<usize> = (1..=9)
        .map(|tick| {
            (0..3)
                .find(|&p| harness.scheduler.history_state(p, tick) == StateCode::Running)
                .unwrap()
        })
        .collect();
    assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);

    // Round robin leaves priorities alone.
    for (index, record) in harness.scheduler.processes().iter().enumerate() {
        assert_eq!(record.priority, record.initial_priority, "P{}", index);
    }
}

/// Test: FIFO runs each process to the end of its burst
#[test]
fn test_fifo_runs_to_completion() {
    let config = SchedulerConfig {
        time_quantum: 1,
        policy: SchedulingPolicy::Fifo,
        ..SchedulerConfig::default()
    };
    let mut harness = Harness::scripted(
        config,
        &[(4, 9), (2, 0), (3, 5)],
        ScriptedBurstPolicy::new(),
    )
    .unwrap();
    let ticks = harness.run_to_completion(50);

    assert_eq!(ticks, 9);
    let completions: Vec<Option<u64>> = harness
        .scheduler
        .processes()
        .iter()
        .map(|r| r.completion_time)
        .collect();
    assert_eq!(completions, vec![Some(4), Some(6), Some(9)]);
}
