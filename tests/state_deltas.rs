use clubrisk_terminal::club::{ClubRecord, RiskCategory};
use clubrisk_terminal::directory::ClubDirectory;
use clubrisk_terminal::state::{AppState, BatchStatus, Delta, ProviderCommand, apply_delta};

fn scored(name: &str, score: f64) -> ClubRecord {
    let mut record = ClubRecord::placeholder(name);
    record.score = Some(score);
    record
}

fn state_with_directory() -> AppState {
    let mut state = AppState::new();
    state.directory = ClubDirectory::from_names(
        ["Arsenal", "Chelsea", "Liverpool", "Everton", "Manchester City"]
            .iter()
            .map(|n| n.to_string())
            .collect(),
    );
    state
}

fn ticket_of(cmd: Option<ProviderCommand>) -> u64 {
    match cmd {
        Some(ProviderCommand::FetchClubRisk { ticket, .. }) => ticket,
        Some(ProviderCommand::FetchBatchRisk { ticket, .. }) => ticket,
        other => panic!("expected a fetch command, got {other:?}"),
    }
}

#[test]
fn select_then_single_fetch_enriches_placeholder() {
    let mut state = state_with_directory();
    state.set_search_term("ars");

    let cmd = state.select_club("Arsenal");
    let ticket = match &cmd {
        Some(ProviderCommand::FetchClubRisk { name, ticket }) => {
            assert_eq!(name, "Arsenal");
            *ticket
        }
        other => panic!("unexpected command {other:?}"),
    };
    assert!(state.search_term.is_empty());

    let placeholder = state.selection.get("Arsenal").expect("placeholder present");
    assert_eq!(placeholder.score, None);
    assert_eq!(placeholder.category(), RiskCategory::Pending);
    assert!(!state.show_strategies());

    apply_delta(
        &mut state,
        Delta::ClubRiskLoaded {
            name: "Arsenal".to_string(),
            ticket,
            record: scored("Arsenal", 45.0),
        },
    );

    let record = state.selection.get("Arsenal").expect("record present");
    assert_eq!(record.score, Some(45.0));
    assert_eq!(record.category(), RiskCategory::Medium);
    assert!(state.show_strategies());
    assert!(state.last_assessed_at.is_some());
}

#[test]
fn single_fetch_failure_keeps_pending_placeholder() {
    let mut state = state_with_directory();
    let ticket = ticket_of(state.select_club("Chelsea"));

    apply_delta(
        &mut state,
        Delta::ClubRiskFailed {
            name: "Chelsea".to_string(),
            ticket,
            error: "request failed".to_string(),
        },
    );

    let record = state.selection.get("Chelsea").expect("placeholder kept");
    assert_eq!(record.category(), RiskCategory::Pending);
    assert_eq!(state.batch, BatchStatus::Idle);
    assert!(state.batch_error().is_none());
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN]")));
}

#[test]
fn out_of_order_single_results_patch_their_own_rows() {
    let mut state = state_with_directory();
    let t_a = ticket_of(state.select_club("Arsenal"));
    let t_c = ticket_of(state.select_club("Chelsea"));

    apply_delta(
        &mut state,
        Delta::ClubRiskLoaded {
            name: "Chelsea".to_string(),
            ticket: t_c,
            record: scored("Chelsea", 80.0),
        },
    );
    apply_delta(
        &mut state,
        Delta::ClubRiskLoaded {
            name: "Arsenal".to_string(),
            ticket: t_a,
            record: scored("Arsenal", 10.0),
        },
    );

    assert_eq!(state.selection.names(), vec!["Arsenal", "Chelsea"]);
    assert_eq!(
        state.selection.get("Arsenal").map(|r| r.category()),
        Some(RiskCategory::Low)
    );
    assert_eq!(
        state.selection.get("Chelsea").map(|r| r.category()),
        Some(RiskCategory::High)
    );
}

#[test]
fn batch_result_replaces_whole_selection() {
    let mut state = state_with_directory();
    state.select_club("Arsenal");
    state.select_club("Chelsea");
    state.select_club("Liverpool");
    assert!(state.max_reached());

    let cmd = state.request_batch_assessment();
    let ticket = match &cmd {
        Some(ProviderCommand::FetchBatchRisk { names, ticket }) => {
            assert_eq!(names, &vec!["Arsenal", "Chelsea", "Liverpool"]);
            *ticket
        }
        other => panic!("unexpected command {other:?}"),
    };
    assert!(state.is_batch_pending());

    apply_delta(
        &mut state,
        Delta::BatchLoaded {
            ticket,
            records: vec![scored("Liverpool", 20.0), scored("Arsenal", 50.0)],
        },
    );

    assert_eq!(state.selection.names(), vec!["Liverpool", "Arsenal"]);
    assert!(!state.selection.contains("Chelsea"));
    assert_eq!(state.batch, BatchStatus::Idle);
    assert!(!state.max_reached());
}

#[test]
fn batch_failure_keeps_selection_and_surfaces_error() {
    let mut state = state_with_directory();
    state.select_club("Arsenal");
    let ticket = ticket_of(state.request_batch_assessment());

    apply_delta(
        &mut state,
        Delta::BatchFailed {
            ticket,
            error: "http 500 Internal Server Error: boom".to_string(),
        },
    );

    assert_eq!(state.selection.names(), vec!["Arsenal"]);
    assert_eq!(
        state.batch_error(),
        Some("http 500 Internal Server Error: boom")
    );

    // Asking again clears the error while the new request is in flight.
    assert!(state.request_batch_assessment().is_some());
    assert!(state.batch_error().is_none());
    assert!(state.is_batch_pending());
}

#[test]
fn single_result_after_batch_replacement_is_dropped() {
    let mut state = state_with_directory();
    let single = ticket_of(state.select_club("Arsenal"));
    let batch = ticket_of(state.request_batch_assessment());

    apply_delta(
        &mut state,
        Delta::BatchLoaded {
            ticket: batch,
            records: vec![scored("Arsenal", 70.0)],
        },
    );
    apply_delta(
        &mut state,
        Delta::ClubRiskLoaded {
            name: "Arsenal".to_string(),
            ticket: single,
            record: scored("Arsenal", 5.0),
        },
    );

    assert_eq!(state.selection.get("Arsenal").and_then(|r| r.score), Some(70.0));
}

#[test]
fn single_result_for_removed_club_does_not_resurrect_it() {
    let mut state = state_with_directory();
    let first = ticket_of(state.select_club("Everton"));
    assert!(state.remove_club("Everton"));
    let second = ticket_of(state.select_club("Everton"));
    assert_ne!(first, second);

    apply_delta(
        &mut state,
        Delta::ClubRiskLoaded {
            name: "Everton".to_string(),
            ticket: first,
            record: scored("Everton", 33.0),
        },
    );
    assert_eq!(state.selection.get("Everton").and_then(|r| r.score), None);

    state.remove_club("Everton");
    apply_delta(
        &mut state,
        Delta::ClubRiskLoaded {
            name: "Everton".to_string(),
            ticket: second,
            record: scored("Everton", 33.0),
        },
    );
    assert!(state.selection.is_empty());
}

#[test]
fn stale_batch_result_is_ignored() {
    let mut state = state_with_directory();
    state.select_club("Arsenal");

    apply_delta(
        &mut state,
        Delta::BatchLoaded {
            ticket: 999,
            records: Vec::new(),
        },
    );
    assert_eq!(state.selection.names(), vec!["Arsenal"]);
}

#[test]
fn directory_deltas_drive_suggestions() {
    let mut state = AppState::new();
    state.set_search_term("man");
    assert!(state.suggestions().is_empty());

    apply_delta(
        &mut state,
        Delta::DirectoryLoaded(vec!["Manchester City".to_string(), "Liverpool".to_string()]),
    );
    assert_eq!(state.suggestions(), vec!["Manchester City"]);

    let mut failed = AppState::new();
    apply_delta(&mut failed, Delta::DirectoryFailed("request failed".to_string()));
    failed.set_search_term("man");
    assert!(failed.suggestions().is_empty());
    assert!(failed.batch_error().is_none());
}
