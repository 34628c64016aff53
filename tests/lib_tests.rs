use rand::SeedableRng;
use rand::rngs::StdRng;
use tunepipe::pipeline::wire::{self, FINAL_PREFIX, Inbound};
use tunepipe::pipeline::{CorrelationTable, PendingRequest, PipelineError, TrialBudget};
use tunepipe::search::SearchTechnique;
use tunepipe::space::{Candidate, Param, ParamKind, ParamSpace, ParamValue};
use tunepipe::{RequestHandle, ResultSink, TrialOutcome, TrialReport};

fn small_space() -> ParamSpace {
    ParamSpace {
        params: vec![
            Param {
                name: "threads".into(),
                kind: ParamKind::Int { min: 1, max: 16 },
            },
            Param {
                name: "ratio".into(),
                kind: ParamKind::Float { min: 0.0, max: 1.0 },
            },
        ],
    }
}

// --- wire codec ---

#[test]
fn test_parse_timing_line() {
    assert_eq!(
        wire::parse_report("7:42.5").unwrap(),
        Inbound::Timing {
            id: 7,
            millis: 42.5
        }
    );
}

#[test]
fn test_parse_negative_time_is_still_a_timing() {
    assert_eq!(
        wire::parse_report("3:-1.0").unwrap(),
        Inbound::Timing {
            id: 3,
            millis: -1.0
        }
    );
}

#[test]
fn test_parse_exit_sentinel() {
    assert_eq!(wire::parse_report("exit").unwrap(), Inbound::Exit);
}

#[test]
fn test_parse_rejects_wrong_field_count() {
    for line in ["1:2:3", "justwords", "", "42"] {
        assert!(
            matches!(
                wire::parse_report(line),
                Err(PipelineError::Protocol { .. })
            ),
            "line {:?} should be a protocol error",
            line
        );
    }
}

#[test]
fn test_parse_rejects_non_numeric_fields() {
    for line in ["seven:42.5", "7:fast", "-1:3.0"] {
        assert!(
            matches!(
                wire::parse_report(line),
                Err(PipelineError::Protocol { .. })
            ),
            "line {:?} should be a protocol error",
            line
        );
    }
}

#[test]
fn test_encode_embeds_prefix_and_params() {
    let mut candidate = Candidate::new();
    candidate.insert("threads".into(), ParamValue::Int(4));
    let line = wire::encode_candidate(&candidate, "12");
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["configPrefix"], "12");
    assert_eq!(parsed["params"]["threads"], 4);
    assert!(!line.contains('\n'));
}

#[test]
fn test_encode_final_prefix() {
    let candidate = Candidate::new();
    let line = wire::encode_candidate(&candidate, FINAL_PREFIX);
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["configPrefix"], "final");
}

// --- CorrelationTable ---

#[test]
fn test_table_insert_remove_contains() {
    let mut table = CorrelationTable::new(2);
    table
        .insert(
            1,
            PendingRequest {
                handle: RequestHandle(10),
            },
        )
        .unwrap();
    assert!(table.contains(1));
    assert_eq!(table.len(), 1);
    let removed = table.remove(1).unwrap();
    assert_eq!(removed.handle, RequestHandle(10));
    assert!(table.is_empty());
    assert!(table.remove(1).is_none());
}

#[test]
fn test_table_rejects_duplicate_id() {
    let mut table = CorrelationTable::new(2);
    let req = PendingRequest {
        handle: RequestHandle(1),
    };
    table.insert(5, req).unwrap();
    assert!(matches!(
        table.insert(5, req),
        Err(PipelineError::DuplicateDispatch { id: 5 })
    ));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_table_rejects_insert_over_capacity() {
    let mut table = CorrelationTable::new(2);
    let req = PendingRequest {
        handle: RequestHandle(1),
    };
    table.insert(1, req).unwrap();
    table.insert(2, req).unwrap();
    assert!(matches!(
        table.insert(3, req),
        Err(PipelineError::CapacityInvariant { depth: 2, .. })
    ));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_table_take_all_ordered_by_id() {
    let mut table = CorrelationTable::new(4);
    for id in [3, 1, 4, 2] {
        table
            .insert(
                id,
                PendingRequest {
                    handle: RequestHandle(id * 10),
                },
            )
            .unwrap();
    }
    let ids: Vec<_> = table.take_all().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert!(table.is_empty());
}

// --- TrialOutcome ---

#[test]
fn test_outcome_scores() {
    assert_eq!(TrialOutcome::Time(42.5).score(), 42.5);
    assert_eq!(TrialOutcome::Failed.score(), f64::INFINITY);
    assert_eq!(TrialOutcome::Aborted.score(), f64::INFINITY);
    assert!(TrialOutcome::Time(0.0).is_measured());
    assert!(!TrialOutcome::Failed.is_measured());
}

#[test]
fn test_vec_sink_collects_reports_in_order() {
    let mut sink: Vec<TrialReport> = Vec::new();
    sink.report(TrialReport {
        handle: RequestHandle(1),
        outcome: TrialOutcome::Time(1.0),
    });
    sink.report(TrialReport {
        handle: RequestHandle(2),
        outcome: TrialOutcome::Aborted,
    });
    assert_eq!(sink.len(), 2);
    assert_eq!(sink[0].handle, RequestHandle(1));
    assert_eq!(sink[1].outcome, TrialOutcome::Aborted);
}

// --- TrialBudget ---

#[test]
fn test_budget_exhausts_after_n_takes() {
    let budget = TrialBudget::new(3);
    assert!(budget.take());
    assert!(budget.take());
    assert!(budget.take());
    assert!(!budget.take());
    assert_eq!(budget.remaining(), 0);
    assert!(!budget.interrupted());
}

#[test]
fn test_budget_interrupt_zeroes_and_flags() {
    let budget = TrialBudget::new(100);
    assert!(budget.take());
    budget.interrupt();
    assert!(!budget.take());
    assert_eq!(budget.remaining(), 0);
    assert!(budget.interrupted());
}

#[test]
fn test_budget_shared_between_clones() {
    let budget = TrialBudget::new(2);
    let handler_side = budget.clone();
    handler_side.interrupt();
    assert!(!budget.take());
    assert!(budget.interrupted());
}

// --- ParamSpace ---

#[test]
fn test_space_validate_rejects_empty() {
    let space = ParamSpace { params: vec![] };
    assert!(space.validate().is_err());
}

#[test]
fn test_space_validate_rejects_duplicate_names() {
    let mut space = small_space();
    space.params.push(Param {
        name: "threads".into(),
        kind: ParamKind::Int { min: 0, max: 1 },
    });
    assert!(space.validate().is_err());
}

#[test]
fn test_space_validate_rejects_inverted_bounds() {
    let space = ParamSpace {
        params: vec![Param {
            name: "threads".into(),
            kind: ParamKind::Int { min: 10, max: 1 },
        }],
    };
    assert!(space.validate().is_err());
}

#[test]
fn test_random_candidate_within_bounds() {
    let space = small_space();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let candidate = space.random_candidate(&mut rng);
        assert!(space.contains(&candidate), "{:?}", candidate);
        assert_eq!(candidate.len(), space.params.len());
    }
}

#[test]
fn test_perturb_stays_within_bounds() {
    let space = small_space();
    let mut rng = StdRng::seed_from_u64(7);
    let base = space.random_candidate(&mut rng);
    for _ in 0..50 {
        let next = space.perturb(&base, &mut rng);
        assert!(space.contains(&next), "{:?}", next);
    }
}

#[test]
fn test_space_json_round_trip() {
    let space = small_space();
    let json = serde_json::to_string(&space).unwrap();
    let back: ParamSpace = serde_json::from_str(&json).unwrap();
    assert_eq!(back.params.len(), 2);
    assert_eq!(back.params[0].name, "threads");
    assert!(matches!(
        back.params[0].kind,
        ParamKind::Int { min: 1, max: 16 }
    ));
}

// --- SearchTechnique ---

#[test]
fn test_technique_deterministic_under_seed() {
    let space = small_space();
    let mut a = SearchTechnique::new(Some(99));
    let mut b = SearchTechnique::new(Some(99));
    let mut best = None;
    for _ in 0..10 {
        let ca = a.next_candidate(&space, best.as_ref());
        let cb = b.next_candidate(&space, best.as_ref());
        assert_eq!(ca, cb);
        best = Some(ca);
    }
}

#[test]
fn test_technique_candidates_in_bounds() {
    let space = small_space();
    let mut technique = SearchTechnique::new(Some(3));
    let mut best = None;
    for _ in 0..50 {
        let candidate = technique.next_candidate(&space, best.as_ref());
        assert!(space.contains(&candidate));
        best = Some(candidate);
    }
}
