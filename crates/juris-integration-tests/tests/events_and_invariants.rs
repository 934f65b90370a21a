//! # Events and Invariants
//!
//! Notification payloads as watchers see them, and token conservation
//! across arbitrary vote distributions.

mod common;

use common::*;
use juris_core::{Amount, RoundId};
use juris_court::{CourtEvent, Outcome};
use proptest::prelude::*;

#[test]
fn events_serialize_with_their_name_as_tag() {
    let mut h = Harness::with_jurors();
    let dispute_id = h.raise_and_draft(3);
    let events = h.court.drain_events();
    assert!(h.court.events().is_empty());

    let names: Vec<&str> = events.iter().map(CourtEvent::name).collect();
    assert_eq!(names[0], "new_dispute");
    assert_eq!(names[1], "heartbeat");
    assert_eq!(names.iter().filter(|n| **n == "juror_drafted").count(), 3);

    let json = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(json["event"], "new_dispute");
    assert_eq!(json["dispute_id"], serde_json::json!(dispute_id.0));
    assert_eq!(json["subject"], "subject");
    assert_eq!(json["juror_count"], 3);

    for event in &events {
        let json = serde_json::to_string(event).unwrap();
        let back: CourtEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, event);
    }
}

#[test]
fn executed_ruling_is_announced_once() {
    let mut h = Harness::with_jurors();
    let dispute_id = h.raise_and_draft(3);
    h.pass_terms(3);
    h.court.execute_ruling(&id("keeper"), dispute_id).unwrap();
    let _ = h.court.execute_ruling(&id("keeper"), dispute_id);
    let executed = h
        .court
        .events()
        .iter()
        .filter(|e| matches!(e, CourtEvent::RulingExecuted { ruling, .. } if *ruling == Outcome::REFUSED))
        .count();
    assert_eq!(executed, 1);
}

fn outcome_for(choice: u8) -> Option<Outcome> {
    match choice {
        0 => None,
        1 => Some(ruling_a()),
        2 => Some(ruling_b()),
        _ => Some(Outcome::REFUSED),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Whatever the jurors do, penalties and juror fees are paid out without
    /// exceeding what was collected, and only rounding dust stays behind.
    #[test]
    fn settlement_conserves_tokens(choices in proptest::collection::vec(0u8..4, 3)) {
        let mut h = Harness::with_jurors();
        let dispute_id = h.raise_and_draft(5);
        let votes: Vec<_> = h
            .drafted(dispute_id, RoundId(0))
            .into_iter()
            .zip(choices.iter().cycle())
            .map(|((juror, _), choice)| (juror, outcome_for(*choice)))
            .collect();
        h.vote(dispute_id, RoundId(0), &votes);
        h.pass_terms(1);
        let ruling = h.court.execute_ruling(&id("keeper"), dispute_id).unwrap();
        h.settle_all_penalties(dispute_id);

        let round = h.court.round(dispute_id, RoundId(0)).unwrap().clone();
        let mut tokens = 0u128;
        let mut coherent = 0usize;
        for (juror, outcome) in &votes {
            if *outcome == Some(ruling) {
                let reward = h
                    .court
                    .settle_reward(&id("keeper"), dispute_id, RoundId(0), juror)
                    .unwrap();
                tokens += reward.tokens.units();
                coherent += 1;
            }
        }
        prop_assert!(tokens <= round.collected_tokens.units());
        let custody = h.court.env().accounting.custody().units();
        if coherent == 0 {
            prop_assert_eq!(custody, 0);
            prop_assert_eq!(h.court.env().registry.burned(), round.collected_tokens);
        } else {
            prop_assert!(round.collected_tokens.units() - tokens < coherent as u128);
            prop_assert!(custody < coherent as u128);
            prop_assert_eq!(h.court.env().registry.burned(), Amount::ZERO);
        }
    }
}
