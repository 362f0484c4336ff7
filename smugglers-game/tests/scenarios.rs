use smugglers_game::{
    Decision, DecisionError, DecisionKind, MatchConfig, MatchError, MatchState, Mission,
    MissionKind, PlayerId, PlayerSetup, RoundMissions, RuleSet, ScriptedDice, VictoryCondition,
    VictoryKind, VictoryReason,
};

fn mission(kind: MissionKind, risk: u32, reward: u32, cost: u32) -> Mission {
    Mission {
        name: format!("{kind} job"),
        kind,
        risk_level: risk,
        reward,
        cost,
        repair_cost: None,
    }
}

fn match_with(
    roster: &[(&str, u32, u32)],
    kind: VictoryKind,
    target: u32,
    max_rounds: u32,
    rules: RuleSet,
) -> MatchState {
    let players = roster
        .iter()
        .map(|&(name, skill, credits)| PlayerSetup::new(name, skill, credits))
        .collect();
    let config = MatchConfig::new(
        players,
        VictoryCondition {
            kind,
            target,
            max_rounds,
        },
        rules,
    );
    MatchState::setup(config, 1).unwrap()
}

#[test]
fn scenario_a_forced_six_wins_a_solo_run() {
    for (rules, expected_skill) in [
        (RuleSet::single_best_effort(), 4),
        (RuleSet::fixed_dual_slot(), 3),
    ] {
        let mut state = match_with(&[("P", 3, 50)], VictoryKind::Credits, 1_000, 10, rules);
        state
            .open_round(RoundMissions::Single {
                mission: mission(MissionKind::Solo, 8, 20, 5),
            })
            .unwrap();
        state.choose(PlayerId(0), DecisionKind::Solo).unwrap();

        let result = state
            .resolve_round_with(&mut ScriptedDice::new([6]))
            .unwrap();

        let flown = &result.missions[0];
        assert!(flown.success);
        assert_eq!(flown.total_result, 9);
        let pilot = &state.players()[0];
        assert_eq!(pilot.credits(), 65);
        assert_eq!(pilot.missions_completed(), 1);
        assert_eq!(pilot.skill_level(), expected_skill);
        assert_eq!(pilot.credit_history(), &[50, 45, 65]);
    }
}

#[test]
fn scenario_b_freerider_sinks_the_convoy() {
    let mut state = match_with(
        &[("Payer", 3, 50), ("Rider", 2, 50)],
        VictoryKind::Credits,
        1_000,
        10,
        RuleSet::fixed_dual_slot(),
    );
    state
        .open_round(RoundMissions::Dual {
            solo: mission(MissionKind::Solo, 8, 20, 5),
            cooperative: mission(MissionKind::Cooperative, 10, 40, 10),
        })
        .unwrap();
    state
        .record_decision(PlayerId(0), Decision::CONVOY_PAID)
        .unwrap();
    state
        .record_decision(PlayerId(1), Decision::FREERIDE)
        .unwrap();

    let result = state
        .resolve_round_with(&mut ScriptedDice::new([4]))
        .unwrap();

    let convoy = &result.missions[0];
    assert!(!convoy.success);
    assert_eq!(convoy.risk_level, 13);
    assert_eq!(convoy.total_skill, 5);
    assert_eq!(convoy.total_result, 9);
    assert_eq!(convoy.reward_per_player, None);
    assert_eq!(result.credit_changes, vec![-10, 0]);
    for player in state.players() {
        assert_eq!(player.missions_failed(), 1);
    }
    assert_eq!(state.players()[1].freeride_count(), 1);
}

#[test]
fn scenario_c_exact_target_wins_and_one_short_does_not() {
    let mut state = match_with(
        &[("Eva", 3, 80), ("Kael", 5, 99)],
        VictoryKind::Credits,
        100,
        10,
        RuleSet::fixed_dual_slot(),
    );
    state
        .open_round(RoundMissions::Dual {
            solo: mission(MissionKind::Solo, 8, 25, 5),
            cooperative: mission(MissionKind::Cooperative, 10, 40, 10),
        })
        .unwrap();
    state.choose(PlayerId(0), DecisionKind::Solo).unwrap();
    state.choose(PlayerId(1), DecisionKind::Skip).unwrap();

    let result = state
        .resolve_round_with(&mut ScriptedDice::new([6]))
        .unwrap();

    assert_eq!(state.players()[0].credits(), 100);
    let outcome = result.outcome.expect("match ends this round");
    assert_eq!(outcome.winners, vec![PlayerId(0)]);
    assert_eq!(outcome.reason, VictoryReason::TargetReached);
    assert_eq!(state.check_victory(), Some(outcome.clone()));
    assert_eq!(state.check_victory(), Some(outcome));
}

#[test]
fn scenario_d_quota_waits_for_round_ten() {
    let mut state = match_with(
        &[("Rich", 3, 500), ("Poor", 3, 10)],
        VictoryKind::Quota,
        50,
        10,
        RuleSet::fixed_dual_slot(),
    );
    let mut dice = ScriptedDice::default();
    for round in 1..=10 {
        state
            .open_round(RoundMissions::Dual {
                solo: mission(MissionKind::Solo, 8, 20, 5),
                cooperative: mission(MissionKind::Cooperative, 10, 40, 10),
            })
            .unwrap();
        state.skip_remaining().unwrap();
        let result = state.resolve_round_with(&mut dice).unwrap();
        if round < 10 {
            assert!(result.outcome.is_none(), "round {round} must not end the match");
            assert!(state.check_victory().is_none());
        } else {
            let outcome = result.outcome.expect("quota evaluated after round 10");
            assert_eq!(outcome.winners, vec![PlayerId(0)]);
            assert_eq!(outcome.reason, VictoryReason::QuotaMet);
        }
    }
}

#[test]
fn scenario_e_nobody_can_afford_anything() {
    let mut state = match_with(
        &[("Broke", 3, 2), ("Broker", 4, 4)],
        VictoryKind::Credits,
        100,
        10,
        RuleSet::fixed_dual_slot(),
    );
    state
        .open_round(RoundMissions::Dual {
            solo: mission(MissionKind::Solo, 8, 20, 5),
            cooperative: mission(MissionKind::Cooperative, 10, 40, 10),
        })
        .unwrap();

    assert_eq!(
        state.choose(PlayerId(0), DecisionKind::Solo),
        Err(MatchError::InvalidDecision(DecisionError::CannotAfford {
            player: PlayerId(0),
            cost: 5,
            credits: 2
        }))
    );
    assert!(matches!(
        state.record_decision(PlayerId(0), Decision::CONVOY_PAID),
        Err(MatchError::InvalidDecision(
            DecisionError::CannotAfford { .. }
        ))
    ));
    state.skip_remaining().unwrap();

    let before: Vec<_> = state.players().to_vec();
    let result = state
        .resolve_round_with(&mut ScriptedDice::default())
        .unwrap();

    assert!(result.missions.is_empty());
    assert!(state.mission_results().is_empty());
    for (after, before) in state.players().iter().zip(&before) {
        assert_eq!(after.credits(), before.credits());
        assert_eq!(after.skill_level(), before.skill_level());
        assert_eq!(after.credit_history(), before.credit_history());
        assert_eq!(after.missions_completed(), 0);
        assert_eq!(after.missions_failed(), 0);
        let history = after.decision_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].decision, DecisionKind::Skip);
        assert_eq!(history[0].credit_change, 0);
    }
}

#[test]
fn freerider_penalty_applies_per_freerider() {
    for freeriders in 0..=3_usize {
        let roster: Vec<(String, u32, u32)> = (0..4)
            .map(|idx| (format!("P{idx}"), 1, 50))
            .collect();
        let roster_refs: Vec<(&str, u32, u32)> = roster
            .iter()
            .map(|(name, skill, credits)| (name.as_str(), *skill, *credits))
            .collect();
        let mut state = match_with(
            &roster_refs,
            VictoryKind::Credits,
            1_000,
            10,
            RuleSet::fixed_dual_slot(),
        );
        state
            .open_round(RoundMissions::Dual {
                solo: mission(MissionKind::Solo, 8, 20, 5),
                cooperative: mission(MissionKind::Cooperative, 10, 40, 10),
            })
            .unwrap();
        for idx in 0..4 {
            let decision = if idx < freeriders {
                Decision::FREERIDE
            } else {
                Decision::CONVOY_PAID
            };
            state.record_decision(PlayerId(idx), decision).unwrap();
        }
        let result = state
            .resolve_round_with(&mut ScriptedDice::new([1]))
            .unwrap();
        let convoy = &result.missions[0];
        let expected = 10 + 3 * u32::try_from(freeriders).unwrap();
        assert_eq!(convoy.risk_level, expected);
        assert_eq!(convoy.base_risk, 10);
    }
}

#[test]
fn convoy_reward_split_floors_and_loses_remainder() {
    let mut state = match_with(
        &[("A", 5, 50), ("B", 5, 50), ("C", 5, 50)],
        VictoryKind::Credits,
        1_000,
        10,
        RuleSet::fixed_dual_slot(),
    );
    state
        .open_round(RoundMissions::Dual {
            solo: mission(MissionKind::Solo, 8, 20, 5),
            cooperative: mission(MissionKind::Cooperative, 10, 50, 10),
        })
        .unwrap();
    for idx in 0..3 {
        state
            .record_decision(PlayerId(idx), Decision::CONVOY_PAID)
            .unwrap();
    }
    let result = state
        .resolve_round_with(&mut ScriptedDice::new([3]))
        .unwrap();
    let share = result.missions[0].reward_per_player.unwrap();
    assert_eq!(share, 16);
    let paid_out: u32 = state.players().iter().map(|p| p.credits() + 10 - 50).sum();
    assert_eq!(paid_out, 48);
    assert!(paid_out <= 50);
}
