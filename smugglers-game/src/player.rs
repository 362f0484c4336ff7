//! Player records and their economic history.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decisions::DecisionKind;

/// Stable roster index of a player within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl PlayerId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One round's entry in a player's decision history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub round: u32,
    pub decision: DecisionKind,
    pub paid_cost: bool,
    /// Net credit movement over the whole round, after clamping.
    pub credit_change: i64,
}

impl DecisionRecord {
    /// A cooperative participant who joined without paying.
    #[must_use]
    pub const fn is_freeride(&self) -> bool {
        matches!(self.decision, DecisionKind::Cooperative) && !self.paid_cost
    }
}

/// A smuggler taking part in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    skill_level: u32,
    initial_skill: u32,
    credits: u32,
    initial_credits: u32,
    credit_history: Vec<u32>,
    decision_history: Vec<DecisionRecord>,
    missions_completed: u32,
    missions_failed: u32,
}

impl Player {
    /// Create a player with starting skill and credits. Skill is floored at 1.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, skill_level: u32, credits: u32) -> Self {
        let skill_level = skill_level.max(1);
        Self {
            id,
            name: name.into(),
            skill_level,
            initial_skill: skill_level,
            credits,
            initial_credits: credits,
            credit_history: vec![credits],
            decision_history: Vec::new(),
            missions_completed: 0,
            missions_failed: 0,
        }
    }

    #[must_use]
    pub const fn skill_level(&self) -> u32 {
        self.skill_level
    }

    #[must_use]
    pub const fn initial_skill(&self) -> u32 {
        self.initial_skill
    }

    #[must_use]
    pub const fn credits(&self) -> u32 {
        self.credits
    }

    #[must_use]
    pub const fn initial_credits(&self) -> u32 {
        self.initial_credits
    }

    #[must_use]
    pub fn credit_history(&self) -> &[u32] {
        &self.credit_history
    }

    #[must_use]
    pub fn decision_history(&self) -> &[DecisionRecord] {
        &self.decision_history
    }

    #[must_use]
    pub const fn missions_completed(&self) -> u32 {
        self.missions_completed
    }

    #[must_use]
    pub const fn missions_failed(&self) -> u32 {
        self.missions_failed
    }

    /// Net credits gained or lost since setup.
    #[must_use]
    pub fn net_change(&self) -> i64 {
        i64::from(self.credits) - i64::from(self.initial_credits)
    }

    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.credits >= cost
    }

    pub fn add_credits(&mut self, amount: u32) {
        self.credits = self.credits.saturating_add(amount);
        self.credit_history.push(self.credits);
    }

    /// Subtract credits, clamping at zero.
    pub fn subtract_credits(&mut self, amount: u32) {
        self.credits = self.credits.saturating_sub(amount);
        self.credit_history.push(self.credits);
    }

    /// Shift skill by `delta`, never dropping below 1.
    pub fn adjust_skill(&mut self, delta: i32) {
        let next = i64::from(self.skill_level) + i64::from(delta);
        self.skill_level = u32::try_from(next.max(1)).unwrap_or(u32::MAX);
    }

    pub fn record_decision(&mut self, record: DecisionRecord) {
        self.decision_history.push(record);
    }

    pub(crate) fn mark_completed(&mut self) {
        self.missions_completed = self.missions_completed.saturating_add(1);
    }

    pub(crate) fn mark_failed(&mut self) {
        self.missions_failed = self.missions_failed.saturating_add(1);
    }

    /// Count history entries of a given decision kind.
    #[must_use]
    pub fn count_decisions(&self, kind: DecisionKind) -> usize {
        self.decision_history
            .iter()
            .filter(|record| record.decision == kind)
            .count()
    }

    #[must_use]
    pub fn freeride_count(&self) -> usize {
        self.decision_history
            .iter()
            .filter(|record| record.is_freeride())
            .count()
    }
}
