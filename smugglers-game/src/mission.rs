//! Mission records and the archetypes they are rolled from.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive integer range used for every randomized mission parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn fixed(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.min <= self.max
    }

    #[must_use]
    pub const fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Draw a uniform value from the range. An inverted range yields `min`.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl From<(u32, u32)> for ValueRange {
    fn from((min, max): (u32, u32)) -> Self {
        Self::new(min, max)
    }
}

/// Whether a mission is flown alone or by a convoy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Solo,
    Cooperative,
}

impl MissionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Cooperative => "cooperative",
        }
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-round opportunity. Immutable once rolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub name: String,
    pub kind: MissionKind,
    pub risk_level: u32,
    pub reward: u32,
    pub cost: u32,
    /// Penalty range charged to each participant when the run fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_cost: Option<ValueRange>,
}

impl Mission {
    /// Risk faced when flown as `flown_as`; convoys add the penalty for each freerider.
    #[must_use]
    pub const fn effective_risk(
        &self,
        flown_as: MissionKind,
        freeriders: u32,
        penalty: u32,
    ) -> u32 {
        match flown_as {
            MissionKind::Solo => self.risk_level,
            MissionKind::Cooperative => self
                .risk_level
                .saturating_add(freeriders.saturating_mul(penalty)),
        }
    }

    /// Even reward share for `participants`; the remainder is forfeited.
    #[must_use]
    pub const fn reward_share(&self, participants: u32) -> u32 {
        if participants == 0 {
            return 0;
        }
        self.reward / participants
    }
}

/// Template a mission is rolled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionArchetype {
    pub name: String,
    pub kind: MissionKind,
    pub risk: ValueRange,
    pub reward: ValueRange,
    pub cost: ValueRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_cost: Option<ValueRange>,
}

impl MissionArchetype {
    #[must_use]
    pub fn new(
        name: &str,
        kind: MissionKind,
        risk: impl Into<ValueRange>,
        reward: impl Into<ValueRange>,
        cost: impl Into<ValueRange>,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            risk: risk.into(),
            reward: reward.into(),
            cost: cost.into(),
            repair_cost: None,
        }
    }

    #[must_use]
    pub fn with_repair_cost(mut self, repair: impl Into<ValueRange>) -> Self {
        self.repair_cost = Some(repair.into());
        self
    }

    #[must_use]
    pub fn ranges_valid(&self) -> bool {
        self.risk.is_valid()
            && self.reward.is_valid()
            && self.cost.is_valid()
            && self.repair_cost.is_none_or(ValueRange::is_valid)
    }

    /// Roll risk, reward, and cost independently.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Mission {
        let risk_level = self.risk.sample(rng);
        let reward = self.reward.sample(rng);
        let cost = self.cost.sample(rng);
        Mission {
            name: self.name.clone(),
            kind: self.kind,
            risk_level,
            reward,
            cost,
            repair_cost: self.repair_cost,
        }
    }
}
