use std::fmt;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use smugglers_game::{Decision, MissionKind, Player, RoundMissions, RuleSet};

/// What a policy sees when it is the active player.
#[derive(Debug, Clone, Copy)]
pub struct DecisionView<'a> {
    pub player: &'a Player,
    pub missions: &'a RoundMissions,
    pub rules: &'a RuleSet,
    pub round: u32,
}

impl DecisionView<'_> {
    fn solo_cost(&self) -> u32 {
        self.missions.mission_for(MissionKind::Solo).cost
    }

    fn convoy_cost(&self) -> u32 {
        self.missions.mission_for(MissionKind::Cooperative).cost
    }

    fn can_fly_solo(&self) -> bool {
        self.player.can_afford(self.solo_cost())
    }

    fn can_pay_convoy(&self) -> bool {
        self.player.can_afford(self.convoy_cost())
    }

    /// Skill plus the average face of the die.
    fn expected_solo_total(&self) -> u32 {
        self.player
            .skill_level()
            .saturating_add(self.rules.die_sides.div_ceil(2))
    }
}

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub decision: Decision,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(decision: Decision, rationale: Option<String>) -> Self {
        Self {
            decision,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick this round's decision for the active player.
    fn decide(&mut self, view: &DecisionView<'_>) -> PolicyDecision;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayStrategy {
    Cautious,
    BoldSolo,
    TeamPlayer,
    Freerider,
    Gambler,
}

impl PlayStrategy {
    pub const ALL: [Self; 5] = [
        Self::Cautious,
        Self::BoldSolo,
        Self::TeamPlayer,
        Self::Freerider,
        Self::Gambler,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::BoldSolo => "Bold Solo",
            Self::TeamPlayer => "Team Player",
            Self::Freerider => "Freerider",
            Self::Gambler => "Gambler",
        }
    }

    /// Token accepted on the command line.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::BoldSolo => "bold-solo",
            Self::TeamPlayer => "team-player",
            Self::Freerider => "freerider",
            Self::Gambler => "gambler",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Cautious => "Flies solo only when the average roll clears the risk",
            Self::BoldSolo => "Flies solo whenever it can pay",
            Self::TeamPlayer => "Joins every convoy and always pays its share",
            Self::Freerider => "Joins every convoy without paying",
            Self::Gambler => "Picks uniformly among the options it can afford",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(key.trim()))
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::BoldSolo => Box::new(BoldSoloPolicy),
            Self::TeamPlayer => Box::new(TeamPlayerPolicy),
            Self::Freerider => Box::new(FreeriderPolicy),
            Self::Gambler => Box::new(GamblerPolicy::new(seed)),
        }
    }
}

impl fmt::Display for PlayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct BoldSoloPolicy;
struct TeamPlayerPolicy;
struct FreeriderPolicy;

struct GamblerPolicy {
    rng: ChaCha20Rng,
}

impl GamblerPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn decide(&mut self, view: &DecisionView<'_>) -> PolicyDecision {
        let risk = view.missions.mission_for(MissionKind::Solo).risk_level;
        let expected = view.expected_solo_total();
        if view.can_fly_solo() && expected >= risk {
            PolicyDecision::new(
                Decision::SOLO,
                Some(format!("expected {expected} vs risk {risk}")),
            )
        } else {
            PolicyDecision::new(
                Decision::SKIP,
                Some(format!("expected {expected} short of risk {risk}")),
            )
        }
    }
}

impl PlayerPolicy for BoldSoloPolicy {
    fn name(&self) -> &'static str {
        "Bold Solo"
    }

    fn decide(&mut self, view: &DecisionView<'_>) -> PolicyDecision {
        if view.can_fly_solo() {
            PolicyDecision::new(Decision::SOLO, None)
        } else {
            PolicyDecision::new(Decision::SKIP, Some("cannot pay".to_string()))
        }
    }
}

impl PlayerPolicy for TeamPlayerPolicy {
    fn name(&self) -> &'static str {
        "Team Player"
    }

    fn decide(&mut self, view: &DecisionView<'_>) -> PolicyDecision {
        if view.can_pay_convoy() {
            PolicyDecision::new(Decision::CONVOY_PAID, None)
        } else {
            PolicyDecision::new(Decision::SKIP, Some("cannot pay".to_string()))
        }
    }
}

impl PlayerPolicy for FreeriderPolicy {
    fn name(&self) -> &'static str {
        "Freerider"
    }

    fn decide(&mut self, _view: &DecisionView<'_>) -> PolicyDecision {
        PolicyDecision::new(Decision::FREERIDE, None)
    }
}

impl PlayerPolicy for GamblerPolicy {
    fn name(&self) -> &'static str {
        "Gambler"
    }

    fn decide(&mut self, view: &DecisionView<'_>) -> PolicyDecision {
        let mut options = vec![Decision::SKIP, Decision::FREERIDE];
        if view.can_fly_solo() {
            options.push(Decision::SOLO);
        }
        if view.can_pay_convoy() {
            options.push(Decision::CONVOY_PAID);
        }
        let decision = options
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Decision::SKIP);
        PolicyDecision::new(decision, Some(format!("1 of {}", options.len())))
    }
}
