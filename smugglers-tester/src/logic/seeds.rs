use anyhow::{Result, bail};
use smugglers_game::{GenerationMode, encode_friendly, parse_share_code};
use std::collections::HashSet;

/// Seed metadata resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_mode: Option<GenerationMode>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_mode: None,
        }
    }

    #[must_use]
    pub fn from_share_code(seed: u64, mode: GenerationMode, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_mode: Some(mode),
        }
    }

    /// The generation mode a run should use: the share code's own, else `fallback`.
    #[must_use]
    pub fn mode_or(&self, fallback: GenerationMode) -> GenerationMode {
        self.source_mode.unwrap_or(fallback)
    }
}

/// Resolve CLI seed tokens: literal integers or `SB-`/`DS-` share codes.
///
/// Repeated tokens naming the same seed and mode collapse to the first.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut seen: HashSet<(u64, Option<GenerationMode>)> = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let info = if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Some((mode, seed)) = parse_share_code(token) {
            SeedInfo::from_share_code(seed, mode, encode_friendly(mode, seed))
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if seen.insert((info.seed, info.source_mode)) {
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}
