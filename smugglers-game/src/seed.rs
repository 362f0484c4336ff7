//! Reversible share-code scheme for match seeds.
//! Code format: <POLICY>-<WORD><NN>, e.g., SB-NEBULA42, DS-FREIGHT07

use crate::config::GenerationMode;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "NEBULA", "COMET", "QUASAR", "PULSAR", "ORBIT", "ROCKET", "CARGO", "FREIGHT", "SPICE",
    "BLASTER", "HANGAR", "CONVOY", "PILOT", "CAPTAIN", "MERCHANT", "SMUGGLE", "BOUNTY", "CREDIT",
    "FUEL", "THRUST", "WARP", "HYPER", "VOID", "ASTEROID", "METEOR", "STATION", "OUTPOST",
    "DOCKING", "RADAR", "CLOAK", "SHIELD", "PHASER", "PLASMA", "REACTOR", "BEACON", "SIGNAL",
    "COURIER", "RUNNER", "RAIDER", "PIRATE", "EMPIRE", "REBEL", "BLOCKADE", "CUSTOMS", "TARIFF",
    "LEDGER", "VAULT", "RELIC", "CRYSTAL", "ZENITH", "ECLIPSE", "AURORA", "GALAXY", "STARDUST",
    "ION", "PHOTON", "GRAVITY", "VECTOR", "SECTOR", "NOMAD", "DRIFTER", "JUNKER", "SALVAGE",
    "FRONTIER",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

fn compose_seed(mode: GenerationMode, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    // Domain-separated FNV input
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"SMUGL-");
    buf[6] = match mode {
        GenerationMode::SingleBestEffort => b'S',
        GenerationMode::FixedDualSlot => b'D',
    };
    buf[7] = (packed & 0xFF) as u8;
    buf[8] = (packed >> 8) as u8;
    buf[9] = 0x5A;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

fn mode_from_prefix(prefix: &str) -> Option<GenerationMode> {
    match prefix.to_ascii_uppercase().as_str() {
        "SB" => Some(GenerationMode::SingleBestEffort),
        "DS" => Some(GenerationMode::FixedDualSlot),
        _ => None,
    }
}

/// Render a seed as a share code. Only the low 16 bits select the word and number.
#[must_use]
pub fn encode_friendly(mode: GenerationMode, seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, mut nn) = unpack(packed);
    let word = WORD_LIST
        .get(usize::from(wi) % WORD_LIST.len())
        .copied()
        .unwrap_or("NEBULA");
    if nn > 99 {
        nn %= 100;
    }
    format!("{}-{word}{nn:02}", mode.code_prefix())
}

/// Decode a share code into its generation mode and canonical seed.
#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(GenerationMode, u64)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let mode = mode_from_prefix(prefix)?;
    if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 2) {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some((mode, compose_seed(mode, wi, nn)))
}

/// Parse a share code into the generation mode and seed it names.
#[must_use]
pub fn parse_share_code(code: &str) -> Option<(GenerationMode, u64)> {
    decode_to_seed(code)
}
