use anyhow::{anyhow, Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Accepts decimal or `0x`-prefixed hex.
pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16)
            .with_context(|| format!("invalid hex seed: {s}")),
        None => s
            .replace('_', "")
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}")),
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds parsed from --seeds"));
    }
    Ok(seeds)
}

/// `count` seeds starting at `start`, each the LCG successor of the last.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(count as usize);
    let mut cur = start;
    for _ in 0..count {
        out.push(cur);
        cur = lcg_next(cur);
    }
    out
}

/// Per-player seed so both agents in one run make independent draws.
///
/// Mixed with a hash finalizer rather than stepped with the LCG, so seats of
/// neighbouring runs in a [`seed_sequence`] never share a stream.
pub fn player_seed(session_seed: u32, player: usize) -> u32 {
    let salt = (player as u32).wrapping_add(1).wrapping_mul(0x9E37_79B9);
    mix32(session_seed ^ salt)
}

fn mix32(mut value: u32) -> u32 {
    value ^= value >> 16;
    value = value.wrapping_mul(0x85EB_CA6B);
    value ^= value >> 13;
    value = value.wrapping_mul(0xC2B2_AE35);
    value ^ (value >> 16)
}

fn lcg_next(value: u32) -> u32 {
    value.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_seed("0xA8C0_0001").ok(), Some(0xA8C0_0001));
        assert_eq!(parse_seed(" 42 ").ok(), Some(42));
        assert_eq!(parse_seed("0XFF").ok(), Some(255));
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
        assert!(parse_seed("-1").is_err());
    }

    #[test]
    fn csv_skips_blanks_and_rejects_empty() {
        assert_eq!(parse_seed_csv("1, 0x2,,3").ok(), Some(vec![1, 2, 3]));
        assert!(parse_seed_csv(" , ").is_err());
        assert!(parse_seed_csv("1,nope").is_err());
    }

    #[test]
    fn sequences_are_distinct_and_reproducible() {
        let a = seed_sequence(7, 5);
        assert_eq!(a, seed_sequence(7, 5));
        assert_eq!(a[0], 7);
        assert_eq!(a.len(), 5);
        assert_ne!(player_seed(7, 0), player_seed(7, 1));
        assert_eq!(seed_to_hex(0xA8C0_0001), "0xa8c00001");
    }

    #[test]
    fn player_seeds_do_not_overlap_across_sequence_neighbours() {
        let seeds = seed_sequence(0xC0FF_EE11, 64);
        let mut all: Vec<u32> = seeds
            .iter()
            .flat_map(|seed| [player_seed(*seed, 0), player_seed(*seed, 1)])
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 128);
    }
}
