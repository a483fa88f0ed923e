//! Jitter for retry backoff

use rand::Rng;

/// Random jitter between 0 and `max_jitter_ms` (inclusive)
pub fn generate_jitter_ms(max_jitter_ms: u64) -> u64 {
    if max_jitter_ms == 0 {
        return 0;
    }
    rand::rng().random_range(0..=max_jitter_ms)
}

/// Random jitter up to `jitter_percent` percent of `base_value`
pub fn generate_jitter_percent(base_value: u64, jitter_percent: u8) -> u64 {
    if jitter_percent == 0 || base_value == 0 {
        return 0;
    }
    let max_jitter = (base_value * jitter_percent as u64) / 100;
    generate_jitter_ms(max_jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_bounds() {
        for _ in 0..100 {
            assert!(generate_jitter_ms(50) <= 50);
            assert!(generate_jitter_percent(1000, 25) <= 250);
        }
        assert_eq!(generate_jitter_ms(0), 0);
        assert_eq!(generate_jitter_percent(0, 25), 0);
        assert_eq!(generate_jitter_percent(1000, 0), 0);
    }
}
