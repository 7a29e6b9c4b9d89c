use crate::rng::ChainRng;

pub const HAVOC_BLK_SMALL: u32 = 32;
pub const HAVOC_BLK_MEDIUM: u32 = 128;
pub const HAVOC_BLK_LARGE: u32 = 1500;
pub const HAVOC_BLK_XL: u32 = 32768;

/// Picks a block length for the region operators.
///
/// One of three tiers is drawn uniformly: small `[1, 32]`, medium `[32, 128]`
/// or large, where large is `[128, 1500]` nine times out of ten and
/// `[1500, 32768]` otherwise. The tier is clipped to `limit`, falling back to
/// a minimum of 1 when the tier starts at or above it.
///
/// The result is always in `[1, limit]`. A `limit` of zero has no valid block
/// and returns 0 without consuming the stream.
pub fn choose_block_len(rng: &mut ChainRng, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    let limit = u32::try_from(limit).unwrap_or(u32::MAX);

    let (mut min_value, max_value) = match rng.rand_range(3) {
        0 => (1, HAVOC_BLK_SMALL),
        1 => (HAVOC_BLK_SMALL, HAVOC_BLK_MEDIUM),
        _ => {
            if rng.rand_range(10) != 0 {
                (HAVOC_BLK_MEDIUM, HAVOC_BLK_LARGE)
            } else {
                (HAVOC_BLK_LARGE, HAVOC_BLK_XL)
            }
        }
    };

    if min_value >= limit {
        min_value = 1;
    }

    (min_value + rng.rand_range(max_value.min(limit) - min_value + 1)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_len_is_within_one_and_limit() {
        let mut rng = ChainRng::new(99);
        for limit in 1..3000usize {
            for _ in 0..8 {
                let len = choose_block_len(&mut rng, limit);
                assert!(
                    (1..=limit).contains(&len),
                    "block len {} out of [1, {}]",
                    len,
                    limit
                );
            }
        }
    }

    #[test]
    fn limit_of_one_always_yields_one() {
        let mut rng = ChainRng::new(3);
        for _ in 0..100 {
            assert_eq!(choose_block_len(&mut rng, 1), 1);
        }
    }

    #[test]
    fn zero_limit_consumes_nothing() {
        let mut rng = ChainRng::new(3);
        assert_eq!(choose_block_len(&mut rng, 0), 0);
        assert_eq!(rng.state(), 3);
    }

    #[test]
    fn extra_large_tier_is_reachable_with_a_large_limit() {
        let mut rng = ChainRng::new(2024);
        let lens: Vec<usize> = (0..2000)
            .map(|_| choose_block_len(&mut rng, HAVOC_BLK_XL as usize))
            .collect();
        assert!(lens.iter().any(|&l| l > HAVOC_BLK_LARGE as usize));
        assert!(lens.iter().any(|&l| l < HAVOC_BLK_SMALL as usize));
        assert!(lens.iter().all(|&l| l <= HAVOC_BLK_XL as usize));
    }
}
