//! Block operators: overwrite a region in place, delete one, or grow the
//! buffer by splicing a block in.

use crate::block::{HAVOC_BLK_XL, choose_block_len};
use crate::buffer::{MAX_LEN, MutationBuffer, MutationError, try_alloc_store};
use crate::rng::ChainRng;

/// Constant fill byte: fully random or sampled from `buf`, 50/50.
fn fill_byte(buf: &[u8], rng: &mut ChainRng) -> u8 {
    if rng.coin() {
        rng.rand_range(256) as u8
    } else {
        buf[rng.below(buf.len())]
    }
}

/// Overwrites a block: three times out of four with another block of the same
/// buffer (overlap allowed), otherwise with a constant byte.
pub fn bytes_random(buf: &mut [u8], rng: &mut ChainRng) {
    let len = buf.len();
    if len < 2 {
        return;
    }
    let copy_len = choose_block_len(rng, len - 1);
    let copy_from = rng.below(len - copy_len + 1);
    let copy_to = rng.below(len - copy_len + 1);

    if rng.rand_range(4) != 0 {
        if copy_from != copy_to {
            buf.copy_within(copy_from..copy_from + copy_len, copy_to);
        }
    } else {
        let fill = fill_byte(buf, rng);
        buf[copy_to..copy_to + copy_len].fill(fill);
    }
}

/// Removes a block of `[0, len - 1)` bytes, shifting the tail left.
///
/// A zero-length deletion is a valid draw and leaves the buffer unchanged. The
/// buffer never becomes empty.
pub fn random_delete_bytes(buf: &mut MutationBuffer, rng: &mut ChainRng) {
    let len = buf.len();
    if len < 2 {
        return;
    }
    let del_len = rng.below(len - 1);
    let del_from = rng.below(len - del_len + 1);

    buf.as_mut_slice()
        .copy_within(del_from + del_len..len, del_from);
    buf.truncate(len - del_len);
}

/// Grows the buffer by splicing a block in at a random point.
///
/// Three times out of four the block is cloned from the buffer itself; otherwise
/// it is a run of a constant byte whose length ignores the buffer size. The new
/// store holds the prefix up to the insertion point followed by the block; the
/// old content after the insertion point is not carried over and reads as zero.
/// The length still grows by exactly the block length, and a zero sentinel
/// follows the last byte.
///
/// Buffers longer than [`MAX_LEN`] are left alone. The check happens before
/// growing, so one step may overshoot the cap by up to one block.
pub fn random_grow_bytes(
    buf: &mut MutationBuffer,
    rng: &mut ChainRng,
) -> Result<(), MutationError> {
    let len = buf.len();
    if len == 0 || len > MAX_LEN {
        return Ok(());
    }

    let clone = rng.rand_range(4) != 0;
    let (growth_len, growth_from) = if clone {
        let growth_len = choose_block_len(rng, len);
        (growth_len, rng.below(len - growth_len + 1))
    } else {
        (choose_block_len(rng, HAVOC_BLK_XL as usize), 0)
    };
    let growth_to = rng.below(len);
    let new_len = len + growth_len;

    let mut store = match try_alloc_store(new_len + 1) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("Growth of a {}-byte buffer aborted: {}", len, e);
            return Err(e);
        }
    };

    let old = buf.as_slice();
    store.extend_from_slice(&old[..growth_to]);
    if clone {
        store.extend_from_slice(&old[growth_from..growth_from + growth_len]);
    } else {
        let fill = fill_byte(old, rng);
        store.resize(growth_to + growth_len, fill);
    }
    store.resize(new_len, 0);
    store.push(0);

    buf.replace_store(store, new_len);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore as _;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    fn noise(len: usize, seed: u8) -> Vec<u8> {
        let mut data = vec![0u8; len];
        ChaCha8Rng::from_seed([seed; 32]).fill_bytes(&mut data);
        data
    }

    #[test]
    fn region_operators_ignore_too_short_buffers() {
        let mut rng = ChainRng::new(1);

        let mut one = [9u8];
        bytes_random(&mut one, &mut rng);
        assert_eq!(one, [9]);

        let mut buf = MutationBuffer::new(vec![9]);
        random_delete_bytes(&mut buf, &mut rng);
        assert_eq!(buf.as_slice(), &[9]);

        let mut empty = MutationBuffer::default();
        random_grow_bytes(&mut empty, &mut rng).unwrap();
        assert!(empty.is_empty());

        assert_eq!(rng.state(), 1);
    }

    #[test]
    fn bytes_random_keeps_length() {
        let mut rng = ChainRng::new(2);
        for len in 2..200 {
            let mut buf = noise(len, len as u8);
            bytes_random(&mut buf, &mut rng);
            assert_eq!(buf.len(), len);
        }
    }

    #[test]
    fn bytes_random_copy_handles_overlap_like_memmove() {
        // Find a draw that copies between overlapping regions and compare against
        // a copy made through a temporary.
        let original = noise(64, 3);
        let mut hit_overlap = false;
        for seed in 0..500u64 {
            let mut probe = ChainRng::new(seed);
            let copy_len = choose_block_len(&mut probe, original.len() - 1);
            let from = probe.below(original.len() - copy_len + 1);
            let to = probe.below(original.len() - copy_len + 1);
            let is_copy = probe.rand_range(4) != 0;
            if !is_copy || from == to || from.abs_diff(to) >= copy_len {
                continue;
            }
            hit_overlap = true;

            let mut expected = original.clone();
            let block = original[from..from + copy_len].to_vec();
            expected[to..to + copy_len].copy_from_slice(&block);

            let mut actual = original.clone();
            bytes_random(&mut actual, &mut ChainRng::new(seed));
            assert_eq!(actual, expected, "seed {}", seed);
        }
        assert!(hit_overlap);
    }

    #[test]
    fn random_delete_bytes_preserves_prefix_and_suffix() {
        for seed in 0..300u64 {
            let original = noise(2 + (seed as usize % 90), seed as u8);
            let len = original.len();

            let mut probe = ChainRng::new(seed);
            let del_len = probe.below(len - 1);
            let del_from = probe.below(len - del_len + 1);

            let mut buf = MutationBuffer::new(original.clone());
            let mut rng = ChainRng::new(seed);
            random_delete_bytes(&mut buf, &mut rng);

            assert_eq!(rng, probe);
            assert!(buf.len() <= len);
            assert!(buf.len() >= 1);
            assert_eq!(buf.len(), len - del_len);

            let mut expected = original[..del_from].to_vec();
            expected.extend_from_slice(&original[del_from + del_len..]);
            assert_eq!(buf.as_slice(), expected.as_slice(), "seed {}", seed);
        }
    }

    #[test]
    fn random_delete_bytes_shrinks_when_it_draws_a_length() {
        let mut rng = ChainRng::new(11);
        let mut shrunk = 0;
        for _ in 0..100 {
            let mut buf = MutationBuffer::new(noise(32, 4));
            random_delete_bytes(&mut buf, &mut rng);
            assert!(buf.len() <= 32);
            if buf.len() < 32 {
                shrunk += 1;
            }
        }
        assert!(shrunk > 90);
    }

    #[test]
    fn growth_is_a_noop_above_the_cap() {
        let mut buf = MutationBuffer::new(vec![7u8; MAX_LEN + 1]);
        let mut rng = ChainRng::new(5);
        random_grow_bytes(&mut buf, &mut rng).unwrap();
        assert_eq!(buf.len(), MAX_LEN + 1);
        assert!(buf.as_slice().iter().all(|&b| b == 7));
        assert_eq!(rng.state(), 5);
    }

    #[test]
    fn growth_at_the_cap_still_grows() {
        let mut buf = MutationBuffer::new(vec![7u8; MAX_LEN]);
        let mut rng = ChainRng::new(6);
        random_grow_bytes(&mut buf, &mut rng).unwrap();
        assert!(buf.len() > MAX_LEN);
        assert!(buf.len() <= MAX_LEN + HAVOC_BLK_XL as usize);
    }

    #[test]
    fn growth_splices_block_and_zeroes_the_old_tail() {
        for seed in 0..300u64 {
            let original = noise(1 + (seed as usize % 120), seed as u8 ^ 0x5A);
            let len = original.len();

            // Re-derive every draw the operator makes.
            let mut probe = ChainRng::new(seed);
            let clone = probe.rand_range(4) != 0;
            let (growth_len, growth_from) = if clone {
                let l = choose_block_len(&mut probe, len);
                (l, probe.below(len - l + 1))
            } else {
                (choose_block_len(&mut probe, HAVOC_BLK_XL as usize), 0)
            };
            let growth_to = probe.below(len);
            let inserted: Vec<u8> = if clone {
                original[growth_from..growth_from + growth_len].to_vec()
            } else {
                let fill = if probe.coin() {
                    probe.rand_range(256) as u8
                } else {
                    original[probe.below(len)]
                };
                vec![fill; growth_len]
            };
            let mut expected = original[..growth_to].to_vec();
            expected.extend_from_slice(&inserted);
            expected.resize(len + growth_len, 0);

            let mut buf = MutationBuffer::new(original.clone());
            let mut rng = ChainRng::new(seed);
            random_grow_bytes(&mut buf, &mut rng).unwrap();

            assert_eq!(rng, probe, "seed {}", seed);
            assert_eq!(buf.len(), len + growth_len);
            assert_eq!(buf.store_len(), buf.len() + 1);
            assert_eq!(buf.as_slice(), expected.as_slice(), "seed {}", seed);
        }
    }
}
