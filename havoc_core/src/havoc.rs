use crate::buffer::{MutationBuffer, MutationError};
use crate::ops;
use crate::region;
use crate::rng::ChainRng;
use serde::{Deserialize, Serialize};

/// Whether a buffer may change length while being mutated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MutationMode {
    /// Raw bytes of a scalar; the length never changes.
    FixedSize,
    /// Strings and byte sequences; blocks may be deleted or grown.
    #[default]
    VariableLength,
}

impl MutationMode {
    /// Number of operators the driver draws from in this mode.
    pub fn operator_count(self) -> u32 {
        match self {
            MutationMode::FixedSize => Operator::LENGTH_PRESERVING,
            MutationMode::VariableLength => Operator::ALL.len() as u32,
        }
    }
}

/// Every operator the havoc driver can apply, in draw-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    BitFlip,
    ByteInteresting,
    WordInteresting,
    DwordInteresting,
    ByteArith,
    WordArith,
    DwordArith,
    ByteRandom,
    BytesRandom,
    DeleteBytes,
    GrowBytes,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::BitFlip,
        Operator::ByteInteresting,
        Operator::WordInteresting,
        Operator::DwordInteresting,
        Operator::ByteArith,
        Operator::WordArith,
        Operator::DwordArith,
        Operator::ByteRandom,
        Operator::BytesRandom,
        Operator::DeleteBytes,
        Operator::GrowBytes,
    ];

    /// Leading entries of [`Operator::ALL`] that never change the length.
    pub const LENGTH_PRESERVING: u32 = 9;

    pub fn from_index(index: u32) -> Option<Operator> {
        Self::ALL.get(index as usize).copied()
    }

    /// Applies this operator once. Inapplicable operators leave the buffer alone.
    pub fn apply(self, buf: &mut MutationBuffer, rng: &mut ChainRng) -> Result<(), MutationError> {
        match self {
            Operator::BitFlip => ops::bit_flip(buf.as_mut_slice(), rng),
            Operator::ByteInteresting => ops::byte_interesting(buf.as_mut_slice(), rng),
            Operator::WordInteresting => ops::word_interesting(buf.as_mut_slice(), rng),
            Operator::DwordInteresting => ops::dword_interesting(buf.as_mut_slice(), rng),
            Operator::ByteArith => ops::byte_arith(buf.as_mut_slice(), rng),
            Operator::WordArith => ops::word_arith(buf.as_mut_slice(), rng),
            Operator::DwordArith => ops::dword_arith(buf.as_mut_slice(), rng),
            Operator::ByteRandom => ops::byte_random(buf.as_mut_slice(), rng),
            Operator::BytesRandom => region::bytes_random(buf.as_mut_slice(), rng),
            Operator::DeleteBytes => region::random_delete_bytes(buf, rng),
            Operator::GrowBytes => region::random_grow_bytes(buf, rng)?,
        }
        Ok(())
    }
}

/// What one havoc pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HavocSummary {
    /// Generator state before the pass; reseeding with it replays the pass.
    pub state_before: u64,
    pub state_after: u64,
    pub operators: Vec<Operator>,
}

impl HavocSummary {
    pub fn stacking(&self) -> usize {
        self.operators.len()
    }
}

/// Draws the number of stacked operators: a power of two in `[2, 128]`.
pub fn stacking_depth(rng: &mut ChainRng) -> u32 {
    1 << (1 + rng.rand_range(7))
}

/// Applies a stack of randomly chosen operators to `buf`.
///
/// The stacking depth is drawn first, then for each step an operator index
/// uniform over the operators `mode` allows. Each operator draws whatever else
/// it needs from the same generator, so the whole pass consumes one contiguous
/// run of the stream. An operator whose minimum length is not met is simply a
/// no-op for that step.
///
/// # Errors
/// Returns [`MutationError::AllocationFailed`] if a growth step could not
/// allocate. `buf` then holds the result of the steps before it.
pub fn havoc(
    buf: &mut MutationBuffer,
    mode: MutationMode,
    rng: &mut ChainRng,
) -> Result<HavocSummary, MutationError> {
    let state_before = rng.state();
    let len_before = buf.len();
    let stacking = stacking_depth(rng);
    let op_count = mode.operator_count();

    let mut operators = Vec::with_capacity(stacking as usize);
    for step in 0..stacking {
        let Some(op) = Operator::from_index(rng.rand_range(op_count)) else {
            continue;
        };
        op.apply(buf, rng)?;
        log::trace!("havoc step {}: {:?} -> len {}", step, op, buf.len());
        operators.push(op);
    }

    log::debug!(
        "havoc {:?}: {} ops, len {} -> {}, state {:#018x} -> {:#018x}",
        mode,
        stacking,
        len_before,
        buf.len(),
        state_before,
        rng.state()
    );

    Ok(HavocSummary {
        state_before,
        state_after: rng.state(),
        operators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::HAVOC_BLK_XL;
    use crate::buffer::MAX_LEN;
    use rand::Rng;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    #[test]
    fn stacking_depth_is_a_power_of_two_between_2_and_128() {
        let mut rng = ChainRng::new(10);
        for _ in 0..500 {
            let depth = stacking_depth(&mut rng);
            assert!(depth.is_power_of_two());
            assert!((2..=128).contains(&depth));
        }
    }

    #[test]
    fn operator_indices_follow_draw_order() {
        assert_eq!(Operator::from_index(0), Some(Operator::BitFlip));
        assert_eq!(Operator::from_index(8), Some(Operator::BytesRandom));
        assert_eq!(Operator::from_index(10), Some(Operator::GrowBytes));
        assert_eq!(Operator::from_index(11), None);
        assert_eq!(MutationMode::FixedSize.operator_count(), 9);
        assert_eq!(MutationMode::VariableLength.operator_count(), 11);
    }

    #[test]
    fn fixed_size_mode_never_changes_length() {
        for seed in 0..2000u64 {
            let mut buf = MutationBuffer::new(vec![0, 0, 0, 0]);
            let mut rng = ChainRng::new(seed);
            let summary = havoc(&mut buf, MutationMode::FixedSize, &mut rng).unwrap();
            assert_eq!(buf.len(), 4, "seed {}", seed);
            assert!(
                summary
                    .operators
                    .iter()
                    .all(|op| !matches!(op, Operator::DeleteBytes | Operator::GrowBytes))
            );
        }
    }

    #[test]
    fn same_seed_same_result() {
        let input = b"the quick brown fox".to_vec();
        let run = |seed| {
            let mut buf = MutationBuffer::new(input.clone());
            let mut rng = ChainRng::new(seed);
            let summary = havoc(&mut buf, MutationMode::VariableLength, &mut rng).unwrap();
            (buf.into_vec(), summary)
        };
        for seed in [0u64, 1, 4399, u64::MAX] {
            assert_eq!(run(seed), run(seed));
        }
    }

    #[test]
    fn summary_records_the_replay_state() {
        let mut rng = ChainRng::new(4242);
        let mut buf = MutationBuffer::new(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let summary = havoc(&mut buf, MutationMode::VariableLength, &mut rng).unwrap();
        assert_eq!(summary.state_before, 4242);
        assert_eq!(summary.state_after, rng.state());
        assert!(summary.stacking() >= 2);

        let mut replayed = MutationBuffer::new(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        havoc(
            &mut replayed,
            MutationMode::VariableLength,
            &mut ChainRng::new(summary.state_before),
        )
        .unwrap();
        assert_eq!(replayed, buf);
    }

    #[test]
    fn variable_length_mode_reaches_growth_and_deletion() {
        let mut rng = ChainRng::new(1);
        let mut seen_grow = false;
        let mut seen_delete = false;
        for _ in 0..200 {
            let mut buf = MutationBuffer::new(b"fuzzing".to_vec());
            let summary = havoc(&mut buf, MutationMode::VariableLength, &mut rng).unwrap();
            seen_grow |= summary.operators.contains(&Operator::GrowBytes);
            seen_delete |= summary.operators.contains(&Operator::DeleteBytes);
        }
        assert!(seen_grow && seen_delete);
    }

    #[test]
    fn repeated_havoc_rarely_leaves_input_unchanged() {
        let mut data_rng = ChaCha8Rng::from_seed([7u8; 32]);
        let mut rng = ChainRng::default();
        let mut unchanged = 0;
        for _ in 0..500 {
            let len = data_rng.random_range(1..256usize);
            let input: Vec<u8> = (0..len).map(|_| data_rng.random()).collect();
            let mut buf = MutationBuffer::new(input.clone());
            havoc(&mut buf, MutationMode::VariableLength, &mut rng).unwrap();
            if buf.as_slice() == input.as_slice() {
                unchanged += 1;
            }
        }
        assert!(unchanged < 25, "{} of 500 mutations were no-ops", unchanged);
    }

    #[test]
    fn variable_length_output_respects_growth_bound() {
        let mut rng = ChainRng::new(99);
        let mut buf = MutationBuffer::new(vec![0x41; 64]);
        for _ in 0..50 {
            havoc(&mut buf, MutationMode::VariableLength, &mut rng).unwrap();
            assert!(buf.len() >= 1);
            assert!(buf.len() <= MAX_LEN + HAVOC_BLK_XL as usize);
        }
    }

    #[test]
    fn empty_buffer_survives_every_mode() {
        for mode in [MutationMode::FixedSize, MutationMode::VariableLength] {
            let mut buf = MutationBuffer::default();
            let mut rng = ChainRng::new(3);
            havoc(&mut buf, mode, &mut rng).unwrap();
            assert!(buf.is_empty());
        }
    }
}
