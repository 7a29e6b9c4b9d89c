use crate::buffer::{MutationBuffer, MutationError};
use crate::havoc::{HavocSummary, MutationMode, havoc};
use crate::input::Input;
use crate::rng::ChainRng;

/// A `Mutator` is responsible for transforming an `Input` into a new, potentially modified `Input`.
///
/// # Type Parameters
/// * `I`: The type of `Input` this mutator operates on.
pub trait Mutator<I: Input> {
    /// Applies a mutation strategy to an optional input to produce a new input.
    ///
    /// # Arguments
    /// * `input_opt`: An `Option<&I>` representing the input to mutate.
    ///   - `Some(input)`: The mutator will base its transformation on this input.
    ///   - `None`: The mutator starts from `I::default()`.
    /// * `rng`: The generator every mutation decision is drawn from. Capturing
    ///   its state beforehand is enough to replay the call.
    ///
    /// # Returns
    /// `Result<I, MutationError>`:
    ///   - `Ok(new_input)`: The mutated input.
    ///   - `Err(error)`: A growth step could not allocate.
    fn mutate(&mut self, input_opt: Option<&I>, rng: &mut ChainRng) -> Result<I, MutationError>;
}

/// The stacked havoc strategy: a random number of byte-level operators
/// applied in one pass, in the mode the input type declares.
///
/// Keeps the summary of its latest pass for callers that log or replay.
#[derive(Debug, Default, Clone)]
pub struct HavocMutator {
    last: Option<HavocSummary>,
}

impl HavocMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the most recent successful pass.
    pub fn last_summary(&self) -> Option<&HavocSummary> {
        self.last.as_ref()
    }
}

impl<I: Input> Mutator<I> for HavocMutator {
    fn mutate(&mut self, input_opt: Option<&I>, rng: &mut ChainRng) -> Result<I, MutationError> {
        let base = input_opt.cloned().unwrap_or_default();
        let mut buffer = base.to_buffer();
        let summary = havoc(&mut buffer, I::MODE, rng)?;
        self.last = Some(summary);
        Ok(I::from_buffer(buffer))
    }
}

/// Mutates a raw byte sequence in the given mode.
pub fn mutate_bytes(
    rng: &mut ChainRng,
    bytes: &[u8],
    mode: MutationMode,
) -> Result<Vec<u8>, MutationError> {
    let mut buffer = match mode {
        MutationMode::FixedSize => MutationBuffer::new(bytes.to_vec()),
        MutationMode::VariableLength => MutationBuffer::with_sentinel(bytes),
    };
    havoc(&mut buffer, mode, rng)?;
    Ok(buffer.into_vec())
}

/// Mutates the raw 4-byte representation of `value`.
pub fn mutate_i32(rng: &mut ChainRng, value: i32) -> Result<i32, MutationError> {
    HavocMutator::new().mutate(Some(&value), rng)
}

/// Mutates the raw 8-byte IEEE-754 representation of `value`.
pub fn mutate_f64(rng: &mut ChainRng, value: f64) -> Result<f64, MutationError> {
    HavocMutator::new().mutate(Some(&value), rng)
}

/// Mutates the UTF-8 bytes of `value`. Every output byte becomes one char.
pub fn mutate_str(rng: &mut ChainRng, value: &str) -> Result<String, MutationError> {
    HavocMutator::new().mutate(Some(&value.to_string()), rng)
}
