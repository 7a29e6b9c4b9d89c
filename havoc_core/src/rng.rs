use rand_core::{RngCore, SeedableRng, impls};

/// State a fresh generator starts from when no seed is supplied.
pub const DEFAULT_SEED: u64 = 4399;

const MIX_XOR: u64 = 0x9E37_79B9_7F4A_7C15;
const MIX_MUL_1: u64 = 0xBF58_476D_1CE4_E5B9;
const MIX_MUL_2: u64 = 0x94D0_49BB_1331_11EB;

/// Bijective 64-bit avalanche step used to advance the generator.
#[inline]
pub(crate) fn hash64(input: u64) -> u64 {
    let mut x = (input ^ MIX_XOR).wrapping_mul(MIX_MUL_1);
    x = (x ^ (x >> 30)).wrapping_mul(MIX_MUL_2);
    x ^ (x >> 31)
}

/// A chained, seedable pseudo-random generator driving every mutation decision.
///
/// The whole generator is a single `u64`. Each bounded draw reads the current
/// state and then advances it with [`hash64`], so a mutation sequence is fully
/// determined by the state captured before it started. This makes any mutation
/// reproducible from `(state, input)` alone.
///
/// The generator is not cryptographically secure and carries no internal
/// synchronization. Give each worker its own instance (see [`ChainRng::for_worker`])
/// or wrap a shared one in a `Mutex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRng {
    state: u64,
}

impl ChainRng {
    /// Creates a generator whose state is exactly `seed`.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Derives an independent stream for worker `worker` from a shared run seed.
    pub fn for_worker(seed: u64, worker: usize) -> Self {
        Self::new(hash64(seed ^ hash64(worker as u64)))
    }

    /// Resets the state to `seed`. Nothing else is touched.
    pub fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }

    /// Returns the current state without advancing it.
    pub fn state(&self) -> u64 {
        self.state
    }

    #[inline]
    fn advance(&mut self) {
        self.state = hash64(self.state);
    }

    /// Draws a value in `[0, max)`.
    ///
    /// For `max <= 1` this returns `0` and leaves the state untouched; callers
    /// rely on that to ask for a degenerate draw without consuming the stream.
    /// Otherwise the result is the high half of `state * max`, taken before
    /// the state advances.
    pub fn rand_range(&mut self, max: u32) -> u32 {
        if max <= 1 {
            return 0;
        }
        let result = ((self.state as u128 * max as u128) >> 64) as u32;
        self.advance();
        result % max
    }

    /// [`rand_range`](Self::rand_range) over a buffer-sized bound.
    ///
    /// Bounds above `u32::MAX` saturate.
    #[inline]
    pub fn below(&mut self, bound: usize) -> usize {
        self.rand_range(u32::try_from(bound).unwrap_or(u32::MAX)) as usize
    }

    /// A 50/50 draw.
    #[inline]
    pub fn coin(&mut self) -> bool {
        self.rand_range(2) != 0
    }
}

impl Default for ChainRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for ChainRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Advances once and returns the new state.
    fn next_u64(&mut self) -> u64 {
        self.advance();
        self.state
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

impl SeedableRng for ChainRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    /// Unlike the trait default, the state is taken verbatim so that a `u64`
    /// seed means the same thing everywhere in this crate.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}
