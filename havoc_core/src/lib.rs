pub mod block;
pub mod buffer;
pub mod config;
pub mod havoc;
pub mod input;
pub mod interesting;
pub mod mutator;
pub mod ops;
pub mod region;
pub mod replay;
pub mod rng;

pub use buffer::{MAX_LEN, MutationBuffer, MutationError};
pub use config::HavocConfig;
pub use havoc::{HavocSummary, MutationMode, Operator, havoc};
pub use input::Input;
pub use mutator::{HavocMutator, Mutator, mutate_bytes, mutate_f64, mutate_i32, mutate_str};
pub use replay::{ReplayError, ReplayLog, ReplayRecord, read_replay_log, replay};
pub use rng::{ChainRng, DEFAULT_SEED};
