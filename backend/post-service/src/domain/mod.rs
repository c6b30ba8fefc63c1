/// Pure domain logic with no I/O
pub mod reactions;

pub use reactions::{apply_reaction, ReactionError, ReactionState, ReactionSummary, VoteKind};
