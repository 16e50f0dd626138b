//! Domain model: the entities the matching engine reads and writes.
//!
//! These are the core's in-memory representations of the five persisted
//! entities described in the external interfaces. Concrete persistence
//! lives behind the `GazetteerStore` / `InputStore` ports in `crate::ports`
//! and is implemented by `crate::store`.

mod correction;
mod gazetteer;
mod input;
mod match_attempt;
mod match_result;

pub use correction::{CorrectionAgent, CorrectionNote};
pub use gazetteer::{GazetteerEntry, GazetteerStatus};
pub use input::{AddressComponents, InputRecord};
pub use match_attempt::{MatchAttempt, MatchMethod};
pub use match_result::{Decision, MatchResult};
