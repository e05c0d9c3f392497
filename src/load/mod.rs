//! Resource Load State Machine
//!
//! Every node that shows remote media owns a [`LoadController`]. It moves
//! through `Idle → Loading → {Ready, Failed}`; `Loading` is re-entrant, a new
//! request supersedes the pending one.
//!
//! # Guarantees
//!
//! - Setting a source to its committed, non-empty value performs no fetch.
//! - Only the newest request may commit. Results of superseded requests are
//!   dropped when they arrive, whatever order the network delivers them in.
//! - Multi-slot nodes commit all slots at once, after every slot settled.
//! - A failed load keeps the previous committed values, shows the error
//!   affordance and leaves exactly one error issue on the node.
//! - The loading affordance is always hidden once a load settles.
//! - A successful or failed load emits `ObjectsChanged` and
//!   `SelectionChanged` exactly once.

mod controller;
mod state;

pub use controller::{ErrorCallback, LoadController};
pub use state::{Affordances, AttachContext, LoadOutcome, LoadPhase, MediaContent, MediaSlot};
