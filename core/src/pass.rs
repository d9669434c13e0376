//! Pass trait.
//!
//! RULE: every leveling stage implements LevelingPass.
//! The engine runs each registered pass once, in registration order,
//! against the same WorldState. Execution order is documented in engine.rs.

use crate::{context::RunContext, error::LevelResult, event::LevelEvent, state::WorldState};

pub trait LevelingPass: Send {
    /// Unique stable name for this pass.
    fn name(&self) -> &'static str;

    /// Mutate `world` through `apply_move`/`apply_swap` only, and report
    /// every accepted change as an event.
    fn run(&mut self, world: &mut WorldState, ctx: &RunContext<'_>) -> LevelResult<Vec<LevelEvent>>;
}
