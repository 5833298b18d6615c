//! Consent onboarding state machine
//!
//! Pure transitions in the Elm style: `transition` maps the current step,
//! the collected context and one user input to a new step, effects, and a
//! reply. The governor applies the effects.

mod effect;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use state::{ConsentContext, CredentialLifetime, Mode, Step};
pub use transition::{transition, TransitionError, TransitionResult};
