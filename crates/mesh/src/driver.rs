//! Driver contract - medium-specific timing supplied by the radio layer
//!
//! The scheduler owns one driver for its lifetime and calls it
//! synchronously. Implementations must not call back into the scheduler.

use crate::community::Community;
use crate::knock::Knock;
use crate::tempo::{Seed, Tempo};

/// Radio-specific behavior plugged into [`crate::Tmesh`].
pub trait Driver {
    /// Customize a newly created tempo. Returning false aborts its creation.
    fn init_tempo(&mut self, _tempo: &mut Tempo) -> bool {
        true
    }

    /// Customize a newly joined community. Returning false aborts the join.
    fn init_community(&mut self, _community: &mut Community) -> bool {
        true
    }

    /// Release whatever the driver keeps for a tempo.
    fn free_tempo(&mut self, _tempo: &Tempo) {}

    /// Release whatever the driver keeps for a community.
    fn free_community(&mut self, _community: &Community) {}

    /// Apply one step's seed to the tempo, typically choosing `chan` and
    /// moving `at` to the next window. False aborts this pass for the tempo.
    fn advance(&mut self, tempo: &mut Tempo, seed: &Seed) -> bool;

    /// Pick the better of two candidates for the next knock. Must return
    /// `b` when `a` is `None`.
    fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo;

    /// Commit a populated knock to the hardware. False means not this cycle.
    fn schedule(&mut self, knock: &Knock) -> bool;

    /// A sequence epoch overflowed; time to resynchronize.
    fn notify(&mut self) {}
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn init_tempo(&mut self, tempo: &mut Tempo) -> bool {
        (**self).init_tempo(tempo)
    }

    fn init_community(&mut self, community: &mut Community) -> bool {
        (**self).init_community(community)
    }

    fn free_tempo(&mut self, tempo: &Tempo) {
        (**self).free_tempo(tempo)
    }

    fn free_community(&mut self, community: &Community) {
        (**self).free_community(community)
    }

    fn advance(&mut self, tempo: &mut Tempo, seed: &Seed) -> bool {
        (**self).advance(tempo, seed)
    }

    fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
        (**self).sort(a, b)
    }

    fn schedule(&mut self, knock: &Knock) -> bool {
        (**self).schedule(knock)
    }

    fn notify(&mut self) {
        (**self).notify()
    }
}
