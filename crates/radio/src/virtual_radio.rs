//! Software driver: turns tempo seeds into channels and windows

use tmesh::{Driver, Knock, KnockId, Seed, Tempo};
use tmesh_core::RadioConfig;
use tracing::{debug, info};

/// Reference [`Driver`] with no hardware behind it.
///
/// Each step lands `window + seed % (jitter + 1)` cycles after the last
/// one on channel `seed % channels`. Committed knocks are queued for
/// whoever plays the radio, see [`crate::Air`].
#[derive(Debug)]
pub struct VirtualRadio {
    config: RadioConfig,
    scheduled: Vec<KnockId>,
    overflows: u32,
    live_tempos: usize,
}

impl VirtualRadio {
    /// Driver for the given radio settings.
    pub fn new(config: RadioConfig) -> Self {
        Self {
            config,
            scheduled: Vec::new(),
            overflows: 0,
            live_tempos: 0,
        }
    }

    /// Radio settings in use.
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Drain knocks committed since the last call.
    pub fn take_scheduled(&mut self) -> Vec<KnockId> {
        std::mem::take(&mut self.scheduled)
    }

    /// Epoch overflows reported so far.
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Tempos initialized and not yet freed.
    pub fn live_tempos(&self) -> usize {
        self.live_tempos
    }
}

fn words(seed: &Seed) -> (u32, u32) {
    (
        u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]),
        u32::from_le_bytes([seed[4], seed[5], seed[6], seed[7]]),
    )
}

impl Driver for VirtualRadio {
    fn init_tempo(&mut self, tempo: &mut Tempo) -> bool {
        tempo.chan = 0;
        self.live_tempos += 1;
        true
    }

    fn free_tempo(&mut self, _tempo: &Tempo) {
        self.live_tempos = self.live_tempos.saturating_sub(1);
    }

    fn advance(&mut self, tempo: &mut Tempo, seed: &Seed) -> bool {
        let (chan, jitter) = words(seed);
        tempo.chan = chan % self.config.channels.max(1);
        let step = self.config.window.max(1) + jitter % self.config.jitter.saturating_add(1);
        tempo.at = tempo.at.saturating_add(step);
        true
    }

    fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
        match a {
            Some(a) if (a.at, a.seq) <= (b.at, b.seq) => a,
            _ => b,
        }
    }

    fn schedule(&mut self, knock: &Knock) -> bool {
        debug!(knock = ?knock.id(), start = knock.start, chan = knock.chan, tx = knock.tx, "Knock committed");
        self.scheduled.push(knock.id());
        true
    }

    fn notify(&mut self) {
        self.overflows += 1;
        info!(overflows = self.overflows, "Epoch overflow, resynchronize");
    }
}
