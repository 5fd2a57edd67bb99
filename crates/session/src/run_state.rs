//! Per-run state for long-running modes

use tokio_util::sync::CancellationToken;

/// Position of a cycle within its token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPhase {
    First,
    Second,
}

impl PairPhase {
    pub fn label(&self) -> &'static str {
        match self {
            PairPhase::First => "first",
            PairPhase::Second => "second",
        }
    }
}

/// Cancellation plus cycle counters.
///
/// The interrupt handler only cancels `cancel`; the orchestrator is the only
/// writer of the indices.
#[derive(Debug, Clone)]
pub struct RunState {
    pub cancel: CancellationToken,
    pub cycle_index: u64,
    pub pair_index: u64,
}

impl RunState {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            cycle_index: 0,
            pair_index: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Start the next cycle. Odd cycles open a pair, even cycles close it.
    pub fn advance_cycle(&mut self) -> PairPhase {
        self.cycle_index += 1;
        self.pair_index = self.cycle_index.div_ceil(2);
        if self.cycle_index % 2 == 1 {
            PairPhase::First
        } else {
            PairPhase::Second
        }
    }
}
