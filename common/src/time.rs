//! Tick-based time intervals for blocking operations.

/// Timeout specification accepted by every blocking operation.
///
/// Two values are reserved: [`Immediate`] requests non-blocking
/// behavior and [`Infinite`] requests unbounded blocking. Everything
/// in between is a budget of kernel ticks for the whole operation.
///
/// [`Immediate`]: Timeout::Immediate
/// [`Infinite`]: Timeout::Infinite
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    /// Do not block: the operation completes at once or times out.
    Immediate,
    /// Block for at most this many ticks.
    Ticks(u64),
    /// Block until completion or until the resource is reset.
    Infinite,
}

impl Timeout {
    /// Builds a timeout from a raw tick count, normalizing zero to
    /// [`Timeout::Immediate`].
    pub const fn from_ticks(ticks: u64) -> Self {
        if ticks == 0 {
            Timeout::Immediate
        } else {
            Timeout::Ticks(ticks)
        }
    }

    pub const fn is_immediate(self) -> bool {
        matches!(self, Timeout::Immediate)
    }

    pub const fn is_infinite(self) -> bool {
        matches!(self, Timeout::Infinite)
    }
}

/// Remaining-budget countdown for one blocking operation.
///
/// Blocked operations poll their resource; each poll consumes one
/// tick of the budget derived from the caller's [`Timeout`]. A budget
/// built from [`Timeout::Immediate`] is spent before the first wait,
/// one built from [`Timeout::Infinite`] never runs out.
pub struct TickBudget {
    remaining: Option<u64>,
}

impl TickBudget {
    pub fn new(timeout: Timeout) -> Self {
        let remaining = match timeout {
            Timeout::Immediate => Some(0),
            Timeout::Ticks(n) => Some(n),
            Timeout::Infinite => None,
        };
        Self { remaining }
    }

    /// Consumes one tick. Returns `false` once the budget is spent.
    pub fn consume(&mut self) -> bool {
        match &mut self.remaining {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}
