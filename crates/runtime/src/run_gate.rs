/// Identifies one evaluation run handed out by a [`RunGate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Orders overlapping evaluation runs.
///
/// Each trigger takes a fresh ticket; only the holder of the newest ticket
/// may touch the scene when its response arrives. Older runs still complete
/// but their results are dropped.
#[derive(Debug, Default)]
pub struct RunGate {
    latest: u64,
    in_flight: u32,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RunTicket {
        self.latest += 1;
        self.in_flight += 1;
        RunTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Marks a run as settled and reports whether it was still the newest.
    pub fn finish(&mut self, ticket: RunTicket) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.is_current(ticket)
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}

#[cfg(test)]
mod tests {
    use super::RunGate;
    use pretty_assertions::assert_eq;

    #[test]
    fn newest_trigger_wins() {
        let mut gate = RunGate::new();
        let first = gate.begin();
        let second = gate.begin();
        assert_eq!(gate.in_flight(), 2);

        // Second response lands first.
        assert!(gate.finish(second));
        assert!(!gate.finish(first));
        assert!(!gate.is_busy());
    }

    #[test]
    fn single_run_is_current() {
        let mut gate = RunGate::new();
        let t = gate.begin();
        assert!(gate.is_current(t));
        assert_eq!(t.generation(), 1);
        assert!(gate.finish(t));
        assert!(gate.is_current(t));
    }

    #[test]
    fn finish_never_underflows() {
        let mut gate = RunGate::new();
        let t = gate.begin();
        gate.finish(t);
        gate.finish(t);
        assert_eq!(gate.in_flight(), 0);
    }
}
