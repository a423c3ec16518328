use std::sync::Arc;

use crate::pipeline::detect_still_use_case::StillOutcome;

/// Where a one-shot still came from. Each source has its own panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StillSource {
    Captured,
    Uploaded,
}

/// Issued when a one-shot request starts. Sequence numbers increase
/// monotonically across both sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub source: StillSource,
    seq: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StillPanel {
    /// Encoded still, shared with views without copying.
    pub image: Arc<Vec<u8>>,
    /// `None` while detection is still running.
    pub outcome: Option<StillOutcome>,
}

/// Immutable view of the one-shot display state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplaySnapshot {
    pub captured: Option<StillPanel>,
    pub uploaded: Option<StillPanel>,
}

impl DisplaySnapshot {
    pub fn panel(&self, source: StillSource) -> Option<&StillPanel> {
        match source {
            StillSource::Captured => self.captured.as_ref(),
            StillSource::Uploaded => self.uploaded.as_ref(),
        }
    }
}

/// Owner of the one-shot display state.
///
/// Requests can finish out of order. Results from a request are applied
/// only while its ticket is still the latest one issued for that source,
/// so an older, slower request never overwrites a newer one.
#[derive(Default)]
pub struct DisplayBoard {
    next_seq: u64,
    latest_captured: Option<u64>,
    latest_uploaded: Option<u64>,
    snapshot: DisplaySnapshot,
}

impl DisplayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, source: StillSource) -> Ticket {
        self.next_seq += 1;
        *self.latest_mut(source) = Some(self.next_seq);
        Ticket {
            source,
            seq: self.next_seq,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        let latest = match ticket.source {
            StillSource::Captured => self.latest_captured,
            StillSource::Uploaded => self.latest_uploaded,
        };
        latest == Some(ticket.seq)
    }

    /// Shows the still for `ticket` with its outcome pending. Returns
    /// whether it was applied.
    pub fn store_image(&mut self, ticket: Ticket, image: Vec<u8>) -> bool {
        if !self.is_current(ticket) {
            log::debug!("Dropping stale still for {:?}", ticket);
            return false;
        }
        *self.panel_mut(ticket.source) = Some(StillPanel {
            image: Arc::new(image),
            outcome: None,
        });
        true
    }

    /// Records the detection outcome for `ticket`. Returns whether it was
    /// applied.
    pub fn resolve(&mut self, ticket: Ticket, outcome: StillOutcome) -> bool {
        if !self.is_current(ticket) {
            log::debug!("Dropping stale outcome for {:?}", ticket);
            return false;
        }
        match self.panel_mut(ticket.source) {
            Some(panel) => {
                panel.outcome = Some(outcome);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshot.clone()
    }

    fn latest_mut(&mut self, source: StillSource) -> &mut Option<u64> {
        match source {
            StillSource::Captured => &mut self.latest_captured,
            StillSource::Uploaded => &mut self.latest_uploaded,
        }
    }

    fn panel_mut(&mut self, source: StillSource) -> &mut Option<StillPanel> {
        match source {
            StillSource::Captured => &mut self.snapshot.captured,
            StillSource::Uploaded => &mut self.snapshot.uploaded,
        }
    }
}
