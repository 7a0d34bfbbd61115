use crate::range::RangeSelection;
use crate::taxonomy::TierFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderKind {
    Pgu,
    Quantum,
}

impl SliderKind {
    #[must_use]
    pub const fn family(self) -> TierFamily {
        match self {
            Self::Pgu => TierFamily::Pgu,
            Self::Quantum => TierFamily::Quantum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knob {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderPhase {
    /// No pointer or key engagement.
    Idle,
    /// Live value follows input; nothing outside the slider changes.
    Dragging,
    /// A commit token has been handed out and not yet applied.
    Committing,
}

/// Finished slider interaction.
///
/// Only [`SliderController`] can create one, which keeps range writes into the
/// filter state behind the commit transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCommit {
    kind: SliderKind,
    selection: RangeSelection,
}

impl RangeCommit {
    #[must_use]
    pub const fn kind(&self) -> SliderKind {
        self.kind
    }

    #[must_use]
    pub const fn selection(&self) -> RangeSelection {
        self.selection
    }
}

/// Live/committed state machine for one dual-knob range slider.
#[derive(Debug, Clone)]
pub struct SliderController {
    kind: SliderKind,
    phase: SliderPhase,
    span: RangeSelection,
    live: RangeSelection,
    committed: RangeSelection,
    active_knob: Option<Knob>,
}

impl SliderController {
    #[must_use]
    pub fn new(kind: SliderKind, span: RangeSelection) -> Self {
        let span = span.normalized();
        Self {
            kind,
            phase: SliderPhase::Idle,
            span,
            live: span,
            committed: span,
            active_knob: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SliderKind {
        self.kind
    }

    #[must_use]
    pub const fn phase(&self) -> SliderPhase {
        self.phase
    }

    #[must_use]
    pub const fn span(&self) -> RangeSelection {
        self.span
    }

    /// Value to draw; follows every drag tick.
    #[must_use]
    pub const fn live(&self) -> RangeSelection {
        self.live
    }

    /// Value last handed out in a [`RangeCommit`].
    #[must_use]
    pub const fn committed(&self) -> RangeSelection {
        self.committed
    }

    #[must_use]
    pub const fn active_knob(&self) -> Option<Knob> {
        self.active_knob
    }

    pub fn begin_drag(&mut self, knob: Knob) {
        self.phase = SliderPhase::Dragging;
        self.active_knob = Some(knob);
    }

    /// Visual-only update. Knobs may cross while dragging; order is restored on commit.
    pub fn on_drag(&mut self, selection: RangeSelection) {
        self.phase = SliderPhase::Dragging;
        self.live = selection.clamp_to(self.span);
    }

    /// Moves a single knob, as pointer-move events do.
    pub fn drag_knob(&mut self, knob: Knob, value: i64) {
        let mut next = self.live;
        match knob {
            Knob::Low => next.low = value,
            Knob::High => next.high = value,
        }
        self.active_knob = Some(knob);
        self.on_drag(next);
    }

    /// Drag abandoned (released outside the control, escape key): back to the committed value.
    pub fn cancel_drag(&mut self) {
        self.live = self.committed;
        self.phase = SliderPhase::Idle;
        self.active_knob = None;
    }

    /// Ends the interaction at `selection`.
    pub fn on_commit(&mut self, selection: RangeSelection) -> RangeCommit {
        let selection = selection.clamp_to(self.span).normalized();
        self.phase = SliderPhase::Committing;
        self.active_knob = None;
        self.live = selection;
        self.committed = selection;
        RangeCommit {
            kind: self.kind,
            selection,
        }
    }

    /// Pointer released: commits whatever the live value is.
    pub fn release(&mut self) -> RangeCommit {
        self.on_commit(self.live)
    }

    /// Click on the bare track: the nearer knob jumps there and the move commits at once.
    pub fn track_click(&mut self, value: i64) -> RangeCommit {
        let value = value.clamp(self.span.low, self.span.high);
        let current = self.committed;
        let to_low = (current.low - value).abs();
        let to_high = (current.high - value).abs();
        let next = if to_low <= to_high {
            RangeSelection::new(value, current.high)
        } else {
            RangeSelection::new(current.low, value)
        };
        self.on_commit(next)
    }

    /// Returns to idle once the commit has been applied.
    pub fn settle(&mut self) {
        if self.phase == SliderPhase::Committing {
            self.phase = SliderPhase::Idle;
        }
    }

    /// Re-seeds both values without producing a commit (reset, taxonomy reload).
    pub fn sync(&mut self, selection: RangeSelection) {
        let selection = selection.clamp_to(self.span).normalized();
        self.live = selection;
        self.committed = selection;
        self.phase = SliderPhase::Idle;
        self.active_knob = None;
    }

    pub fn set_span(&mut self, span: RangeSelection) {
        self.span = span.normalized();
        self.live = self.live.clamp_to(self.span);
        self.committed = self.committed.clamp_to(self.span).normalized();
    }
}
