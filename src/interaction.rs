//! Pause/resume arbitration between autonomous integration and the two drag
//! sources (a mass, or the coordinate-picker marker).
//!
//! At most one drag is active at a time; a second pointer-down while one is
//! in progress is ignored. Mass drags remember whether the run was playing
//! and restore it on release. Marker drags always resume on release because
//! the picker is the launch control for a new initial condition.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MassId {
    One,
    Two,
}

impl MassId {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            MassId::One => 0,
            MassId::Two => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveDrag {
    #[default]
    Idle,
    Mass(MassId),
    Marker,
}

#[derive(Clone, Debug)]
pub struct InteractionController {
    paused: bool,
    drag: ActiveDrag,
    // Only meaningful during a mass drag.
    resume_on_release: bool,
}

impl InteractionController {
    pub fn new(paused: bool) -> Self {
        Self {
            paused,
            drag: ActiveDrag::Idle,
            resume_on_release: false,
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn active_drag(&self) -> ActiveDrag {
        self.drag
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag != ActiveDrag::Idle
    }

    #[inline]
    pub fn resume_on_release(&self) -> bool {
        self.resume_on_release
    }

    /// Pause the run. During a mass drag this cancels the pending resume.
    pub fn pause(&mut self) {
        self.paused = true;
        self.resume_on_release = false;
    }

    /// Resume the run. During a drag the resume is deferred to release so the
    /// integrator never writes while a pointer owns the state.
    pub fn resume(&mut self) {
        match self.drag {
            ActiveDrag::Idle => self.paused = false,
            ActiveDrag::Mass(_) => self.resume_on_release = true,
            ActiveDrag::Marker => {}
        }
    }

    /// Idle -> dragging mass. Returns false if another drag owns the pointer.
    pub fn begin_mass_drag(&mut self, mass: MassId) -> bool {
        if self.is_dragging() {
            log::debug!("[drag] ignoring mass {:?}: {:?} active", mass, self.drag);
            return false;
        }
        self.resume_on_release = !self.paused;
        self.paused = true;
        self.drag = ActiveDrag::Mass(mass);
        log::debug!(
            "[drag] begin mass {:?} (resume on release: {})",
            mass,
            self.resume_on_release
        );
        true
    }

    /// Dragging mass -> idle. Returns the released mass, or `None` if no mass
    /// drag was active.
    pub fn end_mass_drag(&mut self) -> Option<MassId> {
        let ActiveDrag::Mass(mass) = self.drag else {
            return None;
        };
        self.drag = ActiveDrag::Idle;
        if self.resume_on_release {
            self.paused = false;
        }
        self.resume_on_release = false;
        log::debug!("[drag] end mass {:?} (paused: {})", mass, self.paused);
        Some(mass)
    }

    /// Idle -> dragging marker. Always pauses.
    pub fn begin_marker_drag(&mut self) -> bool {
        if self.is_dragging() {
            log::debug!("[picker] ignoring press: {:?} active", self.drag);
            return false;
        }
        self.paused = true;
        self.resume_on_release = false;
        self.drag = ActiveDrag::Marker;
        log::debug!("[picker] begin marker drag");
        true
    }

    /// Dragging marker -> idle. Always resumes.
    pub fn end_marker_drag(&mut self) -> bool {
        if self.drag != ActiveDrag::Marker {
            return false;
        }
        self.drag = ActiveDrag::Idle;
        self.paused = false;
        log::debug!("[picker] end marker drag, resuming");
        true
    }

    /// Drop any active drag without resuming.
    pub fn cancel_drag(&mut self) {
        self.drag = ActiveDrag::Idle;
        self.resume_on_release = false;
    }
}
