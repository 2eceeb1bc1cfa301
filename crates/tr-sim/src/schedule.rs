//! Step-wise driver controls from a scenario's control points.

use tr_project::{ControlPointDef, GearCommandDef};

/// Driver demand held between control points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub throttle: f64,
    pub brake_force_n: f64,
}

/// Control points activated in time order.
///
/// Before the first point all controls are zero. A point's gear command is
/// reported once, on the call that activates it.
#[derive(Clone, Debug)]
pub struct ControlSchedule {
    points: Vec<ControlPointDef>,
    next: usize,
    current: Controls,
}

impl ControlSchedule {
    pub fn new(points: Vec<ControlPointDef>) -> Self {
        Self {
            points,
            next: 0,
            current: Controls::default(),
        }
    }

    /// Number of points already activated.
    pub fn position(&self) -> usize {
        self.next
    }

    /// Resume with the first `position` points already applied.
    pub fn seek(&mut self, position: usize) {
        self.next = position.min(self.points.len());
        self.current = match self.next.checked_sub(1).and_then(|i| self.points.get(i)) {
            Some(p) => Controls {
                throttle: p.throttle,
                brake_force_n: p.brake_force_n,
            },
            None => Controls::default(),
        };
    }

    pub fn current(&self) -> Controls {
        self.current
    }

    /// Activate every point due by `time_s`; returns the gear commands they carry.
    pub fn advance(&mut self, time_s: f64) -> Vec<GearCommandDef> {
        let mut commands = Vec::new();
        while let Some(point) = self.points.get(self.next) {
            if point.time_s > time_s {
                break;
            }
            self.current = Controls {
                throttle: point.throttle,
                brake_force_n: point.brake_force_n,
            };
            commands.extend(point.gear);
            self.next += 1;
        }
        commands
    }
}
