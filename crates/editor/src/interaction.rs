//! Pointer gestures on the grid, turned into backend intents.
//!
//! [`DragController`] is a plain state machine: it is fed pointer events and
//! hands back the [`Intent`] the caller should dispatch. It performs no I/O.
//!
//! A press only becomes a drag once the pointer has moved further than the
//! activation distance, so a press and release in place never produces a
//! drop.

/// Distance in pixels the pointer must travel before a press becomes a drag
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`
    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        let d = self.offset_from(other);
        d.x.hypot(d.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// Pointer is down on `source` but has not moved far enough to drag
    Pressed { source: usize, origin: Point },
    /// `source` follows the pointer, not over any drop target
    PickedUp {
        source: usize,
        origin: Point,
        offset: Point,
    },
    /// `source` follows the pointer over `target`
    Hovering {
        source: usize,
        origin: Point,
        offset: Point,
        target: usize,
    },
}

/// What the current hover target would do with the dragged cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Affordance {
    #[default]
    Neutral,
    Allowed,
    Disallowed,
}

/// A command the caller should send to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Ask whether `active` may be dropped on `over`
    CheckLegality { over: usize, active: usize },
    /// Move `active` onto `over`
    Drop { over: usize, active: usize },
    ToggleLock { id: usize },
}

#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    affordance: Affordance,
    activation_distance: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl DragController {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            state: DragState::Idle,
            affordance: Affordance::Neutral,
            activation_distance,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn affordance(&self) -> Affordance {
        self.affordance
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self.state,
            DragState::PickedUp { .. } | DragState::Hovering { .. }
        )
    }

    /// Cell being dragged, once the drag has started
    pub fn source(&self) -> Option<usize> {
        match self.state {
            DragState::PickedUp { source, .. } | DragState::Hovering { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<usize> {
        match self.state {
            DragState::Hovering { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Translation to draw the dragged cell with
    pub fn offset(&self) -> Option<Point> {
        match self.state {
            DragState::PickedUp { offset, .. } | DragState::Hovering { offset, .. } => Some(offset),
            _ => None,
        }
    }

    /// Primary button went down on the cell `source`.
    ///
    /// Any gesture still in progress is abandoned.
    pub fn press(&mut self, source: usize, at: Point) {
        self.affordance = Affordance::Neutral;
        self.state = DragState::Pressed { source, origin: at };
    }

    /// Pointer moved to `at`, over the drop target `over` if any.
    ///
    /// Returns a legality query whenever the drag enters a new target.
    pub fn move_to(&mut self, at: Point, over: Option<usize>) -> Option<Intent> {
        let (source, origin, previous) = match self.state {
            DragState::Idle => return None,
            DragState::Pressed { source, origin } => {
                if at.distance(origin) <= self.activation_distance {
                    return None;
                }
                (source, origin, None)
            }
            DragState::PickedUp { source, origin, .. } => (source, origin, None),
            DragState::Hovering {
                source,
                origin,
                target,
                ..
            } => (source, origin, Some(target)),
        };

        let offset = at.offset_from(origin);
        match over {
            Some(target) => {
                self.state = DragState::Hovering {
                    source,
                    origin,
                    offset,
                    target,
                };
                (previous != Some(target)).then_some(Intent::CheckLegality {
                    over: target,
                    active: source,
                })
            }
            None => {
                self.state = DragState::PickedUp {
                    source,
                    origin,
                    offset,
                };
                self.affordance = Affordance::Neutral;
                None
            }
        }
    }

    /// Applies the answer to a legality query.
    ///
    /// The last answer applied wins, whichever target it was asked for.
    /// Answers arriving after the drag ended are ignored.
    pub fn legality_resolved(&mut self, allowed: bool) {
        if !self.is_dragging() {
            return;
        }

        self.affordance = if allowed {
            Affordance::Allowed
        } else {
            Affordance::Disallowed
        };
    }

    /// Primary button released over `over`.
    ///
    /// Yields a drop only if a drag was in progress and ended on a target.
    pub fn release(&mut self, over: Option<usize>) -> Option<Intent> {
        let source = self.source();
        self.reset();

        Some(Intent::Drop {
            over: over?,
            active: source?,
        })
    }

    /// Abandons the gesture without a drop
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Secondary button on the active cell `id`
    pub fn secondary(&self, id: usize) -> Intent {
        Intent::ToggleLock { id }
    }

    fn reset(&mut self) {
        self.state = DragState::Idle;
        self.affordance = Affordance::Neutral;
    }
}
