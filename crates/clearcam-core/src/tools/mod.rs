//! Tool system and the drawing state machine.
//!
//! [`transition`] is a pure function from (state, intent, context) to a new
//! state plus at most one [`Effect`]. It never touches the store; the
//! coordinator applies the effect.

use crate::camera::Camera;
use crate::hit::hit_test;
use crate::input::{Intent, MouseButton};
use crate::shapes::{Shape, ShapeColor, ShapeId, ShapeKind};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default commit threshold for drawn shapes, in content units.
pub const MIN_SHAPE_EXTENT: f64 = 5.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Draw circles (squares with shift), or select by clicking a shape.
    #[default]
    Brush,
    /// Delete the shape under the pointer.
    Eraser,
    /// Drag to move the view.
    Pan,
}

/// State of the canvas interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Panning {
        /// Last pointer position in screen space.
        last: Point,
    },
    DrawingShape {
        /// Content-space center of the shape being drawn.
        start: Point,
        /// The uncommitted shape, re-sized on every move.
        transient: Shape,
    },
    ShapeSelected {
        id: ShapeId,
    },
}

/// Something the coordinator must do as a result of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Move the view by a screen-space delta.
    Pan(Vec2),
    /// Select an existing shape.
    Select(ShapeId),
    /// Add a finished shape to the store and select it.
    Commit(Shape),
    /// Remove a shape from the store.
    Delete(ShapeId),
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: DrawState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn to(state: DrawState) -> Self {
        Self { state, effect: None }
    }

    fn with(state: DrawState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

/// Everything a transition reads besides the state and the intent.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub tool: ToolKind,
    pub camera: &'a Camera,
    /// Committed shapes of the current bucket, in insertion order.
    pub shapes: &'a [Shape],
    pub selected: Option<ShapeId>,
    /// Overlay opacity stamped onto new shapes.
    pub opacity: u8,
    pub color: ShapeColor,
    /// A frame is loaded and paused, so annotation is possible.
    pub can_annotate: bool,
    pub min_extent: f64,
}

/// Extent of a shape drawn from `start` to `current`.
///
/// Circles use the distance as radius. Squares use twice the larger axis
/// delta as edge length, so the pointer always lies on the square's edge.
pub fn drawn_extent(kind: ShapeKind, start: Point, current: Point) -> f64 {
    match kind {
        ShapeKind::Circle => start.distance(current),
        ShapeKind::Square => {
            let d = current - start;
            2.0 * d.x.abs().max(d.y.abs())
        }
    }
}

/// Compute the next state for `intent`.
pub fn transition(state: &DrawState, intent: &Intent, ctx: &DrawContext<'_>) -> Transition {
    match intent {
        Intent::PointerDown {
            position,
            button,
            modifiers,
        } => {
            if *button != MouseButton::Left {
                return Transition::to(state.clone());
            }
            pointer_down(state, *position, modifiers.shift, ctx)
        }
        Intent::PointerMove { position } => pointer_move(state, *position, ctx),
        Intent::PointerUp { position } => {
            // The release point is the final size of the gesture, and the
            // last leg of a pan.
            let moved = pointer_move(state, *position, ctx);
            let mut released = release(&moved.state, ctx);
            if released.effect.is_none() {
                released.effect = moved.effect;
            }
            released
        }
        Intent::PointerLeave => release(state, ctx),
        Intent::KeyDown(key) => {
            if !key.is_delete() {
                return Transition::to(state.clone());
            }
            match ctx.selected {
                Some(id) => {
                    let next = match state {
                        DrawState::ShapeSelected { .. } => DrawState::Idle,
                        other => other.clone(),
                    };
                    Transition::with(next, Effect::Delete(id))
                }
                None => Transition::to(state.clone()),
            }
        }
    }
}

fn pointer_down(state: &DrawState, position: Point, shift: bool, ctx: &DrawContext<'_>) -> Transition {
    if ctx.tool == ToolKind::Pan {
        return Transition::to(DrawState::Panning { last: position });
    }
    if !ctx.can_annotate {
        return Transition::to(state.clone());
    }

    let point = ctx.camera.screen_to_content(position);
    let hit = hit_test(point, ctx.shapes).map(Shape::id);

    if ctx.tool == ToolKind::Eraser {
        return match hit {
            Some(id) => Transition::with(DrawState::Idle, Effect::Delete(id)),
            None => Transition::to(DrawState::Idle),
        };
    }

    // Existing shapes take priority so a click never both selects and
    // starts a new shape.
    if let Some(id) = hit {
        return Transition::with(DrawState::ShapeSelected { id }, Effect::Select(id));
    }
    let kind = if shift { ShapeKind::Square } else { ShapeKind::Circle };
    let transient = Shape::new(kind, point, 0.0, ctx.opacity, ctx.color);
    Transition::to(DrawState::DrawingShape {
        start: point,
        transient,
    })
}

fn pointer_move(state: &DrawState, position: Point, ctx: &DrawContext<'_>) -> Transition {
    match state {
        DrawState::Panning { last } => {
            let delta = position - *last;
            Transition::with(DrawState::Panning { last: position }, Effect::Pan(delta))
        }
        DrawState::DrawingShape { start, transient } => {
            let point = ctx.camera.screen_to_content(position);
            let mut transient = transient.clone();
            transient.set_extent(drawn_extent(transient.kind(), *start, point));
            Transition::to(DrawState::DrawingShape {
                start: *start,
                transient,
            })
        }
        other => Transition::to(other.clone()),
    }
}

fn release(state: &DrawState, ctx: &DrawContext<'_>) -> Transition {
    match state {
        DrawState::Panning { .. } => Transition::to(DrawState::Idle),
        DrawState::DrawingShape { transient, .. } => {
            if transient.extent() > ctx.min_extent {
                let id = transient.id();
                Transition::with(
                    DrawState::ShapeSelected { id },
                    Effect::Commit(transient.clone()),
                )
            } else {
                log::debug!(
                    "Discarding {:?} with extent {:.2}",
                    transient.kind(),
                    transient.extent()
                );
                Transition::to(DrawState::Idle)
            }
        }
        other => Transition::to(other.clone()),
    }
}

/// Holds the current [`DrawState`] and feeds it through [`transition`].
#[derive(Debug, Clone, Default)]
pub struct DrawingStateMachine {
    state: DrawState,
}

impl DrawingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    /// Process one intent and return the effect to apply, if any.
    pub fn handle(&mut self, intent: &Intent, ctx: &DrawContext<'_>) -> Option<Effect> {
        let Transition { state, effect } = transition(&self.state, intent, ctx);
        self.state = state;
        effect
    }

    /// Force a state, e.g. when the coordinator refused an effect.
    pub fn set_state(&mut self, state: DrawState) {
        self.state = state;
    }

    /// Drop any gesture in progress without committing it.
    pub fn abort(&mut self) {
        if matches!(self.state, DrawState::DrawingShape { .. } | DrawState::Panning { .. }) {
            log::debug!("Aborting gesture");
            self.state = DrawState::Idle;
        }
    }

    /// Check if a shape is being drawn.
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::DrawingShape { .. })
    }

    /// The shape being drawn, for rendering on top of committed shapes.
    pub fn transient_shape(&self) -> Option<&Shape> {
        match &self.state {
            DrawState::DrawingShape { transient, .. } => Some(transient),
            _ => None,
        }
    }
}
