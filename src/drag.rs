//! Pointer-drag reordering of the displayed rows.
//!
//! While a drag is in flight the controller keeps its own live order of the
//! visible ids; the store is only touched when the gesture is dropped.

use crate::model::TaskId;

/// Vertical extent of one displayed row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBox {
    pub id: TaskId,
    pub top: f64,
    pub height: f64,
}

impl RowBox {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Lay `ids` out as consecutive rows of equal height starting at `top`.
pub fn stacked_rows(ids: impl IntoIterator<Item = TaskId>, top: f64, height: f64) -> Vec<RowBox> {
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| RowBox {
            id,
            top: top + i as f64 * height,
            height,
        })
        .collect()
}

/// The row the dragged item should be placed before: the closest row, other
/// than `dragged`, whose midpoint lies strictly below `pointer_y`. `None`
/// means the pointer is below every row and the item goes to the end.
pub fn insertion_target(rows: &[RowBox], pointer_y: f64, dragged: TaskId) -> Option<TaskId> {
    rows.iter()
        .filter(|row| row.id != dragged)
        .map(|row| (pointer_y - row.midpoint(), row.id))
        .filter(|(offset, _)| *offset < 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        id: TaskId,
        order: Vec<TaskId>,
    },
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged(&self) -> Option<TaskId> {
        match &self.state {
            DragState::Dragging { id, .. } => Some(*id),
            DragState::Idle => None,
        }
    }

    /// The displayed order while dragging.
    pub fn live_order(&self) -> Option<&[TaskId]> {
        match &self.state {
            DragState::Dragging { order, .. } => Some(order),
            DragState::Idle => None,
        }
    }

    /// Begin dragging `id` over rows currently shown in `visible_order`.
    /// Returns false (and stays idle) if `id` isn't shown.
    pub fn start(&mut self, id: TaskId, visible_order: Vec<TaskId>) -> bool {
        if !visible_order.contains(&id) {
            return false;
        }
        tracing::debug!(%id, "drag start");
        self.state = DragState::Dragging {
            id,
            order: visible_order,
        };
        true
    }

    /// Move the dragged item to where the pointer is. `rows` describes the
    /// geometry of the other rows. Returns true if the live order changed.
    pub fn hover(&mut self, pointer_y: f64, rows: &[RowBox]) -> bool {
        let DragState::Dragging { id, order } = &mut self.state else {
            return false;
        };
        let target = insertion_target(rows, pointer_y, *id);
        let before = order.clone();
        order.retain(|o| o != id);
        match target.and_then(|t| order.iter().position(|o| *o == t)) {
            Some(pos) => order.insert(pos, *id),
            None => order.push(*id),
        }
        *order != before
    }

    /// Finish the gesture, yielding the visible order to commit.
    pub fn drop(&mut self) -> Option<Vec<TaskId>> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { id, order } => {
                tracing::debug!(%id, "drag drop");
                Some(order)
            }
            DragState::Idle => None,
        }
    }

    /// Abandon the gesture without committing anything.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            tracing::debug!("drag cancelled");
        }
        self.state = DragState::Idle;
    }
}
