//! Temporal smoothing over recent classifications.

use std::collections::VecDeque;

use crate::classify::MouthShape;

/// Bounded FIFO of the most recent classification results.
///
/// Pushing past capacity evicts the oldest entry, so the window length
/// never exceeds the configured size.
#[derive(Debug, Clone)]
pub struct ShapeHistory {
    window: usize,
    shapes: VecDeque<MouthShape>,
}

impl ShapeHistory {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            shapes: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, shape: MouthShape) {
        if self.shapes.len() == self.window {
            self.shapes.pop_front();
        }
        self.shapes.push_back(shape);
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = MouthShape> + '_ {
        self.shapes.iter().copied()
    }
}

/// Mode over the window; ties go to the most recently observed shape
/// among the tied candidates. Empty history reads as `Closed`.
///
/// Pure function of the window contents.
pub fn smooth(history: &ShapeHistory) -> MouthShape {
    let mut counts = [0usize; MouthShape::COUNT];
    for shape in history.iter() {
        counts[shape.index()] += 1;
    }
    let max = match counts.iter().copied().max() {
        Some(max) if max > 0 => max,
        _ => return MouthShape::Closed,
    };
    history
        .iter()
        .rev()
        .find(|shape| counts[shape.index()] == max)
        .unwrap_or(MouthShape::Closed)
}
