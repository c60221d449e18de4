// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Left-to-right flow with wrapping.

use alloc::vec::Vec;

use kurbo::{Insets, Point, Size};

use super::{Layout, LayoutChild};

/// Horizontal placement of each row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Justification {
    /// Rows start at the left inset.
    #[default]
    Left,
    /// Rows are centered in the area between the insets.
    Center,
    /// Rows end at the right inset.
    Right,
}

/// Vertical placement of a child within its row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    /// Aligned with the row's top.
    #[default]
    Top,
    /// Centered on the row's midline.
    Middle,
    /// Aligned with the row's bottom.
    Bottom,
}

/// Places visible children left to right, wrapping onto a new row when the
/// next child would cross the right inset.
///
/// Children keep their current size. The container is never resized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HorizontalFlowLayout {
    /// Gap between neighbors and between rows.
    pub spacing: f64,
    /// Row placement.
    pub justification: Justification,
    /// In-row placement.
    pub vertical_alignment: VerticalAlignment,
}

impl Default for HorizontalFlowLayout {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl HorizontalFlowLayout {
    /// Left-justified, top-aligned flow with the given spacing.
    #[must_use]
    pub const fn new(spacing: f64) -> Self {
        Self {
            spacing,
            justification: Justification::Left,
            vertical_alignment: VerticalAlignment::Top,
        }
    }

    /// Sets the row justification.
    #[must_use]
    pub const fn with_justification(mut self, justification: Justification) -> Self {
        self.justification = justification;
        self
    }

    /// Sets the in-row alignment.
    #[must_use]
    pub const fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    fn place_row(&self, row: &mut [&mut LayoutChild], y: f64, available: f64, insets: Insets) -> f64 {
        let width: f64 = row.iter().map(|c| c.size().width).sum::<f64>()
            + self.spacing * row.len().saturating_sub(1) as f64;
        let height = row.iter().map(|c| c.size().height).fold(0.0, f64::max);
        let mut x = match self.justification {
            Justification::Left => insets.x0,
            Justification::Center => insets.x0 + (available - width) / 2.0,
            Justification::Right => insets.x0 + available - width,
        };
        for child in row.iter_mut() {
            let size = child.size();
            let offset = match self.vertical_alignment {
                VerticalAlignment::Top => 0.0,
                VerticalAlignment::Middle => (height - size.height) / 2.0,
                VerticalAlignment::Bottom => height - size.height,
            };
            child.set_position(Point::new(x, y + offset));
            x += size.width + self.spacing;
        }
        height
    }
}

impl Layout for HorizontalFlowLayout {
    fn layout(
        &self,
        children: &mut [LayoutChild],
        _min: Size,
        current: Size,
        _max: Size,
        insets: Insets,
    ) -> Size {
        let available = current.width - insets.x0 - insets.x1;
        let mut y = insets.y0;
        let mut row: Vec<&mut LayoutChild> = Vec::new();
        let mut row_width = 0.0;

        for child in children.iter_mut().filter(|c| c.visible()) {
            let w = child.size().width;
            let needed = if row.is_empty() { w } else { row_width + self.spacing + w };
            if !row.is_empty() && needed > available {
                let height = self.place_row(&mut row, y, available, insets);
                y += height + self.spacing;
                row.clear();
                row_width = w;
            } else {
                row_width = needed;
            }
            row.push(child);
        }
        if !row.is_empty() {
            self.place_row(&mut row, y, available, insets);
        }
        current
    }

    fn ideal_size(&self, children: &[LayoutChild], default: Option<Size>) -> Option<Size> {
        let visible = children.iter().filter(|c| c.visible());
        let (count, width, height) = visible.fold((0_usize, 0.0, 0.0_f64), |(n, w, h), c| {
            let s = c.ideal_size().unwrap_or_else(|| c.size());
            (n + 1, w + s.width, h.max(s.height))
        });
        if count == 0 {
            return default;
        }
        Some(Size::new(
            width + self.spacing * (count - 1) as f64,
            height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SizePreferences;
    use crate::node::NodeId;
    use alloc::vec;
    use kurbo::Rect;

    fn children(sizes: &[(f64, f64)]) -> Vec<LayoutChild> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, (w, h))| {
                LayoutChild::new(
                    NodeId {
                        idx: i as u32,
                        generation: 0,
                    },
                    Rect::new(0.0, 0.0, *w, *h),
                    true,
                    0,
                    SizePreferences::default(),
                )
            })
            .collect()
    }

    fn run(layout: HorizontalFlowLayout, kids: &mut [LayoutChild], width: f64, insets: Insets) {
        let current = Size::new(width, 100.0);
        let max = Size::new(f64::INFINITY, f64::INFINITY);
        let result = layout.layout(kids, Size::ZERO, current, max, insets);
        assert_eq!(result, current);
    }

    #[test]
    fn left_with_spacing() {
        let mut kids = children(&[(10.0, 5.0), (20.0, 5.0), (30.0, 5.0)]);
        run(HorizontalFlowLayout::new(10.0), &mut kids, 200.0, Insets::new(2.0, 3.0, 0.0, 0.0));
        let xs: Vec<f64> = kids.iter().map(|c| c.position().x).collect();
        assert_eq!(xs, vec![2.0, 22.0, 52.0]);
        assert!(kids.iter().all(|c| c.position().y == 3.0));
    }

    #[test]
    fn center_and_right_justification() {
        let mut kids = children(&[(10.0, 5.0), (30.0, 5.0)]);
        run(
            HorizontalFlowLayout::new(0.0).with_justification(Justification::Center),
            &mut kids,
            100.0,
            Insets::ZERO,
        );
        assert_eq!(kids[0].position().x, 30.0);
        assert_eq!(kids[1].position().x, 40.0);

        run(
            HorizontalFlowLayout::new(0.0).with_justification(Justification::Right),
            &mut kids,
            100.0,
            Insets::new(0.0, 0.0, 10.0, 0.0),
        );
        assert_eq!(kids[0].position().x, 50.0);
        assert_eq!(kids[1].position().x, 60.0);
    }

    #[test]
    fn middle_and_bottom_alignment() {
        let mut kids = children(&[(10.0, 10.0), (10.0, 30.0)]);
        run(
            HorizontalFlowLayout::new(0.0).with_vertical_alignment(VerticalAlignment::Middle),
            &mut kids,
            100.0,
            Insets::ZERO,
        );
        assert_eq!(kids[0].position().y, 10.0);
        assert_eq!(kids[1].position().y, 0.0);

        run(
            HorizontalFlowLayout::new(0.0).with_vertical_alignment(VerticalAlignment::Bottom),
            &mut kids,
            100.0,
            Insets::ZERO,
        );
        assert_eq!(kids[0].position().y, 20.0);
    }

    #[test]
    fn wraps_onto_next_row() {
        let mut kids = children(&[(40.0, 10.0), (40.0, 20.0), (40.0, 10.0)]);
        run(HorizontalFlowLayout::new(5.0), &mut kids, 90.0, Insets::ZERO);
        assert_eq!(kids[0].position(), Point::new(0.0, 0.0));
        assert_eq!(kids[1].position(), Point::new(45.0, 0.0));
        // Row height is 20, plus spacing.
        assert_eq!(kids[2].position(), Point::new(0.0, 25.0));
    }

    #[test]
    fn ideal_size_sums_widths() {
        let kids = children(&[(10.0, 10.0), (20.0, 30.0)]);
        let ideal = HorizontalFlowLayout::new(4.0).ideal_size(&kids, None);
        assert_eq!(ideal, Some(Size::new(34.0, 30.0)));
        assert_eq!(HorizontalFlowLayout::new(4.0).ideal_size(&[], None), None);
    }
}
