// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene configuration.

use kurbo::Size;

use crate::node::ContentDirection;

/// Configuration for a [`Scene`](crate::scene::Scene).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    /// Initial display size.
    pub display_size: Size,
    /// Content direction of the display.
    pub content_direction: ContentDirection,
    /// Whether the display mirrors its contents when right-to-left.
    pub mirror_when_right_to_left: bool,
    /// Layout iterations allowed in one flush before the flush panics.
    ///
    /// Each iteration applies every pending layout once, ancestor first. A
    /// layout that keeps re-queueing itself exhausts this budget.
    pub max_layout_passes: u32,
    /// Size difference below which a container resized during its own layout
    /// is not laid out again synchronously.
    pub layout_epsilon: f64,
}

impl RenderConfig {
    /// Left-to-right display with no size, 64 layout passes, `1e-8` epsilon.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            display_size: Size::ZERO,
            content_direction: ContentDirection::LeftToRight,
            mirror_when_right_to_left: true,
            max_layout_passes: 64,
            layout_epsilon: 1e-8,
        }
    }

    /// Sets the initial display size.
    #[must_use]
    pub const fn with_display_size(mut self, size: Size) -> Self {
        self.display_size = size;
        self
    }

    /// Sets the display's content direction.
    #[must_use]
    pub const fn with_content_direction(mut self, direction: ContentDirection) -> Self {
        self.content_direction = direction;
        self
    }

    /// Sets whether the display mirrors when right-to-left.
    #[must_use]
    pub const fn with_mirror_when_right_to_left(mut self, mirror: bool) -> Self {
        self.mirror_when_right_to_left = mirror;
        self
    }

    /// Sets the layout pass budget.
    #[must_use]
    pub const fn with_max_layout_passes(mut self, passes: u32) -> Self {
        self.max_layout_passes = passes;
        self
    }

    /// Sets the synchronous relayout epsilon.
    #[must_use]
    pub const fn with_layout_epsilon(mut self, epsilon: f64) -> Self {
        self.layout_epsilon = epsilon;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        const CONFIG: RenderConfig = RenderConfig::new()
            .with_display_size(Size::new(640.0, 480.0))
            .with_content_direction(ContentDirection::RightToLeft)
            .with_max_layout_passes(4);
        assert_eq!(CONFIG.display_size, Size::new(640.0, 480.0));
        assert_eq!(CONFIG.content_direction, ContentDirection::RightToLeft);
        assert_eq!(CONFIG.max_layout_passes, 4);
        assert!(CONFIG.mirror_when_right_to_left);
        assert_eq!(CONFIG.layout_epsilon, 1e-8);
    }
}
