/**
 * Viewport and Minimap Coordinate Mapping
 *
 * Pure geometry for the canvas presentation layer: pan/zoom transforms
 * between world space and screen space, and the projection that fits a
 * board's world-space bounding box into the minimap rectangle.
 *
 * Convention: `screen = (world - pan) * zoom`. World coordinates are
 * unbounded and may be negative; screen coordinates are pixels with the
 * origin at the top-left of the canvas.
 */

/// Zoom bounds for the canvas
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 4.0;

/// Axis-aligned rectangle in either coordinate space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether a point lies inside (inclusive of edges)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x <= x && x <= self.x + self.width && self.y <= y && y <= self.y + self.height
    }
}

/// Pan/zoom state of the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// World x at the left edge of the screen
    pub pan_x: f64,
    /// World y at the top edge of the screen
    pub pan_y: f64,
    /// Scale factor from world units to pixels
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport at the origin with no zoom
    pub fn new() -> Self {
        Self::default()
    }

    /// World point to screen pixels
    pub fn world_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pan_x) * self.zoom, (y - self.pan_y) * self.zoom)
    }

    /// Screen pixels to world point
    pub fn screen_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.zoom + self.pan_x, y / self.zoom + self.pan_y)
    }

    /// Pan by a screen-space delta (drag of the canvas background)
    pub fn pan_by_screen(&mut self, dx: f64, dy: f64) {
        self.pan_x -= dx / self.zoom;
        self.pan_y -= dy / self.zoom;
    }

    /// Set the zoom level, clamped to the allowed range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom by a factor around a screen-space anchor point
    ///
    /// The world point under the anchor stays under the anchor, which is
    /// what makes wheel-zoom feel stationary under the cursor.
    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, factor: f64) {
        let (anchor_x, anchor_y) = self.screen_to_world(screen_x, screen_y);
        self.set_zoom(self.zoom * factor);
        self.pan_x = anchor_x - screen_x / self.zoom;
        self.pan_y = anchor_y - screen_y / self.zoom;
    }

    /// The world-space rectangle currently visible on a canvas of the
    /// given pixel size
    pub fn visible_world_rect(&self, screen_width: f64, screen_height: f64) -> Rect {
        Rect::new(
            self.pan_x,
            self.pan_y,
            screen_width / self.zoom,
            screen_height / self.zoom,
        )
    }
}

/// Projection of world space into the minimap rectangle
///
/// Uniform scale chosen so the whole world bounding box fits, centered
/// on whichever axis has slack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapProjection {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl MinimapProjection {
    /// Fit a world bounding box into a minimap of the given pixel size
    pub fn fit(world: Rect, map_width: f64, map_height: f64) -> Self {
        let scale_x = if world.width > 0.0 {
            map_width / world.width
        } else {
            1.0
        };
        let scale_y = if world.height > 0.0 {
            map_height / world.height
        } else {
            1.0
        };
        let scale = scale_x.min(scale_y);
        let offset_x = (map_width - world.width * scale) / 2.0 - world.x * scale;
        let offset_y = (map_height - world.height * scale) / 2.0 - world.y * scale;
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// World point to minimap pixels
    pub fn project_point(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    /// World rectangle to minimap pixels (note, section, or the visible
    /// viewport indicator)
    pub fn project_rect(&self, rect: Rect) -> Rect {
        let (x, y) = self.project_point(rect.x, rect.y);
        Rect::new(x, y, rect.width * self.scale, rect.height * self.scale)
    }
}
