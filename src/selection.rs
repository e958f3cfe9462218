use serde::Serialize;

use crate::image::Image;

/// Cell rectangle, origin plus size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn full(image: &Image) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image.width() as i32,
            height: image.height() as i32,
        }
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// Normalized selection bounds, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
}

/// Selection made of two corners. Either corner may be the min or max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Selection {
    /// Selection covering the whole image
    pub fn full(image: &Image) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: image.width() - 1,
            y1: image.height() - 1,
        }
    }

    /// 1x1 selection
    pub fn point(x: usize, y: usize) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x0.min(self.x1),
            max_x: self.x0.max(self.x1),
            min_y: self.y0.min(self.y1),
            max_y: self.y0.max(self.y1),
        }
    }

    pub fn rect(&self) -> Rect {
        let b = self.bounds();
        Rect {
            x: b.min_x as i32,
            y: b.min_y as i32,
            width: (b.max_x - b.min_x + 1) as i32,
            height: (b.max_y - b.min_y + 1) as i32,
        }
    }

    pub fn fits(&self, image: &Image) -> bool {
        let b = self.bounds();
        b.max_x < image.width() && b.max_y < image.height()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        let b = self.bounds();
        (b.min_x..=b.max_x).contains(&x) && (b.min_y..=b.max_y).contains(&y)
    }
}

/// Clamp a cell coordinate into the image
pub fn clamp_cell(image: &Image, x: i32, y: i32) -> (usize, usize) {
    let cx = x.clamp(0, image.width() as i32 - 1) as usize;
    let cy = y.clamp(0, image.height() as i32 - 1) as usize;
    (cx, cy)
}
