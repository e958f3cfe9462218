use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest color index accepted anywhere in the editor
pub const MAX_COLOR: u8 = 9;

/// Largest width or height of an image
pub const MAX_SIZE: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("Image is not rectangular: min_length={min}, max_length={max}")]
    NotRectangular { min: usize, max: usize },

    #[error("Image size must be between 1x1 and 255x255: width={width}, height={height}")]
    InvalidSize { width: usize, height: usize },

    #[error("Invalid color: {0}")]
    InvalidColor(u8),

    #[error("Invalid coordinates: ({x}, {y})")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Invalid region: x={x}, y={y}, width={width}, height={height}")]
    InvalidRegion { x: i32, y: i32, width: i32, height: i32 },
}

pub fn check_color(color: u8) -> Result<(), ImageError> {
    if color > MAX_COLOR {
        return Err(ImageError::InvalidColor(color));
    }
    Ok(())
}

/// Rectangular matrix of color indices.
///
/// All transforms return a new image. `set_pixel` and `flood_fill` mutate in
/// place and are only ever called on a scratch clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Vec<u8>>,
}

impl TryFrom<Vec<Vec<u8>>> for Image {
    type Error = ImageError;

    fn try_from(pixels: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Image::new(pixels)
    }
}

impl From<Image> for Vec<Vec<u8>> {
    fn from(image: Image) -> Self {
        image.pixels
    }
}

impl Image {
    pub fn new(pixels: Vec<Vec<u8>>) -> Result<Self, ImageError> {
        let min = pixels.iter().map(|r| r.len()).min().unwrap_or(0);
        let max = pixels.iter().map(|r| r.len()).max().unwrap_or(0);
        if min != max {
            return Err(ImageError::NotRectangular { min, max });
        }
        check_size(max, pixels.len())?;
        for row in &pixels {
            for &color in row {
                check_color(color)?;
            }
        }
        Ok(Self {
            width: max,
            height: pixels.len(),
            pixels,
        })
    }

    /// Image filled with a single color
    pub fn color(width: usize, height: usize, color: u8) -> Result<Self, ImageError> {
        check_size(width, height)?;
        check_color(color)?;
        Ok(Self {
            width,
            height,
            pixels: vec![vec![color; width]; height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Vec<u8>] {
        &self.pixels
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if !self.contains(x, y) {
            return None;
        }
        Some(self.pixels[y as usize][x as usize])
    }

    /// Change the color of a single pixel
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u8) -> Result<(), ImageError> {
        check_color(color)?;
        if !self.contains(x, y) {
            return Err(ImageError::OutOfBounds { x, y });
        }
        self.pixels[y as usize][x as usize] = color;
        Ok(())
    }

    /// Extract a sub-image
    pub fn crop(&self, x: i32, y: i32, width: i32, height: i32) -> Result<Image, ImageError> {
        self.check_region(x, y, width, height)?;
        let (x, y, width, height) = (x as usize, y as usize, width as usize, height as usize);
        let pixels = self.pixels[y..y + height]
            .iter()
            .map(|row| row[x..x + width].to_vec())
            .collect();
        Ok(Image {
            width,
            height,
            pixels,
        })
    }

    /// Reverse horizontally
    pub fn flip_x(&self) -> Image {
        let pixels = self
            .pixels
            .iter()
            .map(|row| row.iter().rev().copied().collect())
            .collect();
        Image {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// Reverse vertically
    pub fn flip_y(&self) -> Image {
        let pixels = self.pixels.iter().rev().cloned().collect();
        Image {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    pub fn rotate_cw(&self) -> Image {
        let pixels = (0..self.width)
            .map(|x| (0..self.height).rev().map(|y| self.pixels[y][x]).collect())
            .collect();
        Image {
            width: self.height,
            height: self.width,
            pixels,
        }
    }

    pub fn rotate_ccw(&self) -> Image {
        let pixels = (0..self.width)
            .rev()
            .map(|x| (0..self.height).map(|y| self.pixels[y][x]).collect())
            .collect();
        Image {
            width: self.height,
            height: self.width,
            pixels,
        }
    }

    /// Copy `other` on top of a clone of this image at offset (x, y).
    /// Whatever falls outside this image is clipped.
    pub fn overlay(&self, other: &Image, x: i32, y: i32) -> Image {
        let mut result = self.clone();
        for (i, row) in other.pixels.iter().enumerate() {
            let yi = y + i as i32;
            for (j, &color) in row.iter().enumerate() {
                let xj = x + j as i32;
                if result.contains(xj, yi) {
                    result.pixels[yi as usize][xj as usize] = color;
                }
            }
        }
        result
    }

    /// 4-connected flood fill from a seed. An out-of-bounds seed does nothing.
    pub fn flood_fill(&mut self, x: i32, y: i32, color: u8) -> Result<(), ImageError> {
        check_color(color)?;
        let Some(source) = self.get(x, y) else {
            return Ok(());
        };
        if source == color {
            return Ok(());
        }

        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            if self.get(cx, cy) != Some(source) {
                continue;
            }
            self.pixels[cy as usize][cx as usize] = color;
            stack.push((cx - 1, cy));
            stack.push((cx + 1, cy));
            stack.push((cx, cy - 1));
            stack.push((cx, cy + 1));
        }
        Ok(())
    }

    /// Shift the region one cell left, the leftmost column wraps to the right edge
    pub fn move_left(&self, x: i32, y: i32, width: i32, height: i32) -> Result<Image, ImageError> {
        self.wrap_shift(x, y, width, height, -1, 0)
    }

    pub fn move_right(&self, x: i32, y: i32, width: i32, height: i32) -> Result<Image, ImageError> {
        self.wrap_shift(x, y, width, height, 1, 0)
    }

    pub fn move_up(&self, x: i32, y: i32, width: i32, height: i32) -> Result<Image, ImageError> {
        self.wrap_shift(x, y, width, height, 0, -1)
    }

    pub fn move_down(&self, x: i32, y: i32, width: i32, height: i32) -> Result<Image, ImageError> {
        self.wrap_shift(x, y, width, height, 0, 1)
    }

    /// New canvas of the given size filled with `fill`, existing content kept at the top-left
    pub fn resize(&self, width: usize, height: usize, fill: u8) -> Result<Image, ImageError> {
        Ok(Image::color(width, height, fill)?.overlay(self, 0, 0))
    }

    /// Pixel matrix as a JSON value, the representation used in log contexts
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.pixels.clone())
    }

    fn wrap_shift(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        dx: i32,
        dy: i32,
    ) -> Result<Image, ImageError> {
        self.check_region(x, y, width, height)?;
        if (dx != 0 && width < 2) || (dy != 0 && height < 2) {
            return Ok(self.clone());
        }

        let mut result = self.clone();
        for j in 0..height {
            for i in 0..width {
                let di = (i + dx).rem_euclid(width);
                let dj = (j + dy).rem_euclid(height);
                result.pixels[(y + dj) as usize][(x + di) as usize] =
                    self.pixels[(y + j) as usize][(x + i) as usize];
            }
        }
        Ok(result)
    }

    fn check_region(&self, x: i32, y: i32, width: i32, height: i32) -> Result<(), ImageError> {
        let inside = width >= 1
            && height >= 1
            && x >= 0
            && y >= 0
            && (x + width) as usize <= self.width
            && (y + height) as usize <= self.height;
        if !inside {
            return Err(ImageError::InvalidRegion {
                x,
                y,
                width,
                height,
            });
        }
        Ok(())
    }
}

fn check_size(width: usize, height: usize) -> Result<(), ImageError> {
    if width < 1 || height < 1 || width > MAX_SIZE || height > MAX_SIZE {
        return Err(ImageError::InvalidSize { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod test;
