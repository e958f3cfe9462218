use super::*;

fn img(rows: &[&[u8]]) -> Image {
    Image::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
}

fn sample() -> Image {
    img(&[&[1, 2, 3], &[4, 5, 6]])
}

#[test]
fn new_rejects_ragged_rows() {
    let err = Image::new(vec![vec![1, 2], vec![3]]).unwrap_err();
    assert_eq!(err, ImageError::NotRectangular { min: 1, max: 2 });
}

#[test]
fn new_rejects_empty_and_oversized() {
    assert!(matches!(Image::new(vec![]), Err(ImageError::InvalidSize { .. })));
    assert!(matches!(Image::new(vec![vec![]]), Err(ImageError::InvalidSize { .. })));
    assert!(matches!(
        Image::color(256, 1, 0),
        Err(ImageError::InvalidSize { width: 256, height: 1 })
    ));
}

#[test]
fn construction_and_set_pixel_share_color_bound() {
    assert_eq!(Image::new(vec![vec![10]]), Err(ImageError::InvalidColor(10)));
    let mut image = Image::color(2, 2, 0).unwrap();
    assert_eq!(image.set_pixel(0, 0, 11), Err(ImageError::InvalidColor(11)));
    assert_eq!(image, Image::color(2, 2, 0).unwrap());
}

#[test]
fn set_pixel_on_black_grid() {
    let mut image = Image::color(3, 3, 0).unwrap();
    image.set_pixel(1, 1, 2).unwrap();
    assert_eq!(image, img(&[&[0, 0, 0], &[0, 2, 0], &[0, 0, 0]]));
}

#[test]
fn set_pixel_out_of_bounds() {
    let mut image = Image::color(3, 3, 0).unwrap();
    assert_eq!(image.set_pixel(3, 0, 1), Err(ImageError::OutOfBounds { x: 3, y: 0 }));
    assert_eq!(image.set_pixel(0, -1, 1), Err(ImageError::OutOfBounds { x: 0, y: -1 }));
}

#[test]
fn crop_top_left_quadrant() {
    let image = img(&[&[1, 2, 3], &[4, 5, 6], &[7, 8, 9]]);
    assert_eq!(image.crop(0, 0, 2, 2).unwrap(), img(&[&[1, 2], &[4, 5]]));
    assert_eq!(image.crop(1, 1, 2, 2).unwrap(), img(&[&[5, 6], &[8, 9]]));
}

#[test]
fn crop_invalid_regions() {
    let image = Image::color(3, 3, 0).unwrap();
    assert!(matches!(image.crop(0, 0, 4, 1), Err(ImageError::InvalidRegion { .. })));
    assert!(matches!(image.crop(0, 0, 0, 1), Err(ImageError::InvalidRegion { .. })));
    assert!(matches!(image.crop(-1, 0, 1, 1), Err(ImageError::InvalidRegion { .. })));
    assert!(matches!(image.crop(2, 2, 2, 1), Err(ImageError::InvalidRegion { .. })));
}

#[test]
fn flips() {
    assert_eq!(sample().flip_x(), img(&[&[3, 2, 1], &[6, 5, 4]]));
    assert_eq!(sample().flip_y(), img(&[&[4, 5, 6], &[1, 2, 3]]));
    assert_eq!(sample().flip_x().flip_x(), sample());
    assert_eq!(sample().flip_y().flip_y(), sample());
}

#[test]
fn rotations() {
    assert_eq!(sample().rotate_cw(), img(&[&[4, 1], &[5, 2], &[6, 3]]));
    assert_eq!(sample().rotate_ccw(), img(&[&[3, 6], &[2, 5], &[1, 4]]));

    let four = sample().rotate_cw().rotate_cw().rotate_cw().rotate_cw();
    assert_eq!(four, sample());
    assert_eq!(sample().rotate_ccw(), sample().rotate_cw().rotate_cw().rotate_cw());
}

#[test]
fn overlay_clips_silently() {
    let base = Image::color(3, 3, 0).unwrap();
    let patch = Image::color(2, 2, 7).unwrap();

    let result = base.overlay(&patch, 2, 2);
    assert_eq!(result, img(&[&[0, 0, 0], &[0, 0, 0], &[0, 0, 7]]));

    let result = base.overlay(&patch, -1, -1);
    assert_eq!(result, img(&[&[7, 0, 0], &[0, 0, 0], &[0, 0, 0]]));

    assert_eq!(base.overlay(&patch, 5, -5), base);
}

#[test]
fn flood_fill_uniform_grid() {
    let mut image = Image::color(4, 4, 0).unwrap();
    image.flood_fill(2, 1, 5).unwrap();
    assert_eq!(image, Image::color(4, 4, 5).unwrap());
}

#[test]
fn flood_fill_same_color_and_outside_are_noops() {
    let mut image = sample();
    image.flood_fill(0, 0, 1).unwrap();
    assert_eq!(image, sample());
    image.flood_fill(-1, 0, 9).unwrap();
    image.flood_fill(3, 0, 9).unwrap();
    assert_eq!(image, sample());
}

#[test]
fn flood_fill_stays_four_connected() {
    let mut image = img(&[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]]);
    image.flood_fill(1, 1, 3).unwrap();
    assert_eq!(image, img(&[&[1, 0, 1], &[0, 3, 0], &[1, 0, 1]]));

    let mut image = img(&[&[0, 0, 1], &[1, 0, 1], &[0, 0, 1]]);
    image.flood_fill(0, 0, 2).unwrap();
    assert_eq!(image, img(&[&[2, 2, 1], &[1, 2, 1], &[2, 2, 1]]));
}

#[test]
fn flood_fill_large_grid_without_recursion() {
    let mut image = Image::color(255, 255, 0).unwrap();
    image.flood_fill(0, 0, 4).unwrap();
    assert_eq!(image, Image::color(255, 255, 4).unwrap());
}

#[test]
fn move_wraps_around() {
    let image = img(&[&[1, 2, 3], &[4, 5, 6]]);
    assert_eq!(image.move_left(0, 0, 3, 2).unwrap(), img(&[&[2, 3, 1], &[5, 6, 4]]));
    assert_eq!(image.move_right(0, 0, 3, 2).unwrap(), img(&[&[3, 1, 2], &[6, 4, 5]]));
    assert_eq!(image.move_up(0, 0, 3, 2).unwrap(), img(&[&[4, 5, 6], &[1, 2, 3]]));
    assert_eq!(image.move_down(0, 0, 3, 2).unwrap(), img(&[&[4, 5, 6], &[1, 2, 3]]));
}

#[test]
fn move_only_touches_region() {
    let image = img(&[&[1, 2, 3], &[4, 5, 6], &[7, 8, 9]]);
    let moved = image.move_right(1, 0, 2, 3).unwrap();
    assert_eq!(moved, img(&[&[1, 3, 2], &[4, 6, 5], &[7, 9, 8]]));
}

#[test]
fn move_is_invertible() {
    let image = img(&[&[1, 2, 3, 4], &[5, 6, 7, 8], &[9, 0, 1, 2]]);
    let there = image.move_left(1, 0, 3, 3).unwrap();
    assert_eq!(there.move_right(1, 0, 3, 3).unwrap(), image);
    let there = image.move_down(0, 1, 4, 2).unwrap();
    assert_eq!(there.move_up(0, 1, 4, 2).unwrap(), image);
}

#[test]
fn move_narrow_region_is_noop() {
    let image = sample();
    assert_eq!(image.move_left(1, 0, 1, 2).unwrap(), image);
    assert_eq!(image.move_up(0, 1, 3, 1).unwrap(), image);
    assert!(image.move_left(0, 0, 4, 2).is_err());
}

#[test]
fn resize_keeps_top_left_content() {
    let grown = sample().resize(4, 3, 9).unwrap();
    assert_eq!(grown, img(&[&[1, 2, 3, 9], &[4, 5, 6, 9], &[9, 9, 9, 9]]));
    let shrunk = sample().resize(1, 1, 0).unwrap();
    assert_eq!(shrunk, img(&[&[1]]));
}

#[test]
fn serializes_as_pixel_matrix() {
    let json = serde_json::to_string(&sample()).unwrap();
    assert_eq!(json, "[[1,2,3],[4,5,6]]");
    let back: Image = serde_json::from_str(&json).unwrap();
    assert_eq!(back, sample());
    assert!(serde_json::from_str::<Image>("[[1,2],[3]]").is_err());
}
