use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `tiles x tiles` grid (fewer when the image is
/// smaller than the grid). Each tile gets a clipped-histogram equalization
/// table and every pixel is mapped by bilinear interpolation between the
/// tables of the four nearest tile centres.
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, (x0, y0, x1, y1), clip_limit));
        }
    }

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let value = image.get_pixel(x, y)[0] as usize;

        let (cx0, cx1, ax) = neighbours(x, tile_w, tiles_x);
        let (cy0, cy1, ay) = neighbours(y, tile_h, tiles_y);

        let at = |cx: u32, cy: u32| f32::from(luts[(cy * tiles_x + cx) as usize][value]);
        let top = at(cx0, cy0) * (1.0 - ax) + at(cx1, cy0) * ax;
        let bottom = at(cx0, cy1) * (1.0 - ax) + at(cx1, cy1) * ax;
        let mapped = top * (1.0 - ay) + bottom * ay;

        *pixel = Luma([mapped.round().clamp(0.0, 255.0) as u8]);
    }
    out
}

/// Indices of the two tile centres surrounding `pos` and the weight of the second
fn neighbours(pos: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    let base = f.floor();
    let weight = f - base;
    let last = i64::from(count) - 1;
    let lo = (base as i64).clamp(0, last) as u32;
    let hi = (base as i64 + 1).clamp(0, last) as u32;
    (lo, hi, weight)
}

fn tile_lut(image: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let area = (x1 - x0) * (y1 - y0);

    let clip = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }

    // Spread the clipped mass evenly, then the remainder at a fixed stride.
    let share = excess / BINS as u32;
    let mut residual = excess % BINS as u32;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    if residual > 0 {
        let step = (BINS as u32 / residual).max(1) as usize;
        for bin in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *entry = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}
