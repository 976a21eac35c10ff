/// Generates a high-contrast opaque RGBA checkerboard.
pub fn checkerboard_rgba(width: usize, height: usize, cell: usize) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = vec![0u8; width * height * 4];
    for y in 0..height {
        for x in 0..width {
            let val = if ((x / cell) + (y / cell)) & 1 == 0 { 32u8 } else { 220u8 };
            let idx = (y * width + x) * 4;
            img[idx..idx + 4].copy_from_slice(&[val, val, val, 255]);
        }
    }
    img
}

/// Pseudo-random opaque RGBA noise from a fixed seed.
pub fn noise_rgba(width: usize, height: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    let mut img = vec![255u8; width * height * 4];
    for px in img.chunks_exact_mut(4) {
        for c in px.iter_mut().take(3) {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *c = (state >> 24) as u8;
        }
    }
    img
}

pub fn solid_rgba(width: usize, height: usize, px: [u8; 4]) -> Vec<u8> {
    px.repeat(width * height)
}

/// Fills the `w x h` rectangle at `(x0, y0)` with `px`.
pub fn fill_rect(
    img: &mut [u8],
    width: usize,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    px: [u8; 4],
) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let idx = (y * width + x) * 4;
            img[idx..idx + 4].copy_from_slice(&px);
        }
    }
}

/// Gray rectangles of varying contrast on a dark background.
pub fn contrast_patches_rgba(width: usize, height: usize) -> Vec<u8> {
    let mut img = solid_rgba(width, height, [20, 20, 20, 255]);
    let levels = [60u8, 120, 180, 250];
    let patch = width / (levels.len() * 2);
    for (i, &v) in levels.iter().enumerate() {
        let x0 = patch / 2 + i * patch * 2;
        fill_rect(&mut img, width, x0, height / 4, patch, height / 2, [v, v, v, 255]);
    }
    img
}
