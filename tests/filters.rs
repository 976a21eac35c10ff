mod common;

use common::synthetic_image::{checkerboard_rgba, contrast_patches_rgba, noise_rgba, solid_rgba};
use stag_vision::filters::grayscale::{to_gray, to_rgba};
use stag_vision::filters::kernel::{box_kernel, gaussian_kernel_2d, gaussian_vector};
use stag_vision::{box_blur, canny_edges, convolve, gaussian_blur, sobel_edges, FilterError, Kernel};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(filter: &stag_vision::FilterFn, src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    filter(src, &mut dst, width, height).expect("filter runs on valid buffers");
    dst
}

#[test]
fn identity_kernel_returns_input() {
    init_logger();
    let (width, height) = (23, 17);
    let src = noise_rgba(width, height, 11);
    let mut dst = vec![0u8; src.len()];
    convolve(&Kernel::identity(), &src, &mut dst, width, height).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn normalized_kernels_keep_constant_images() {
    init_logger();
    let (width, height) = (9, 7);
    let src = solid_rgba(width, height, [37, 142, 201, 255]);

    for kernel in [box_kernel(3.0).unwrap(), gaussian_kernel_2d(2.5).unwrap()] {
        let mut dst = vec![0u8; src.len()];
        convolve(&kernel, &src, &mut dst, width, height).unwrap();
        assert_eq!(dst, src, "{}x{} kernel", kernel.width(), kernel.height());
    }

    for filter in [box_blur(4.0).unwrap(), gaussian_blur(3.0).unwrap()] {
        assert_eq!(run(&filter, &src, width, height), src);
    }
}

#[test]
fn gaussian_vectors_are_normalized() {
    for radius in [0.5f32, 1.0, 2.0, 3.3, 7.0, 15.0] {
        let sum: f32 = gaussian_vector(radius).unwrap().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "radius {radius}: sum {sum}");
    }
}

#[test]
fn separable_gaussian_matches_full_2d() {
    init_logger();
    let (width, height) = (31, 24);
    let src = checkerboard_rgba(width, height, 3);

    for radius in [1.0f32, 2.5, 4.0] {
        let mut full = vec![0u8; src.len()];
        convolve(&gaussian_kernel_2d(radius).unwrap(), &src, &mut full, width, height).unwrap();
        let separable = run(&gaussian_blur(radius).unwrap(), &src, width, height);

        for (i, (&a, &b)) in full.iter().zip(separable.iter()).enumerate() {
            assert!(
                (a as i16 - b as i16).abs() <= 1,
                "radius {radius} byte {i}: 2D {a} vs separable {b}"
            );
        }
    }
}

#[test]
fn box_blur_radius_zero_is_identity() {
    let (width, height) = (8, 5);
    let src = noise_rgba(width, height, 3);
    assert_eq!(run(&box_blur(0.0).unwrap(), &src, width, height), src);
}

#[test]
fn sobel_on_uniform_gray_is_zero() {
    let (width, height) = (16, 12);
    let src = solid_rgba(width, height, [128, 128, 128, 255]);
    let out = run(&sobel_edges(2.0).unwrap(), &src, width, height);
    assert!(out.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn gray_round_trip_keeps_neutral_pixels() {
    let values: Vec<u8> = (0..=255u8).collect();
    let src: Vec<u8> = values.iter().flat_map(|&v| [v, v, v, 17]).collect();
    let gray = to_gray(&src, 256, 1).unwrap();
    let back = to_rgba(&gray, 256, 1).unwrap();

    for (px, &v) in back.chunks_exact(4).zip(values.iter()) {
        for &c in &px[..3] {
            assert!((c as i16 - v as i16).abs() <= 1, "value {v} came back as {c}");
        }
        assert_eq!(px[3], 255);
    }
}

#[test]
fn canny_edges_shrink_as_high_ratio_grows() {
    init_logger();
    let (width, height) = (64, 32);
    let src = contrast_patches_rgba(width, height);

    let mut previous: Option<Vec<u8>> = None;
    for high in [0.1f32, 0.2, 0.3, 0.4, 0.5] {
        let out = run(&canny_edges(1.5, 0.05, high).unwrap(), &src, width, height);
        if let Some(prev) = &previous {
            for (i, (a, b)) in out.chunks_exact(4).zip(prev.chunks_exact(4)).enumerate() {
                assert!(a[0] <= b[0], "pixel {i} became an edge when high rose to {high}");
            }
        }
        previous = Some(out);
    }
}

#[test]
fn canny_finds_patch_outlines() {
    let (width, height) = (64, 32);
    let src = contrast_patches_rgba(width, height);
    let out = run(&canny_edges(1.5, 0.075, 0.175).unwrap(), &src, width, height);

    let edges = out.chunks_exact(4).filter(|px| px[0] == 255).count();
    assert!(edges > 0);
    // Every output pixel is either pure background or pure edge
    assert!(out
        .chunks_exact(4)
        .all(|px| (px == [0, 0, 0, 255]) || (px == [255, 255, 255, 255])));
}

#[test]
fn canny_on_flat_image_is_empty() {
    let (width, height) = (20, 20);
    let src = solid_rgba(width, height, [90, 10, 200, 255]);
    let out = run(&canny_edges(2.0, 0.1, 0.2).unwrap(), &src, width, height);
    assert!(out.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn invalid_parameters_are_rejected() {
    assert!(matches!(gaussian_blur(0.0), Err(FilterError::InvalidParameter(_))));
    assert!(matches!(box_blur(-1.0), Err(FilterError::InvalidParameter(_))));
    assert!(matches!(sobel_edges(f32::NAN), Err(FilterError::InvalidParameter(_))));
    assert!(matches!(canny_edges(2.0, 0.3, 0.2), Err(FilterError::InvalidParameter(_))));
    assert!(matches!(canny_edges(2.0, 0.1, 0.6), Err(FilterError::InvalidParameter(_))));
}

#[test]
fn size_mismatch_leaves_destination_untouched() {
    let src = vec![10u8; 4 * 4 * 4];
    let mut dst = vec![7u8; 4 * 4 * 4 - 1];
    let err = convolve(&Kernel::identity(), &src, &mut dst, 4, 4).unwrap_err();
    assert_eq!(err, FilterError::BufferSizeMismatch { expected: 64, actual: 63 });
    assert!(dst.iter().all(|&v| v == 7));

    let filter = gaussian_blur(1.0).unwrap();
    let mut dst = vec![7u8; 60];
    assert!(filter(&src, &mut dst, 4, 4).is_err());
    assert!(dst.iter().all(|&v| v == 7));
}
