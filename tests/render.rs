use qrstyle::builder::{Layout, Scene};
use qrstyle::color::{QrColor, QrColors, BLACK, TRANSPARENT, WHITE};
use qrstyle::drawable::QrDrawable;
use qrstyle::encoder::{encode, ErrorCorrectionLevel};
use qrstyle::image_source::ImageHandle;
use qrstyle::logo::{Logo, LogoPadding};
use qrstyle::matrix::PixelType;
use qrstyle::options::QrShapes;
use qrstyle::shapes::{PixelShape, RoundCorners};
use qrstyle::{CancellationToken, QrError, RenderOptions};

use image::Rgba;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn rgba(c: u32) -> Rgba<u8> {
    Rgba(qrstyle::color::to_rgba(c))
}

#[test]
fn test_render_is_deterministic() {
    let options = RenderOptions::new(300)
        .shapes(QrShapes::default().dark(PixelShape::Circle(0.8)))
        .code_shape(qrstyle::builder::CodeShape::circle());
    let a = qrstyle::render("determinism", &options).unwrap();
    let b = qrstyle::render("determinism", &options).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn test_module_centres_match_encoded_bits() {
    let options = RenderOptions::new(512).colors(QrColors::default().light(QrColor::Solid(TRANSPARENT)));
    let img = qrstyle::render("HELLO", &options).unwrap();
    let bits = encode("HELLO", ErrorCorrectionLevel::Medium).unwrap();
    let layout = Layout::new(512, 0.1, (0.0, 0.0), bits.size()).unwrap();
    let half = layout.module_px as i64 / 2;

    for row in 0..bits.size() {
        for col in 0..bits.size() {
            let (x, y) = layout.module_origin(row, col);
            let pixel = img.get_pixel((x + half) as u32, (y + half) as u32);
            let expected = if bits.get(row, col) { BLACK } else { WHITE };
            assert_eq!(*pixel, rgba(expected), "module ({}, {})", row, col);
        }
    }
    assert_eq!(*img.get_pixel(5, 5), rgba(WHITE));
    assert_eq!(*img.get_pixel(506, 300), rgba(WHITE));
}

#[test]
fn test_structure_preserves_data_outside_logo_and_eyes() {
    let bits = encode("structure check", ErrorCorrectionLevel::High).unwrap();
    let logo = Logo::new(ImageHandle::empty()).size(0.2).padding(LogoPadding::Natural(0.2));
    let options = RenderOptions::new(600).logo(logo).fourth_eye(true);
    let scene = Scene::prepare(&bits, &options).unwrap();

    let mut logo_modules = 0;
    for module in scene.code.matrix.modules() {
        match module.kind {
            PixelType::DarkPixel => assert!(bits.get(module.row, module.col)),
            PixelType::LightPixel => {
                let fourth = module.row + 8 >= bits.size() && module.col + 8 >= bits.size();
                assert!(fourth || !bits.get(module.row, module.col));
            }
            PixelType::Logo => logo_modules += 1,
            _ => {}
        }
    }
    assert!(logo_modules > 0);
    assert_eq!(scene.code.eyes.len(), 4);
}

#[test]
fn test_full_round_corners_equal_circle() {
    let round = RenderOptions::new(250).shapes(
        QrShapes::default().dark(PixelShape::RoundCorners(RoundCorners::new(0.5).use_neighbors(false))),
    );
    let circle = RenderOptions::new(250).shapes(QrShapes::default().dark(PixelShape::Circle(1.0)));
    let a = qrstyle::render("corners", &round).unwrap();
    let b = qrstyle::render("corners", &circle).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn test_natural_logo_clears_centre() {
    let logo = Logo::new(ImageHandle::empty())
        .size(0.25)
        .padding(LogoPadding::Natural(0.2))
        .shape(PixelShape::Circle(1.0));
    let options = RenderOptions::new(400).logo(logo);
    let img = qrstyle::render("https://example.com/natural", &options).unwrap();

    let centre = img.get_pixel(200, 200);
    assert_eq!(*centre, rgba(WHITE));
    let dark = img.pixels().filter(|p| **p == rgba(BLACK)).count();
    assert!(dark > 0);
}

#[test]
fn test_error_correction_grows_with_coverage() {
    let mut previous = ErrorCorrectionLevel::Auto.resolve(0.0);
    let mut previous_size = 0;
    for step in 0..=10 {
        let coverage = step as f32 * 0.05;
        let level = ErrorCorrectionLevel::Auto.resolve(coverage);
        assert!(level >= previous);
        let size = encode("monotonic payload", level).unwrap().size();
        assert!(size >= previous_size);
        previous = level;
        previous_size = size;
    }
    assert_eq!(ErrorCorrectionLevel::Auto.resolve(0.5), ErrorCorrectionLevel::High);
}

#[test]
fn test_cancellation_is_not_a_failure() {
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = qrstyle::render_with_cancel("cancel", &RenderOptions::new(200), &token).unwrap_err();
    assert!(cancelled.is_cancelled());

    let failing = RenderOptions::new(200).colors(QrColors::default().dark(QrColor::custom(|_, _, _, _| panic!("boom"))));
    let failed = qrstyle::render("cancel", &failing).unwrap_err();
    assert!(!failed.is_cancelled());
    assert!(matches!(failed, QrError::Render { .. }));
}

#[test]
fn test_empty_payload_is_a_configuration_error() {
    let err = qrstyle::render("", &RenderOptions::new(200)).unwrap_err();
    assert!(matches!(err, QrError::Configuration(_)));
}

#[test]
fn test_vector_and_raster_agree_on_modules() {
    let options = RenderOptions::new(290).padding(0.0);
    let raster = qrstyle::render("agree", &options).unwrap();
    let vector = qrstyle::render_vector("agree", &options).unwrap().rasterize().unwrap();
    let bits = encode("agree", ErrorCorrectionLevel::Medium).unwrap();
    let layout = Layout::new(290, 0.0, (0.0, 0.0), bits.size()).unwrap();
    let half = layout.module_px as i64 / 2;
    for row in 0..bits.size() {
        for col in 0..bits.size() {
            let (x, y) = layout.module_origin(row, col);
            let (x, y) = ((x + half) as u32, (y + half) as u32);
            assert_eq!(raster.get_pixel(x, y), vector.get_pixel(x, y), "module ({}, {})", row, col);
        }
    }
}

#[tokio::test]
async fn test_render_async() {
    let img = qrstyle::render_async("async".to_string(), RenderOptions::new(160), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(img.dimensions(), (160, 160));

    let token = CancellationToken::new();
    token.cancel();
    let err = qrstyle::render_async("async".to_string(), RenderOptions::new(160), token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

fn counting_dark(calls: Arc<AtomicUsize>) -> QrColors {
    QrColors::default().dark(QrColor::custom(move |_, _, _, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        BLACK
    }))
}

#[tokio::test]
async fn test_dropping_render_async_stops_the_worker() {
    let full = Arc::new(AtomicUsize::new(0));
    let options = RenderOptions::new(120).colors(counting_dark(Arc::clone(&full)));
    qrstyle::render("drop me", &options).unwrap();
    let total = full.load(Ordering::SeqCst);

    let calls = Arc::new(AtomicUsize::new(0));
    let (started_tx, started_rx) = std::sync::mpsc::sync_channel::<()>(1);
    let seen = Arc::clone(&calls);
    let slow = RenderOptions::new(120).colors(QrColors::default().dark(QrColor::custom(move |_, _, _, _| {
        seen.fetch_add(1, Ordering::SeqCst);
        let _ = started_tx.try_send(());
        std::thread::sleep(Duration::from_millis(1));
        BLACK
    })));

    let token = CancellationToken::new();
    let started = tokio::task::spawn_blocking(move || started_rx.recv());
    tokio::select! {
        _ = qrstyle::render_async("drop me".to_string(), slow, token.clone()) => {
            panic!("render finished before it was dropped")
        }
        _ = started => {}
    }
    assert!(token.is_cancelled());

    let settle = || tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_millis(300)));
    settle().await.unwrap();
    let after = calls.load(Ordering::SeqCst);
    settle().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), after);
    assert!(after < total, "{} of {} calls", after, total);
}

#[test]
fn test_drawable_restyles_and_recycles() {
    let mut drawable = QrDrawable::new("drawable", RenderOptions::new(180)).unwrap();
    let red = QrColors::default().dark(QrColor::Solid(0xFFFF_0000));
    assert!(drawable.set_colors(red.clone()).unwrap());
    assert!(!drawable.set_colors(red).unwrap());
    let img = drawable.image().unwrap();
    assert!(img.pixels().any(|p| *p == rgba(0xFFFF_0000)));
    assert!(!img.pixels().any(|p| *p == rgba(BLACK)));

    drawable.recycle();
    drawable.recycle();
    assert!(drawable.is_recycled());
    assert!(!drawable.set_logo(None).unwrap());
}
