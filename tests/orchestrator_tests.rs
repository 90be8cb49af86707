use faceswapper::config::OutputConfig;
use faceswapper::error::{Result, SwapError};
use faceswapper::faces::{BoundingBox, Face, FaceAnalyzer, FaceSwapper};
use faceswapper::logger;
use faceswapper::orchestrator::{Orchestrator, SessionState, SwapOutcome};
use image::{Rgb, RgbImage};
use mockall::mock;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

mock! {
    pub Analyzer {}
    impl FaceAnalyzer for Analyzer {
        fn detect(&mut self, image: &RgbImage) -> Result<Vec<Face>>;
    }
}

mock! {
    pub Swapper {}
    impl FaceSwapper for Swapper {
        fn swap(
            &mut self,
            target: &RgbImage,
            target_face: &Face,
            source_face: &Face,
        ) -> Result<RgbImage>;
    }
}

static INIT: Once = Once::new();

fn setup() {
    INIT.call_once(|| {
        let _ = logger::init_logger();
    });
}

fn face() -> Face {
    Face {
        bbox: BoundingBox {
            x1: 2.0,
            y1: 2.0,
            x2: 30.0,
            y2: 30.0,
        },
        score: 0.92,
        landmarks: [[10.0, 12.0], [20.0, 12.0], [15.0, 17.0], [11.0, 23.0], [19.0, 23.0]],
        embedding: Some(vec![0.5; 512]),
    }
}

fn output_in(dir: &TempDir) -> OutputConfig {
    OutputConfig {
        directory: dir.path().join("out"),
        ..OutputConfig::default()
    }
}

fn write_image(dir: &TempDir, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(w, h, Rgb([120, 80, 60]))
        .save(&path)
        .expect("write test image");
    path
}

/// Analyzer that finds one face in every image
fn finds_faces() -> MockAnalyzer {
    let mut analyzer = MockAnalyzer::new();
    analyzer.expect_detect().returning(|_| Ok(vec![face()]));
    analyzer
}

/// Swapper that paints the whole target a fixed colour
fn paints(colour: [u8; 3]) -> MockSwapper {
    let mut swapper = MockSwapper::new();
    swapper.expect_swap().returning(move |target, _, _| {
        Ok(RgbImage::from_pixel(
            target.width(),
            target.height(),
            Rgb(colour),
        ))
    });
    swapper
}

fn files_in(dir: &std::path::Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
#[serial]
fn test_swap_without_inputs_writes_nothing() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = output_in(&temp_dir);

    let mut analyzer = MockAnalyzer::new();
    analyzer.expect_detect().never();
    let mut swapper = MockSwapper::new();
    swapper.expect_swap().never();

    let mut orchestrator = Orchestrator::new(analyzer, swapper, &output);
    assert_eq!(orchestrator.state(), SessionState::Empty);

    match orchestrator.swap() {
        SwapOutcome::MissingInput { source, target } => assert!(source && target),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(files_in(&output.directory), 0);
}

#[test]
#[serial]
fn test_empty_detection_writes_nothing() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = output_in(&temp_dir);

    let mut analyzer = MockAnalyzer::new();
    analyzer.expect_detect().returning(|_| Ok(Vec::new()));
    let mut swapper = MockSwapper::new();
    swapper.expect_swap().never();

    let mut orchestrator = Orchestrator::new(analyzer, swapper, &output);
    orchestrator.set_source(write_image(&temp_dir, "source.png", 64, 64));
    orchestrator.set_target(write_image(&temp_dir, "target.jpg", 64, 64));

    match orchestrator.swap() {
        SwapOutcome::NoFaceDetected { source, target } => assert!(source && target),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!output.output_path().exists());
}

#[test]
#[serial]
fn test_successful_swap_writes_decodable_result() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = output_in(&temp_dir);

    let mut orchestrator = Orchestrator::new(finds_faces(), paints([200, 30, 30]), &output);
    orchestrator.set_source(write_image(&temp_dir, "source.png", 64, 64));
    orchestrator.set_target(write_image(&temp_dir, "target.png", 800, 600));

    let (path, preview) = match orchestrator.swap() {
        SwapOutcome::Swapped { output, preview } => (output, preview),
        other => panic!("unexpected outcome: {:?}", other),
    };

    assert_eq!(path, output.output_path());
    let written = image::open(&path).expect("result should decode").to_rgb8();
    assert_eq!(written.dimensions(), (800, 600));
    // lossy output, so only check the colour is roughly right
    let pixel = written.get_pixel(400, 300);
    assert!(pixel[0] > 180 && pixel[1] < 60, "unexpected pixel {:?}", pixel);

    assert!(preview.width() <= 400 && preview.height() <= 400);
    assert_eq!(preview.width(), 400);
    assert!((preview.height() as i64 - 300).abs() <= 1);
}

#[test]
#[serial]
fn test_repeated_swaps_overwrite_one_file() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = output_in(&temp_dir);

    let mut orchestrator = Orchestrator::new(finds_faces(), paints([10, 220, 10]), &output);
    orchestrator.set_source(write_image(&temp_dir, "source.png", 32, 32));
    orchestrator.set_target(write_image(&temp_dir, "target.png", 48, 48));

    assert!(orchestrator.swap().is_success());
    orchestrator.set_target(write_image(&temp_dir, "wide.png", 96, 48));
    assert!(orchestrator.swap().is_success());

    assert_eq!(files_in(&output.directory), 1);
    let written = image::open(output.output_path()).expect("result should decode");
    assert_eq!((written.width(), written.height()), (96, 48));
}

#[test]
#[serial]
fn test_corrupt_target_fails_and_keeps_session() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = output_in(&temp_dir);

    let source = write_image(&temp_dir, "source.png", 32, 32);
    let target = temp_dir.path().join("target.png");
    fs::write(&target, b"definitely not a png").expect("write corrupt file");

    let mut analyzer = MockAnalyzer::new();
    analyzer.expect_detect().never();
    let mut swapper = MockSwapper::new();
    swapper.expect_swap().never();

    let mut orchestrator = Orchestrator::new(analyzer, swapper, &output);
    orchestrator.set_source(source.clone());
    orchestrator.set_target(target.clone());

    match orchestrator.swap() {
        SwapOutcome::Failed(SwapError::Image(_)) => {}
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(orchestrator.state(), SessionState::BothLoaded);
    assert_eq!(orchestrator.source(), Some(source.as_path()));
    assert_eq!(orchestrator.target(), Some(target.as_path()));
    assert!(!output.output_path().exists());
}

#[test]
#[serial]
fn test_updated_output_settings_apply_to_next_swap() {
    setup();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output = output_in(&temp_dir);

    let mut orchestrator = Orchestrator::new(finds_faces(), paints([0, 0, 255]), &output);
    orchestrator.set_source(write_image(&temp_dir, "source.png", 32, 32));
    orchestrator.set_target(write_image(&temp_dir, "target.png", 300, 300));

    let changed = OutputConfig {
        file_name: "renamed.png".to_string(),
        preview_max_width: 100,
        preview_max_height: 100,
        ..output.clone()
    };
    orchestrator.update_output(&changed);

    match orchestrator.swap() {
        SwapOutcome::Swapped { output: path, preview } => {
            assert_eq!(path, changed.output_path());
            assert_eq!(preview.dimensions(), (100, 100));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!output.output_path().exists());
}
