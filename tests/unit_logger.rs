use faceswapper::logger;
use serial_test::serial;
use std::fs;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

fn ensure_logger_init() {
    INIT.call_once(|| {
        let _ = logger::init_logger();
    });
}

#[test]
#[serial]
fn test_logger_initialization() {
    let result = logger::init_logger();
    assert!(result.is_ok(), "Logger initialization should succeed");
}

#[test]
#[serial]
fn test_logger_multiple_initialization() {
    ensure_logger_init();

    let result1 = logger::init_logger();
    let result2 = logger::init_logger();

    assert!(result1.is_ok(), "First logger init should succeed");
    assert!(result2.is_ok(), "Second logger init should not panic");
}

#[test]
#[serial]
fn test_log_macros_with_formatting() {
    ensure_logger_init();

    let path = "faces/source.png";
    let faces = 3;

    faceswapper::logger::log::info!("Source image: {}", path);
    faceswapper::logger::log::warn!("{} faces detected in target image", faces);
    faceswapper::logger::log::error!("Swap failed: {}", "test error");
    faceswapper::logger::log::debug!(context = "default", "Session built");
}

#[test]
#[serial]
fn test_error_log_appends_timestamped_lines() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let log_path = temp_dir.path().join("error_log.txt");

    logger::append_error_log(&log_path, "swap", "first failure").expect("first append");
    logger::append_error_log(&log_path, "swap", "second failure").expect("second append");

    let content = fs::read_to_string(&log_path).expect("log should exist");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('['), "line should start with a timestamp: {}", lines[0]);
    assert!(lines[0].ends_with("swap: first failure"));
    assert!(lines[1].ends_with("swap: second failure"));
}

#[test]
#[serial]
fn test_error_log_in_missing_directory_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let log_path = temp_dir.path().join("no_such_dir").join("error_log.txt");

    assert!(logger::append_error_log(&log_path, "swap", "lost").is_err());
}

#[test]
#[serial]
fn test_logger_thread_safety() {
    ensure_logger_init();

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::thread;

    let counter = Arc::new(AtomicU32::new(0));
    let handles: Vec<_> = (0..5)
        .map(|i| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for j in 0..10 {
                    faceswapper::logger::log::info!("Thread {} iteration {}", i, j);
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should complete successfully");
    }
    assert_eq!(counter.load(Ordering::SeqCst), 50);
}
