use std::path::{Path, PathBuf};

use exrmix::{ExrCodec, ExrmixError, ImageIo, PixelBuffer, StoreOptions};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target")
        .join("compose_pipeline")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_rgb(dir: &Path, name: &str, samples: Vec<f32>) {
    let buffer = PixelBuffer::from_raw(1, 1, false, samples).unwrap();
    ExrCodec
        .store(
            &dir.join(name).display().to_string(),
            &buffer,
            &StoreOptions::default(),
        )
        .unwrap();
}

fn path(dir: &Path, name: &str) -> String {
    dir.join(name).display().to_string()
}

#[test]
fn sequence_compose_end_to_end() {
    let dir = scratch("sequence");
    write_rgb(&dir, "a_0001.exr", vec![1.0, 2.0, 3.0]);
    write_rgb(&dir, "a_0002.exr", vec![2.0, 4.0, 6.0]);
    write_rgb(&dir, "b_0001.exr", vec![0.5, 1.5, 2.5]);
    write_rgb(&dir, "b_0002.exr", vec![1.0, 2.0, 3.0]);

    let expression = format!(
        "{} = ({} + {}) * 0.5",
        path(&dir, "out_#.exr"),
        path(&dir, "a_#.exr"),
        path(&dir, "b_#.exr"),
    );
    let report = exrmix::compose(&expression, &ExrCodec, &StoreOptions::default(), None).unwrap();
    assert!(report.all_ok());
    assert_eq!(
        report.written,
        vec![path(&dir, "out_0001.exr"), path(&dir, "out_0002.exr")]
    );

    let out = ExrCodec.load(&path(&dir, "out_0001.exr")).unwrap();
    assert_eq!(out.samples(), &[0.75, 1.75, 2.75]);
    let out = ExrCodec.load(&path(&dir, "out_0002.exr")).unwrap();
    assert_eq!(out.samples(), &[1.5, 3.0, 4.5]);

    let verify = exrmix::batch::verify_outputs(&report.written, &ExrCodec);
    assert!(verify.all_ok());
    assert_eq!(verify.checked, 2);
}

#[test]
fn single_file_compose_with_constants() {
    let dir = scratch("single");
    write_rgb(&dir, "normals.exr", vec![0.5, 0.75, 1.0]);

    let expression = format!(
        "{} = ({} - 0.5) * 2.0",
        path(&dir, "signed.exr"),
        path(&dir, "normals.exr"),
    );
    let report = exrmix::compose(&expression, &ExrCodec, &StoreOptions::default(), None).unwrap();
    assert!(report.all_ok());

    let out = ExrCodec.load(&path(&dir, "signed.exr")).unwrap();
    assert_eq!(out.samples(), &[0.0, 0.5, 1.0]);
}

#[test]
fn preflight_missing_file_blocks_the_whole_run() {
    let dir = scratch("preflight");
    write_rgb(&dir, "a_0001.exr", vec![1.0, 1.0, 1.0]);
    write_rgb(&dir, "a_0002.exr", vec![1.0, 1.0, 1.0]);
    write_rgb(&dir, "b_0001.exr", vec![1.0, 1.0, 1.0]);

    let expression = format!(
        "{} = {} + {}",
        path(&dir, "out_#.exr"),
        path(&dir, "a_#.exr"),
        path(&dir, "b_#.exr"),
    );
    let err =
        exrmix::compose(&expression, &ExrCodec, &StoreOptions::default(), None).unwrap_err();

    let ExrmixError::MissingInputs(missing) = err else {
        panic!("expected MissingInputs, got: {err}");
    };
    assert_eq!(missing, vec![path(&dir, "b_0002.exr")]);
    assert!(!dir.join("out_0001.exr").exists());
    assert!(!dir.join("out_0002.exr").exists());
}

#[test]
fn mixed_wildcards_abort_before_any_output() {
    let dir = scratch("mixed");
    write_rgb(&dir, "a_0001.exr", vec![1.0, 1.0, 1.0]);
    write_rgb(&dir, "b_0001.exr", vec![1.0, 1.0, 1.0]);

    let expression = format!(
        "{} = {} + {}",
        path(&dir, "out_#.exr"),
        path(&dir, "a_#.exr"),
        path(&dir, "b_????.exr"),
    );
    let err =
        exrmix::compose(&expression, &ExrCodec, &StoreOptions::default(), None).unwrap_err();
    assert!(matches!(err, ExrmixError::Wildcard(_)), "got: {err}");
    assert!(!dir.join("out_0001.exr").exists());
}

#[test]
fn syntax_errors_abort_before_any_io() {
    let err = exrmix::compose(
        "out.exr = a.exr + + b.exr",
        &ExrCodec,
        &StoreOptions::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ExrmixError::Syntax(_)), "got: {err}");
}
