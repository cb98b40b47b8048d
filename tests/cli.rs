use std::process::Command;

use anyhow::Result;
use assert_cmd::prelude::*;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use opencv::core::{CV_8UC3, Mat, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::*;
use predicates::prelude::*;
use rstest::*;

use lostfound::image::{ImageFormat, encode_image};

macro_rules! cargo_run {
    ($cmd:expr, $($args:expr),*) => {
        {
            let mut cmd = Command::cargo_bin($cmd)?;
            $(cmd.arg($args);)*
            cmd.assert()
        }
    };
}

fn pattern(width: i32, height: i32) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(255.))?;
    let (w, h) = (width / 10, height / 8);
    for row in 1..7 {
        for col in 1..9 {
            if (row + col) % 2 == 0 {
                let rect = Rect::new(col * w, row * h, w, h);
                imgproc::rectangle(&mut mat, rect, Scalar::all(0.), -1, imgproc::LINE_8, 0)?;
            }
        }
    }
    Ok(mat)
}

fn flat(width: i32, height: i32) -> Result<Mat> {
    Ok(Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(128.))?)
}

/// 准备一个包含图片与导入文件的临时目录
#[fixture]
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("umbrella.png")
        .write_binary(&encode_image(&pattern(400, 320).unwrap(), ImageFormat::Png).unwrap())
        .unwrap();
    dir.child("blank.png")
        .write_binary(&encode_image(&flat(320, 240).unwrap(), ImageFormat::Png).unwrap())
        .unwrap();
    dir.child("items.json")
        .write_str(
            r#"[
                {
                    "id": "umbrella-1",
                    "type": "found",
                    "title": "Checkered umbrella",
                    "category": "Accessories",
                    "location": "Library",
                    "date": "2025-05-20",
                    "imagePath": "umbrella.png"
                },
                {
                    "id": "notebook-1",
                    "type": "lost",
                    "title": "Notebook",
                    "location": "Lecture hall B"
                },
                {
                    "id": "keys-1",
                    "type": "found",
                    "title": "Keys",
                    "status": "resolved",
                    "imagePath": "umbrella.png"
                }
            ]"#,
        )
        .unwrap();
    dir
}

#[rstest]
fn import_then_search(workspace: TempDir) -> Result<()> {
    let db = workspace.path().join("items.db");

    cargo_run!("lostfound", "-d", &db, "import", workspace.path().join("items.json"))
        .success()
        .stdout(predicate::str::contains("imported 3 of 3 items"));

    cargo_run!("lostfound", "-d", &db, "search", workspace.path().join("umbrella.png"))
        .success()
        .stdout(predicate::str::contains("Checkered umbrella (umbrella-1)"))
        .stdout(predicate::str::contains("Keys").not());

    let umbrella = workspace.path().join("umbrella.png");
    cargo_run!("lostfound", "-d", &db, "search", "-t", "lost", umbrella)
        .success()
        .stderr(predicate::str::contains("No items with images found to compare"));

    Ok(())
}

#[rstest]
fn import_is_idempotent(workspace: TempDir) -> Result<()> {
    let db = workspace.path().join("items.db");
    let items = workspace.path().join("items.json");

    cargo_run!("lostfound", "-d", &db, "import", &items).success();
    cargo_run!("lostfound", "-d", &db, "import", &items)
        .success()
        .stdout(predicate::str::contains("imported 0 of 3 items"));

    Ok(())
}

#[rstest]
fn search_json_output(workspace: TempDir) -> Result<()> {
    let db = workspace.path().join("items.db");

    cargo_run!("lostfound", "-d", &db, "import", workspace.path().join("items.json")).success();
    cargo_run!(
        "lostfound",
        "-d",
        &db,
        "search",
        "--output-format",
        "json",
        workspace.path().join("umbrella.png")
    )
    .success()
    .stdout(predicate::str::contains(r#""success": true"#))
    .stdout(predicate::str::contains("Found 1 similar item"));

    Ok(())
}

#[rstest]
fn search_blank_image(workspace: TempDir) -> Result<()> {
    let db = workspace.path().join("items.db");

    cargo_run!("lostfound", "-d", &db, "import", workspace.path().join("items.json")).success();
    cargo_run!("lostfound", "-d", &db, "search", workspace.path().join("blank.png"))
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Could not extract features from query image"));

    Ok(())
}

#[rstest]
fn search_missing_file(workspace: TempDir) -> Result<()> {
    let db = workspace.path().join("items.db");

    cargo_run!("lostfound", "-d", &db, "search", workspace.path().join("missing.png")).failure();

    Ok(())
}
