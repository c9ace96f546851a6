use calamine::{Reader, Xlsx, open_workbook_from_rs};
use chrono::NaiveDate;
use contentplanner::export::{self, ExportFormat, SHEET_NAME};
use contentplanner::models::HEADERS;
use contentplanner::{Platform, Post, Status};
use std::io::Cursor;
use tempfile::tempdir;

fn sample_posts() -> Vec<Post> {
    let day = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
    let mut reel = Post::new("Autumn reel", day);
    reel.platform = Platform::TikTok;
    reel.status = Status::InProgress;
    reel.caption = "Leaves, \"quotes\"\nand a second line".to_string();

    let mut recap = Post::new("Recap", day);
    recap.posted = true;
    recap.result = Some("350 likes".to_string());

    vec![reel, recap]
}

fn xlsx_rows(bytes: Vec<u8>) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

#[test]
fn empty_csv_export_is_just_the_header() {
    let bytes = export::to_csv(&[]).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.trim_end(), HEADERS.join(","));
}

#[test]
fn empty_xlsx_export_is_just_the_header() {
    let rows = xlsx_rows(export::to_xlsx(&[]).unwrap());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>());
}

#[test]
fn xlsx_export_has_one_row_per_post() {
    let posts = sample_posts();
    let rows = xlsx_rows(export::to_xlsx(&posts).unwrap());

    assert_eq!(rows.len(), posts.len() + 1);
    for (row, post) in rows[1..].iter().zip(&posts) {
        assert_eq!(row, &post.to_row().to_vec());
    }
    assert_eq!(rows[1][6], "TikTok");
    assert_eq!(rows[2][7], "Yes");
}

#[test]
fn csv_export_reads_back_into_the_same_posts() {
    let posts = sample_posts();
    let bytes = export::to_csv(&posts).unwrap();
    assert_eq!(export::from_csv(bytes.as_slice()).unwrap(), posts);
}

#[test]
fn csv_with_a_foreign_header_is_rejected() {
    let data = "Name,When\nA,2025-01-01\n";
    assert!(matches!(
        export::from_csv(data.as_bytes()),
        Err(export::ExportError::Header { .. })
    ));
}

#[test]
fn write_file_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let path = ExportFormat::Csv.default_path(&dir.path().join("exports"));
    export::write_file(&sample_posts(), ExportFormat::Csv, &path).unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(export::from_csv(written.as_slice()).unwrap(), sample_posts());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("csv"));
}
