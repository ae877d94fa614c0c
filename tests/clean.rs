mod common;

use std::fs;

use billing_cleaner::pipeline::clean_file;
use billing_cleaner::transform::Metrics;

use common::{HEADER, TestWorkspace, fixture, fixture_path};

#[test]
fn cleans_fixture_to_golden_output() {
    let ws = TestWorkspace::new();
    let output = ws.path().join("out.csv");

    let metrics = clean_file(&fixture_path("patients.csv"), &output).expect("clean");

    assert_eq!(
        metrics,
        Metrics {
            total_records: 12,
            total_billing: "$0.3M".to_string(),
            total_doctors: 10,
            total_hospitals: 11,
        }
    );
    assert_eq!(
        fs::read_to_string(&output).expect("read output"),
        fixture("patients_cleaned.csv")
    );
}

#[test]
fn identical_input_gives_identical_output() {
    let ws = TestWorkspace::new();
    let first = ws.path().join("first.csv");
    let second = ws.path().join("second.csv");

    let a = clean_file(&fixture_path("patients.csv"), &first).expect("clean");
    let b = clean_file(&fixture_path("patients.csv"), &second).expect("clean");

    assert_eq!(a, b);
    assert_eq!(fs::read(&first).expect("read"), fs::read(&second).expect("read"));
}

#[test]
fn cleaning_twice_is_stable() {
    let ws = TestWorkspace::new();
    let once = ws.path().join("once.csv");
    clean_file(&fixture_path("patients.csv"), &once).expect("clean");

    // Drop the index column so the cleaned file can be fed back in.
    let reinput: String = fs::read_to_string(&once)
        .expect("read")
        .lines()
        .map(|line| line.split_once(',').map(|(_, rest)| rest).unwrap_or(line))
        .map(|line| format!("{line}\n"))
        .collect();
    let reinput = ws.write("reinput.csv", &reinput);
    let twice = ws.path().join("twice.csv");
    clean_file(&reinput, &twice).expect("clean again");

    assert_eq!(
        fs::read_to_string(&once).expect("read"),
        fs::read_to_string(&twice).expect("read")
    );
}

#[test]
fn billing_in_millions() {
    let ws = TestWorkspace::new();
    let input = ws.write(
        "big.csv",
        &format!(
            "{HEADER}\n\
             a,1,M,A,F,2024-01-01,D,H,I,2000000,1,U,2024-01-02,X,N\n\
             b,1,M,A,F,2024-01-01,D,H,I,345000,1,U,2024-01-02,X,N\n"
        ),
    );
    let metrics = clean_file(&input, &ws.path().join("big-cleaned.csv")).expect("clean");
    assert_eq!(metrics.total_billing, "$2.3M");
}

#[test]
fn missing_column_writes_nothing() {
    let ws = TestWorkspace::new();
    let input = ws.write("partial.csv", "Name,Doctor\nann,dr a\n");
    let output = ws.path().join("partial-cleaned.csv");

    let err = clean_file(&input, &output).unwrap_err();

    assert_eq!(
        err.root_cause().to_string(),
        "Column 'Date of Admission' not found in uploaded file"
    );
    assert!(!output.exists());
}

#[test]
fn malformed_date_writes_nothing() {
    let ws = TestWorkspace::new();
    let input = ws.write(
        "bad-date.csv",
        &format!(
            "{HEADER}\n\
             a,1,M,A,F,2024-01-01,D,H,I,10,1,U,2024-01-02,X,N\n\
             b,1,M,A,F,2024-13-45,D,H,I,10,1,U,2024-01-02,X,N\n"
        ),
    );
    let output = ws.path().join("bad-date-cleaned.csv");

    let err = clean_file(&input, &output).unwrap_err();

    assert!(err.to_string().contains("row 1"), "{err:#}");
    assert!(!output.exists());
    assert!(!ws.path().join("bad-date-cleaned.csv.tmp").exists());
}
