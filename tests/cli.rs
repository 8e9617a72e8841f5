use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn write_specimen_csv(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("specimen.csv");
    let mut body = String::from("Specimen ID,Egg Count,Gravid,Collected\n");
    for i in 1..=12 {
        let gravid = if i % 2 == 0 { "Y" } else { "N" };
        body.push_str(&format!("S{i:03},{i},{gravid},2021-04-{i:02}\n"));
    }
    fs::write(&path, body).expect("write specimen csv");
    path
}

#[test]
fn analyze_writes_a_design_file_check_accepts() {
    let dir = tempdir().expect("temp dir");
    let csv_path = write_specimen_csv(&dir);
    let design_path = dir.path().join("design.csv");

    Command::cargo_bin("csv-design")
        .expect("binary exists")
        .args([
            "analyze",
            "-o",
            design_path.to_str().unwrap(),
            "-r",
            &format!("specimen={}", csv_path.display()),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&design_path).expect("read design");
    assert!(contents.contains("\"specimen\""));
    assert!(contents.contains("\"manual key\""));
    assert!(contents.contains("\"boolean\""));
    assert!(contents.contains("\"date\""));
    assert!(contents.contains("\"!fill me in!\""));

    let json_path = dir.path().join("schema.json");
    Command::cargo_bin("csv-design")
        .expect("binary exists")
        .args([
            "check",
            "-d",
            design_path.to_str().unwrap(),
            "--json",
            json_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let schema: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).expect("read json"))
            .expect("parse schema json");
    let relations = schema.as_array().expect("relation array");
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0]["design_name"], "specimen");
    assert_eq!(relations[0]["id_type"], "text");
}

#[test]
fn analyze_rejects_duplicate_relation_names() {
    let dir = tempdir().expect("temp dir");
    let csv_path = write_specimen_csv(&dir);
    let spec = format!("specimen={}", csv_path.display());

    Command::cargo_bin("csv-design")
        .expect("binary exists")
        .args([
            "analyze",
            "-o",
            dir.path().join("design.csv").to_str().unwrap(),
            "-r",
            &spec,
            "-r",
            &spec,
        ])
        .assert()
        .failure()
        .stderr(contains("same relation name"));
}

#[test]
fn analyze_takes_no_gis_flag() {
    // GIS types only enter through hand-edited design files, so the flag
    // belongs to `check` alone.
    Command::cargo_bin("csv-design")
        .expect("binary exists")
        .args(["analyze", "-o", "design.csv", "-r", "a=a.csv", "--gis"])
        .assert()
        .failure()
        .stderr(contains("--gis"));
}

#[test]
fn analyze_rejects_malformed_relation_spec() {
    Command::cargo_bin("csv-design")
        .expect("binary exists")
        .args(["analyze", "-o", "design.csv", "-r", "no-equals-sign"])
        .assert()
        .failure()
        .stderr(contains("name=path"));
}

#[test]
fn check_reports_unknown_data_type() {
    let dir = tempdir().expect("temp dir");
    let design_path = dir.path().join("design.csv");
    fs::write(
        &design_path,
        "specimens,new field name,data type,nullable?,null values,default,description,show in table?\n\
         Label,label,varchar,false,,,,true\n",
    )
    .expect("write design");

    Command::cargo_bin("csv-design")
        .expect("binary exists")
        .args(["check", "-d", design_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Unknown data type 'varchar'"));
}
