use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::io::Write;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

const DUMP: &str = "<mediawiki><page><title>Rust</title>\
<timestamp>2015-05-15T00:00:00Z</timestamp>\
<text xml:space=\"preserve\">'''Rust''' is a [[programming language|language]] \
focused on {{em|safety}} and speed.\n\n\nIt was announced in 2010 by rev12345.</text>\
</page></mediawiki>";

const CLEANED: &str = "Rust is a language focused on safety and speed.\nIt was announced in by .";

fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("create tempdir")
}

fn charprep() -> Command {
    Command::cargo_bin("charprep").expect("binary exists")
}

#[test]
fn prepare_decode_info_round_trip() {
    let workspace = temp_workspace();
    let input_path = workspace.path().join("enwik");
    fs::write(&input_path, DUMP).expect("write input");

    charprep()
        .current_dir(workspace.path())
        .args(["--quiet", "prepare", "enwik", "-o", "data", "--no-progress"])
        .assert()
        .success();

    let data_dir = workspace.path().join("data");
    let train = fs::read(data_dir.join("train.bin")).expect("train.bin exists");
    let val = fs::read(data_dir.join("val.bin")).expect("val.bin exists");
    let total = CLEANED.chars().count();
    assert_eq!(train.len() + val.len(), total * 2);
    assert_eq!(train.len() / 2, total * 9 / 10);

    let meta: Value =
        serde_json::from_slice(&fs::read(data_dir.join("meta.json")).expect("meta.json exists"))
            .expect("metadata is valid JSON");
    let vocab_size = meta["vocab_size"].as_u64().expect("vocab_size");
    assert_eq!(meta["itos"].as_object().expect("itos").len() as u64, vocab_size);
    assert_eq!(meta["stoi"].as_object().expect("stoi").len() as u64, vocab_size);
    assert_eq!(meta["stoi"]["\n"], 0);

    let mut decoded = Vec::new();
    for name in ["train.bin", "val.bin"] {
        let output = charprep()
            .current_dir(&data_dir)
            .args(["--quiet", "decode", "-m", "meta.json", name])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        decoded.extend(output);
    }
    assert_eq!(String::from_utf8(decoded).expect("ascii text"), CLEANED);

    let info_output = charprep()
        .current_dir(&data_dir)
        .args(["--quiet", "info", "-m", "meta.json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let info_text = String::from_utf8(info_output).expect("info output is UTF-8");
    assert!(
        info_text.contains(&format!("Vocab size: {vocab_size}")),
        "info output contained expected summary: {info_text}"
    );
}

#[test]
fn prepare_reads_zip_member() {
    let workspace = temp_workspace();
    let archive = fs::File::create(workspace.path().join("enwik8.zip")).expect("create archive");
    let mut writer = ZipWriter::new(archive);
    writer
        .start_file("notes.txt", FileOptions::default())
        .expect("start member");
    writer.write_all(b"ignored").expect("write member");
    writer
        .start_file("enwik8", FileOptions::default())
        .expect("start member");
    writer.write_all(DUMP.as_bytes()).expect("write member");
    writer.finish().expect("finish archive");

    charprep()
        .current_dir(workspace.path())
        .args([
            "--quiet",
            "prepare",
            "enwik8.zip",
            "--member",
            "enwik8",
            "-o",
            "data",
            "--no-progress",
        ])
        .assert()
        .success();

    let train = fs::read(workspace.path().join("data").join("train.bin")).expect("train.bin");
    let val = fs::read(workspace.path().join("data").join("val.bin")).expect("val.bin");
    assert_eq!(train.len() + val.len(), CLEANED.chars().count() * 2);
}

#[test]
fn prepare_is_deterministic() {
    let workspace = temp_workspace();
    fs::write(workspace.path().join("enwik"), DUMP).expect("write input");

    for out in ["first", "second"] {
        charprep()
            .current_dir(workspace.path())
            .args(["--quiet", "prepare", "enwik", "-o", out, "--no-progress"])
            .assert()
            .success();
    }
    for name in ["train.bin", "val.bin", "meta.json"] {
        let first = fs::read(workspace.path().join("first").join(name)).expect("first output");
        let second = fs::read(workspace.path().join("second").join(name)).expect("second output");
        assert_eq!(first, second, "{name} differs between runs");
    }
}

#[test]
fn malformed_input_writes_nothing() {
    let workspace = temp_workspace();
    fs::write(workspace.path().join("enwik"), "<page>no payload here</page>").expect("write input");

    let output = charprep()
        .current_dir(workspace.path())
        .args(["--quiet", "prepare", "enwik", "-o", "data", "--no-progress"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&output);
    assert!(stderr.contains("malformed input"), "stderr: {stderr}");
    assert!(!workspace.path().join("data").exists());
}

#[test]
fn empty_payload_is_not_an_error() {
    let workspace = temp_workspace();
    fs::write(workspace.path().join("enwik"), "<text></text>").expect("write input");

    charprep()
        .current_dir(workspace.path())
        .args(["--quiet", "prepare", "enwik", "-o", "data", "--no-progress"])
        .assert()
        .success();

    let data_dir = workspace.path().join("data");
    assert!(fs::read(data_dir.join("train.bin")).unwrap().is_empty());
    assert!(fs::read(data_dir.join("val.bin")).unwrap().is_empty());
    let meta: Value =
        serde_json::from_slice(&fs::read(data_dir.join("meta.json")).unwrap()).unwrap();
    assert_eq!(meta["vocab_size"], 0);
}

#[test]
fn clean_writes_normalized_text() {
    let workspace = temp_workspace();
    fs::write(workspace.path().join("enwik"), DUMP).expect("write input");

    charprep()
        .current_dir(workspace.path())
        .args(["--quiet", "clean", "enwik", "--output", "clean.txt"])
        .assert()
        .success();
    let cleaned = fs::read_to_string(workspace.path().join("clean.txt")).expect("clean.txt");
    assert_eq!(cleaned, CLEANED);
}

#[test]
fn raw_mode_with_wide_codes() {
    let workspace = temp_workspace();
    let bytes: Vec<u8> = (0..=255u8).collect();
    fs::write(workspace.path().join("blob"), &bytes).expect("write input");

    charprep()
        .current_dir(workspace.path())
        .args([
            "--quiet",
            "prepare",
            "blob",
            "-o",
            "data",
            "--raw",
            "--code-width",
            "u32",
            "--train-ratio",
            "0.5",
            "--no-progress",
        ])
        .assert()
        .success();

    let train = fs::read(workspace.path().join("data").join("train.bin")).unwrap();
    assert_eq!(train.len(), 128 * 4);
    assert_eq!(&train[4..8], &[1, 0, 0, 0]);

    let decoded_path = workspace.path().join("decoded.bin");
    charprep()
        .current_dir(workspace.path())
        .args([
            "--quiet",
            "decode",
            "-m",
            "data/meta.json",
            "data/train.bin",
            "--offset",
            "10",
            "--limit",
            "5",
            "--output",
            "decoded.bin",
        ])
        .assert()
        .success();
    assert_eq!(fs::read(decoded_path).unwrap(), vec![10, 11, 12, 13, 14]);
}
