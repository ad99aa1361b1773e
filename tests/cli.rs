use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("podbrief")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("abstractive summary"));
}

#[test]
fn platforms_lists_both_sources() {
    Command::cargo_bin("podbrief")
        .unwrap()
        .arg("platforms")
        .assert()
        .success()
        .stdout(predicate::str::contains("yt-dlp"))
        .stdout(predicate::str::contains("RSS"));
}

#[test]
fn out_of_range_detail_is_rejected_before_any_work() {
    Command::cargo_bin("podbrief")
        .unwrap()
        .args(["summarize", "https://example.com/feed.xml", "--detail", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("detail level must be between 0.0 and 1.0"));
}
