use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;

const TABLE_PAGE: &str = r#"<html><body>
<table>
  <tr><th>Case No</th><th>Party</th><th>Date of Order</th></tr>
  <tr><td>W.P.(C)/1234/2023</td><td>Ramesh Kumar vs Union of India</td><td>15-03-2023</td></tr>
</table>
<a href="/orders/wpc-1234.pdf">Order dated 15-03-2023</a>
</body></html>"#;

const NO_RECORD_PAGE: &str = "<html><body><p>No record found.</p></body></html>";

fn courtcase(store: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("courtcase"));
    cmd.env("COURTCASE_STORE_DIR", store);
    cmd.env_remove("COURTCASE_ENV_FILE");
    cmd.env_remove("COURTCASE_BASE_URL");
    cmd
}

fn write_page(dir: &Path, name: &str, html: &str) -> std::path::PathBuf {
    let p = dir.join(name);
    let mut f = std::fs::File::create(&p).expect("create page");
    f.write_all(html.as_bytes()).expect("write page");
    p
}

fn stdout_json(out: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&out.stdout).expect("stdout is json")
}

#[test]
fn extract_without_reference_does_not_persist() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path().join("store");
    let page = write_page(tmp.path(), "page.html", TABLE_PAGE);

    let out = courtcase(&store)
        .args(["extract", "--html", page.to_str().unwrap()])
        .output()
        .expect("run extract");
    assert!(out.status.success());

    let v = stdout_json(&out);
    assert_eq!(v["kind"].as_str(), Some("extract"));
    assert_eq!(v["ok"].as_bool(), Some(true));
    assert_eq!(v["data"]["status"].as_str(), Some("success"));
    assert_eq!(
        v["data"]["data"]["parties"].as_str(),
        Some("Ramesh Kumar vs Union of India")
    );
    assert_eq!(
        v["data"]["data"]["pdf_links"][0]["url"].as_str(),
        Some("https://delhihighcourt.nic.in/orders/wpc-1234.pdf")
    );
    assert!(v.get("query_id").is_none());
    assert!(!store.join("queries").exists());
}

#[test]
fn extract_reads_stdin_and_honours_base_url() {
    let tmp = tempfile::tempdir().unwrap();
    courtcase(tmp.path())
        .args(["extract", "--base-url", "https://court.example/"])
        .write_stdin(TABLE_PAGE)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://court.example/orders/wpc-1234.pdf",
        ));
}

#[test]
fn recorded_lookups_show_up_in_history_show_and_stats() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path().join("store");
    let ok_page = write_page(tmp.path(), "ok.html", TABLE_PAGE);
    let bad_page = write_page(tmp.path(), "bad.html", NO_RECORD_PAGE);

    let out = courtcase(&store)
        .args([
            "extract",
            "--html",
            ok_page.to_str().unwrap(),
            "--case-type",
            "W.P.(C)/1234/2023",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let first = stdout_json(&out);
    assert_eq!(first["query_id"].as_u64(), Some(1));

    let out = courtcase(&store)
        .args([
            "extract",
            "--html",
            bad_page.to_str().unwrap(),
            "--case-type",
            "CRL",
            "--case-number",
            "77",
            "--year",
            "2020",
        ])
        .output()
        .unwrap();
    assert!(out.status.success(), "extraction failure is still a clean exit");
    let second = stdout_json(&out);
    assert_eq!(second["ok"].as_bool(), Some(false));
    assert_eq!(
        second["data"]["reason"].as_str(),
        Some("Court website returned: no record")
    );
    assert!(second["hint"].as_str().is_some());

    let history = stdout_json(&courtcase(&store).args(["history"]).output().unwrap());
    let rows = history["data"]["queries"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"].as_u64(), Some(2));
    assert_eq!(rows[0]["status"].as_str(), Some("failed"));

    let show = stdout_json(&courtcase(&store).args(["show", "1"]).output().unwrap());
    assert_eq!(show["data"]["status"].as_str(), Some("completed"));
    assert_eq!(show["data"]["case_type"].as_str(), Some("W.P.(C)"));
    assert_eq!(
        show["data"]["case_data"]["filing_date"].as_str(),
        Some("15-03-2023")
    );

    let stats = stdout_json(&courtcase(&store).args(["stats"]).output().unwrap());
    assert_eq!(stats["data"]["total_queries"].as_u64(), Some(2));
    assert_eq!(stats["data"]["successful_queries"].as_u64(), Some(1));
    assert_eq!(stats["data"]["failed_queries"].as_u64(), Some(1));
    assert_eq!(stats["data"]["success_rate"].as_f64(), Some(50.0));
}

#[test]
fn cleanup_with_future_clock_empties_history() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path().join("store");
    let page = write_page(tmp.path(), "ok.html", TABLE_PAGE);
    courtcase(&store)
        .args([
            "extract",
            "--html",
            page.to_str().unwrap(),
            "--case-type",
            "FAO/5/2019",
        ])
        .assert()
        .success();

    let far_future = "99999999999";
    let out = courtcase(&store)
        .args(["cleanup", "--days", "30", "--now-epoch-s", far_future])
        .output()
        .unwrap();
    let v = stdout_json(&out);
    assert_eq!(v["data"]["deleted_queries"].as_u64(), Some(1));
    assert_eq!(v["data"]["deleted_case_data"].as_u64(), Some(1));

    let history = stdout_json(&courtcase(&store).args(["history"]).output().unwrap());
    assert_eq!(history["data"]["count"].as_u64(), Some(0));
}

#[test]
fn errors_use_the_error_envelope() {
    let tmp = tempfile::tempdir().unwrap();

    let out = courtcase(tmp.path()).args(["show", "9"]).output().unwrap();
    assert!(!out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["kind"].as_str(), Some("show"));
    assert_eq!(v["ok"].as_bool(), Some(false));
    assert_eq!(v["error"]["code"].as_str(), Some("not_found"));

    let out = courtcase(tmp.path())
        .args(["extract", "--case-number", "1", "--year", "2020"])
        .write_stdin(TABLE_PAGE)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert_eq!(
        stdout_json(&out)["error"]["code"].as_str(),
        Some("invalid_params")
    );

    let out = courtcase(tmp.path())
        .args(["extract", "--base-url", "not a url"])
        .write_stdin(TABLE_PAGE)
        .output()
        .unwrap();
    assert_eq!(
        stdout_json(&out)["error"]["code"].as_str(),
        Some("invalid_url")
    );
}
