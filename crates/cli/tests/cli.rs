use assert_cmd::Command;

#[test]
fn openapi_prints_book_routes() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("openapi")
        .output()
        .unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["info"]["title"], "Shelf API");
    assert!(document["paths"]["/api/books"]["get"].is_object());
    assert!(document["paths"]["/api/books/{id}"]["delete"].is_object());
}

#[test]
fn rejects_unknown_subcommand() {
    Command::cargo_bin("shelf")
        .unwrap()
        .arg("migrate")
        .assert()
        .failure();
}
