mod common;

use common::DealboardTest;

// ============================================================================
// Date presets
// ============================================================================

#[test]
fn test_range_json() {
    let dealboard = DealboardTest::new();

    let output = dealboard.run_success(&["range", "last-7-days", "--today", "2026-03-18", "--json"]);
    insta::assert_snapshot!(output, @r#"
    {
      "from": "2026-03-12T00:00:00",
      "preset": "last-7-days",
      "to": "2026-03-18T23:59:59.999999999"
    }
    "#);
}

#[test]
fn test_range_last_year_text() {
    let dealboard = DealboardTest::new();

    let output = dealboard.run_success(&["range", "last-year", "--today", "2026-03-18"]);
    assert!(output.contains("2025-01-01 .. 2025-12-31"));
}

#[test]
fn test_range_rejects_unknown_preset() {
    let dealboard = DealboardTest::new();

    let stderr = dealboard.run_failure(&["range", "fortnight"]);
    assert!(stderr.contains("invalid preset 'fortnight'"));
}

#[test]
fn test_detect_preset() {
    let dealboard = DealboardTest::new();

    let output = dealboard.run_success(&[
        "detect",
        "2026-01-01",
        "2026-12-31",
        "--today",
        "2026-03-18",
        "--json",
    ]);
    insta::assert_snapshot!(output, @r#"
    {
      "from": "2026-01-01",
      "preset": "this-year",
      "to": "2026-12-31"
    }
    "#);
}

#[test]
fn test_detect_custom_range() {
    let dealboard = DealboardTest::new();

    let output = dealboard.run_success(&[
        "detect",
        "2026-03-01",
        "2026-03-10",
        "--today",
        "2026-03-18",
        "--json",
    ]);
    insta::assert_snapshot!(output, @r#"
    {
      "from": "2026-03-01",
      "preset": null,
      "to": "2026-03-10"
    }
    "#);
}

#[test]
fn test_detect_rejects_reversed_range() {
    let dealboard = DealboardTest::new();

    let stderr = dealboard.run_failure(&["detect", "2026-03-10", "2026-03-01"]);
    assert!(stderr.contains("after end"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_show_empty() {
    let dealboard = DealboardTest::new();

    let output = dealboard.run_success(&["config", "show"]);
    assert!(output.contains("Configuration"));
    assert!(output.contains("not set"));
}

#[test]
fn test_config_set_and_get() {
    let dealboard = DealboardTest::new();

    dealboard.run_success(&["config", "set", "board.page_size", "25"]);
    let output = dealboard.run_success(&["config", "get", "board.page_size", "--json"]);
    insta::assert_snapshot!(output, @r#"
    {
      "key": "board.page_size",
      "value": "25"
    }
    "#);
    assert!(dealboard.read_config().contains("page_size: 25"));
}

#[test]
fn test_config_token_is_masked() {
    let dealboard = DealboardTest::new();

    let output = dealboard.run_success(&["config", "set", "api.token", "secret-token-1234"]);
    assert!(!output.contains("secret-token"));
    assert!(output.contains("****1234"));

    let output = dealboard.run_success(&["config", "show", "--json"]);
    assert!(output.contains("\"token_configured\": true"));
    assert!(!output.contains("secret-token"));
}

#[test]
fn test_config_rejects_bad_values() {
    let dealboard = DealboardTest::new();

    let stderr = dealboard.run_failure(&["config", "set", "api.base_url", "ftp://crm.example.com"]);
    assert!(stderr.contains("expected an http(s) URL"));

    let stderr = dealboard.run_failure(&["config", "set", "board.color", "blue"]);
    assert!(stderr.contains("unknown config key"));

    let stderr = dealboard.run_failure(&["config", "get", "board.color"]);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dealboard = DealboardTest::new();
    dealboard.write_config("board:\n  page_size: 0\n");

    let stderr = dealboard.run_failure(&["config", "show"]);
    assert!(stderr.contains("page_size"));
}

// ============================================================================
// Remote commands without a server
// ============================================================================

#[test]
fn test_board_requires_workspace() {
    let dealboard = DealboardTest::new();

    let stderr = dealboard.run_failure(&["board"]);
    assert!(stderr.contains("no workspace given"));
}

#[test]
fn test_board_requires_api_url() {
    let dealboard = DealboardTest::new();
    dealboard.write_config("default_workspace: ws-1\n");

    let stderr = dealboard.run_failure(&["board"]);
    assert!(stderr.contains("api.base_url is not configured"));
}

#[test]
fn test_batch_move_requires_stage() {
    let dealboard = DealboardTest::new();

    let stderr = dealboard.run_failure(&["batch", "move", "d1", "d2", "--yes"]);
    assert!(stderr.contains("--stage"));
}
