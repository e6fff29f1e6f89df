#![allow(dead_code)]

pub mod mock_api;
pub mod mock_data;

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

use dealboard::board::{BoardSettings, PipelineBoard};
use dealboard::filter::FilterStore;
use dealboard::types::WorkspaceId;
use jiff::civil::{Date, date};

/// Fixed anchor day so date presets resolve the same on every run
pub const TODAY: Date = date(2026, 3, 18);

/// Helper struct to run dealboard commands in an isolated temp directory
pub struct DealboardTest {
    pub temp_dir: TempDir,
    binary_path: &'static str,
}

impl DealboardTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        DealboardTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_dealboard"),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join(".dealboard")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(self.binary_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("DEALBOARD_ROOT", self.root())
            .env_remove("DEALBOARD_API_URL")
            .env_remove("DEALBOARD_API_TOKEN")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute dealboard command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn write_config(&self, content: &str) {
        fs::create_dir_all(self.root()).expect("Failed to create .dealboard directory");
        fs::write(self.root().join("config.yaml"), content).expect("Failed to write config");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.root().join("config.yaml")).expect("Failed to read config")
    }
}

/// A board for the mock workspace with a fixed anchor day
pub fn board(page_size: usize) -> PipelineBoard {
    board_with(BoardSettings {
        page_size,
        ..Default::default()
    })
}

pub fn board_with(settings: BoardSettings) -> PipelineBoard {
    PipelineBoard::new(
        WorkspaceId::new(mock_data::WORKSPACE),
        FilterStore::with_anchor(TODAY),
        settings,
    )
}
