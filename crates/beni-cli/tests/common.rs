#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use tempfile::TempDir;

pub const GRAPH_CACHE_PATH: &str =
    "raw.githubusercontent.com/regro/cf-graph-countyfair/master/graph.json";
pub const MAPPING_CACHE_PATH: &str =
    "raw.githubusercontent.com/regro/cf-graph-countyfair/master/mappings/pypi/grayskull_pypi_mapping.yaml";

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

pub fn fixture(name: &str) -> PathBuf {
    fixture_file(name, "pyproject.toml")
}

pub fn fixture_file(name: &str, file: &str) -> PathBuf {
    workspace_root().join("fixtures").join(name).join(file)
}

/// A cache directory holding the fixture graph and mapping documents.
pub fn seeded_cache() -> TempDir {
    let cache = tempfile::Builder::new()
        .prefix("beni-cache")
        .tempdir()
        .expect("tempdir");
    let documents = workspace_root().join("fixtures").join("documents");
    seed(cache.path(), GRAPH_CACHE_PATH, &documents.join("graph.json"));
    seed(
        cache.path(),
        MAPPING_CACHE_PATH,
        &documents.join("grayskull_pypi_mapping.yaml"),
    );
    cache
}

fn seed(root: &Path, relative: &str, source: &Path) {
    let dest = root.join(relative);
    fs::create_dir_all(dest.parent().expect("parent")).expect("create cache dirs");
    fs::copy(source, dest).expect("seed cache entry");
}

/// `beni` pointed at `cache`, offline, with no interpreter to probe.
pub fn beni(cache: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("beni");
    cmd.env("BENI_CACHE_PATH", cache)
        .env("BENI_OFFLINE", "1")
        .env("BENI_PROGRESS", "0")
        .env("BENI_RUNTIME_PYTHON", "/nonexistent/python")
        .env_remove("BENI_GRAPH_URL")
        .env_remove("BENI_MAPPING_URL")
        .env_remove("BENI_CACHE_MAX_AGE");
    cmd
}

pub fn stdout(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}
