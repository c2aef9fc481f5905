mod common;
mod download_tests;
mod manifest_tests;
