//! Cross-crate scenario tests for the cellar workspace. All content lives in `tests/`.
