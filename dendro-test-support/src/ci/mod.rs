//! Environment-driven knobs shared by the CI and local test runs.

pub mod property_test_profile;
