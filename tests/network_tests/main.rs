//! Network test suite

mod session_tests;
