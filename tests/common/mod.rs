#![allow(dead_code)]

pub use spiceserver_test_utils::builders;
pub use spiceserver_test_utils::fake_netlister;
pub use spiceserver_test_utils::stub;
pub use spiceserver_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
