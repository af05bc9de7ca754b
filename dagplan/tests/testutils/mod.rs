//! Test utilities for dagplan integration tests
//!
//! `PlanFixture` owns a planning context and the employee/dept/score
//! tables used across the suites.

pub mod plan_fixture;

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
