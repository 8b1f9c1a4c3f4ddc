//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, job ids, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Name of the user registered in every test server
pub const TEST_USER_NAME: &str = "Test User";

/// Email of the user registered in every test server
pub const TEST_USER_EMAIL: &str = "testuser@example.com";

/// Password of the user registered in every test server
pub const TEST_PASS: &str = "testpass123";

/// Secret the test servers sign tokens with
pub const TEST_JWT_SECRET: &str = "e2e-test-secret";

// ============================================================================
// Seeded Jobs
// ============================================================================

/// Most recently posted seeded job
pub const JOB_1_ID: &str = "0b7a4f6e-5d2c-4c1e-9a43-2f8d3c9e1a01";
pub const JOB_1_TITLE: &str = "Senior Rust Engineer";

pub const JOB_2_ID: &str = "0b7a4f6e-5d2c-4c1e-9a43-2f8d3c9e1a02";
pub const JOB_2_TITLE: &str = "Backend Developer";

/// Oldest seeded job
pub const JOB_3_ID: &str = "0b7a4f6e-5d2c-4c1e-9a43-2f8d3c9e1a03";
pub const JOB_3_TITLE: &str = "Data Engineer";

pub const SEEDED_JOBS_COUNT: usize = 3;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
