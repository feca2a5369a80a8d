use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

#[must_use]
pub fn socket_tests_required() -> bool {
    std::env::var("BULK_DL_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Returns true when localhost cannot be bound and the calling test should
/// return early.
///
/// Panics instead when `BULK_DL_REQUIRE_SOCKET_TESTS` is set.
#[track_caller]
#[must_use]
pub fn should_skip_socket_bound_test() -> bool {
    let Err(bind_error) = TcpListener::bind("127.0.0.1:0") else {
        return false;
    };

    let caller = Location::caller();
    assert!(
        !socket_tests_required(),
        "{}:{} needs a localhost listener but binding failed ({bind_error})",
        caller.file(),
        caller.line()
    );

    eprintln!(
        "skipping {}:{}: no localhost listener available ({bind_error})",
        caller.file(),
        caller.line()
    );
    true
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
