//! Development thread store used by the sidebar.
//! Run with: cargo run --bin thread-store-server

use std::process::ExitCode;

use chat_sidebar::start_sidebar;

fn main() -> ExitCode {
    start_sidebar::run_store_server()
}
