//! rvd end-to-end harness entry point

fn main() {
    rvd_e2e::cli::run();
}
