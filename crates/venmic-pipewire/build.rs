//! Build script for venmic-pipewire.
//!
//! Checks that libpipewire is available.

fn main() {
    if let Err(e) = pkg_config::probe_library("libpipewire-0.3") {
        eprintln!("Warning: libpipewire-0.3 not found: {e}");
        eprintln!("Install pipewire-devel (Fedora) or libpipewire-0.3-dev (Debian/Ubuntu)");
        // The crate still compiles without it, linking is what fails
    }
}
