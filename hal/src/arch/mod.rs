//! # Platform Transports
//!
//! This module re-exports the passthrough transport for the host platform.
//! Only Linux SG_IO is implemented; other hosts get the trait and the
//! scripted transport, nothing else.

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", feature = "sg-io"))] {
        pub mod linux;

        // Re-export the current platform's transport
        pub use linux as current;
    }
}
