// src/watch/mod.rs

//! Filesystem watching: glob bindings, the coalescing re-run controller,
//! and the notify bridge feeding it.

pub mod controller;
pub mod patterns;
pub mod watcher;

pub use controller::{RegistryRunner, TaskRunner, WatchController, WatchEvent};
pub use patterns::{compile_bindings, BindingProfile, WatchBinding};
pub use watcher::{spawn_fs_watcher, WatcherHandle};
