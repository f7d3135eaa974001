// src/exec/mod.rs

//! Concrete workers.
//!
//! - [`script`] backs every manifest-declared task with a shell process.
//! - [`builtin`] declares the built-in `dock` group tasks through the
//!   provider pattern.

pub mod builtin;
pub mod script;

pub use script::ScriptWorker;
