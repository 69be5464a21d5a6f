//! Compiler Client (C7) and Library Recommender (C8).

pub mod compiler;
pub mod recommend;

pub use compiler::CompilerClient;
pub use recommend::{extract_library_names, recommend, render_section};
