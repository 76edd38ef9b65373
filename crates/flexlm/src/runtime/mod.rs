//! Runtime module — binary lifecycle: boot, run until the log ends or Ctrl-C.

pub mod boot;
pub mod run;
