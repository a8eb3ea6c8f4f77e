//! Logic layer of the school result-management portal: a line-delimited
//! JSON daemon the desktop shell drives over stdin/stdout. It consumes
//! the school's REST backend and owns everything the old views each
//! reimplemented for themselves: grading bands, mark bounds, subject
//! ordering and the statement-of-marks assembly.

pub mod api;
pub mod calc;
pub mod ipc;
pub mod report;
pub mod session;
pub mod subjects;
pub mod validators;
