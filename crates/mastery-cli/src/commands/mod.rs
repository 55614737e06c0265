pub mod add_question;
pub mod advance;
pub mod enroll;
pub mod ingest;
pub mod init;
pub mod progress;
pub mod questions;
pub mod reset;
pub mod set_type;
pub mod topics;
pub mod validate;
