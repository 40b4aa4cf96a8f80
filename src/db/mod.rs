//! Persistence module split across logical submodules.

mod connection;
mod error;
mod students;

pub use connection::{Store, StoreConfig, StoreHandle};
pub use error::StoreError;
pub use students::{
    delete_student, insert_student, list_students, parse_record_id, search_students,
    update_student,
};
