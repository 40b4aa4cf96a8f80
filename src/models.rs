//! Domain models that mirror the MongoDB document shape and get passed
//! throughout the TUI. The intent is that these types stay light-weight data
//! holders so other layers can focus on presentation and persistence logic.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A single student record as stored in the collection. Field defaults keep
/// deserialization tolerant of legacy documents that miss a field, matching
/// how the UI renders blanks instead of refusing to list anything.
pub struct Student {
    /// Identifier assigned by the store on insert. `None` only while a record
    /// is being composed in the form; skipping serialization lets the driver
    /// generate the id server-side.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Display name; validated non-empty before any write.
    #[serde(default)]
    pub name: String,
    /// Contact email; validated to contain an `@` before any write.
    #[serde(default)]
    pub email: String,
    /// Age in years; validated positive before any write.
    #[serde(default)]
    pub age: i64,
}

impl Student {
    /// Hex rendering of the id used as the selection key in the table. Rows
    /// carry the string form so the update/delete flows exercise the same id
    /// parsing path an external caller would.
    pub fn id_hex(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }

    /// Compose a `Name <email>` string for confirmation dialogs.
    pub fn summary(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// The validated `(name, email, age)` triple produced by the form and
/// consumed by insert/update. Keeping it a named struct stops the three
/// positional strings from getting swapped on the way to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFields {
    pub name: String,
    pub email: String,
    pub age: i64,
}
