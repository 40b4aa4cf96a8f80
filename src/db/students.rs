//! The four CRUD operations plus search against the students collection.
//! Every function takes the tagged [`Store`] and reports absence of a handle
//! as a connection error before touching the driver, so a failed startup
//! connection degrades every action into a status message instead of a panic.

use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::sync::Cursor;

use super::connection::Store;
use super::error::StoreError;
use crate::models::{Student, StudentFields};

/// Sort specification shared by listing and search so both views present the
/// same newest-first order. Descending `_id` looks like most-recent-first,
/// though the id order is store-defined rather than creation-time-guaranteed.
fn newest_first() -> Document {
    doc! {"_id": -1}
}

/// Build the `$or` filter for a search query, or `None` when the query is
/// blank and the caller should list everything. The query text is escaped so
/// regex metacharacters match literally, and `$options: "i"` makes the
/// substring match case-insensitive.
fn search_filter(query: &str) -> Option<Document> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    let pattern = regex::escape(trimmed);
    let matcher = doc! {"$regex": &pattern, "$options": "i"};
    Some(doc! {"$or": [{"name": matcher.clone()}, {"email": matcher}]})
}

/// Parse a table-row id back into an ObjectId. A malformed id is its own
/// error class, distinct from both "not found" and backend failures.
pub fn parse_record_id(raw: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

/// Fetch every record, newest first. An empty collection yields an empty vec.
pub fn list_students(store: &Store) -> Result<Vec<Student>, StoreError> {
    let handle = store.handle()?;
    let cursor = handle.students().find(doc! {}).sort(newest_first()).run()?;
    collect_students(cursor)
}

/// Case-insensitive literal substring search across name and email. A blank
/// query behaves exactly like [`list_students`].
pub fn search_students(store: &Store, query: &str) -> Result<Vec<Student>, StoreError> {
    let handle = store.handle()?;
    let filter = search_filter(query).unwrap_or_default();
    let cursor = handle.students().find(filter).sort(newest_first()).run()?;
    collect_students(cursor)
}

/// Persist a new record from validated fields. The store assigns the id.
pub fn insert_student(store: &Store, fields: &StudentFields) -> Result<(), StoreError> {
    let handle = store.handle()?;
    let student = Student {
        id: None,
        name: fields.name.clone(),
        email: fields.email.clone(),
        age: fields.age,
    };
    handle.students().insert_one(&student).run()?;
    Ok(())
}

/// Replace all three fields of the record matching `id`. Returns whether a
/// record matched; a missing record is a no-op, not an error.
pub fn update_student(store: &Store, id: &str, fields: &StudentFields) -> Result<bool, StoreError> {
    let handle = store.handle()?;
    let oid = parse_record_id(id)?;
    let update = doc! {"$set": {
        "name": fields.name.as_str(),
        "email": fields.email.as_str(),
        "age": fields.age,
    }};
    let outcome = handle.students().update_one(doc! {"_id": oid}, update).run()?;
    Ok(outcome.matched_count > 0)
}

/// Remove the record matching `id`. Returns whether anything was deleted; a
/// missing record is a no-op, not an error.
pub fn delete_student(store: &Store, id: &str) -> Result<bool, StoreError> {
    let handle = store.handle()?;
    let oid = parse_record_id(id)?;
    let outcome = handle.students().delete_one(doc! {"_id": oid}).run()?;
    Ok(outcome.deleted_count > 0)
}

fn collect_students(cursor: Cursor<Student>) -> Result<Vec<Student>, StoreError> {
    let mut students = Vec::new();
    for result in cursor {
        students.push(result?);
    }
    Ok(students)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disconnected() -> Store {
        Store::Disconnected {
            reason: "server selection timed out".to_string(),
        }
    }

    fn sample_fields() -> StudentFields {
        StudentFields {
            name: "Ann".to_string(),
            email: "a@b.com".to_string(),
            age: 21,
        }
    }

    #[test]
    fn blank_queries_produce_no_filter() {
        assert!(search_filter("").is_none());
        assert!(search_filter("   ").is_none());
    }

    #[test]
    fn search_filter_matches_name_or_email_case_insensitively() {
        let filter = search_filter("ann").expect("filter for non-blank query");
        let clauses = filter.get_array("$or").expect("$or clause");
        assert_eq!(clauses.len(), 2);

        let name_clause = clauses[0]
            .as_document()
            .and_then(|clause| clause.get_document("name").ok())
            .expect("name matcher");
        assert_eq!(name_clause.get_str("$regex").unwrap(), "ann");
        assert_eq!(name_clause.get_str("$options").unwrap(), "i");

        let email_clause = clauses[1]
            .as_document()
            .and_then(|clause| clause.get_document("email").ok())
            .expect("email matcher");
        assert_eq!(email_clause.get_str("$regex").unwrap(), "ann");
    }

    #[test]
    fn regex_metacharacters_are_escaped_to_match_literally() {
        let filter = search_filter("a.b*").expect("filter");
        let clauses = filter.get_array("$or").unwrap();
        let name_clause = clauses[0]
            .as_document()
            .and_then(|clause| clause.get_document("name").ok())
            .unwrap();
        assert_eq!(name_clause.get_str("$regex").unwrap(), "a\\.b\\*");
    }

    #[test]
    fn query_whitespace_is_trimmed_before_matching() {
        let filter = search_filter("  lee ").expect("filter");
        let clauses = filter.get_array("$or").unwrap();
        let name_clause = clauses[0]
            .as_document()
            .and_then(|clause| clause.get_document("name").ok())
            .unwrap();
        assert_eq!(name_clause.get_str("$regex").unwrap(), "lee");
    }

    #[test]
    fn listings_sort_by_descending_id() {
        assert_eq!(newest_first().get_i32("_id").unwrap(), -1);
    }

    #[test]
    fn well_formed_ids_parse() {
        let oid = ObjectId::new();
        let parsed = parse_record_id(&oid.to_hex()).expect("round-trip parse");
        assert_eq!(parsed, oid);
    }

    #[test]
    fn malformed_ids_are_invalid_id_not_backend_errors() {
        match parse_record_id("not-an-id") {
            Err(StoreError::InvalidId(raw)) => assert_eq!(raw, "not-an-id"),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn operations_against_a_disconnected_store_report_the_connection() {
        let store = disconnected();
        assert!(matches!(
            list_students(&store),
            Err(StoreError::Disconnected(_))
        ));
        assert!(matches!(
            search_students(&store, "ann"),
            Err(StoreError::Disconnected(_))
        ));
        assert!(matches!(
            insert_student(&store, &sample_fields()),
            Err(StoreError::Disconnected(_))
        ));
        // The handle check runs before id parsing, so even a malformed id
        // reports the missing connection first.
        assert!(matches!(
            update_student(&store, "not-an-id", &sample_fields()),
            Err(StoreError::Disconnected(_))
        ));
        assert!(matches!(
            delete_student(&store, "not-an-id"),
            Err(StoreError::Disconnected(_))
        ));
    }
}
