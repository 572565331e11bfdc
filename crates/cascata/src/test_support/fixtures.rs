//! Publishing-catalog fixture domain shared by collector and executor
//! tests.
//!
//! Relation spread: a three-level cascade chain (publisher, book, chapter),
//! one relation per remaining policy, an auto-created join model, a
//! self-referential type, a restrict diamond, and an inheritance pair.

use crate::{
    model::{ModelType, RelationDescriptor, RelationPolicy, SetValue, Value},
    schema::Schema,
    store::{MemoryStore, Row},
};

pub const PUBLISHER: ModelType = ModelType::new("catalog::Publisher");
pub const BOOK: ModelType = ModelType::new("catalog::Book");
pub const CHAPTER: ModelType = ModelType::new("catalog::Chapter");
pub const LOAN: ModelType = ModelType::new("catalog::Loan");
pub const BOOKMARK: ModelType = ModelType::new("catalog::Bookmark");
pub const REVIEW: ModelType = ModelType::new("catalog::Review");
pub const ARCHIVE_ENTRY: ModelType = ModelType::new("catalog::ArchiveEntry");
pub const TAG: ModelType = ModelType::new("catalog::Tag");
pub const BOOK_TAG: ModelType = ModelType::new("catalog::BookTag");
pub const CATEGORY: ModelType = ModelType::new("catalog::Category");

pub const PROJECT: ModelType = ModelType::new("planner::Project");
pub const MILESTONE: ModelType = ModelType::new("planner::Milestone");
pub const WORKSTREAM: ModelType = ModelType::new("planner::Workstream");
pub const DELIVERABLE: ModelType = ModelType::new("planner::Deliverable");

pub const PERSON: ModelType = ModelType::new("staff::Person");
pub const EMPLOYEE: ModelType = ModelType::new("staff::Employee");
pub const BADGE: ModelType = ModelType::new("staff::Badge");

/// Sentinel book id the review set-default policy points reviews at.
pub const UNREVIEWED_BOOK: Value = Value::Uint(0);

/// Replacement archive target for the set-provider policy.
#[must_use]
pub fn archived_book() -> Value {
    Value::Uint(0)
}

/// Full catalog schema with every policy represented.
#[must_use]
pub fn catalog_schema() -> Schema {
    Schema::builder()
        .model(PUBLISHER, "id")
        .model(BOOK, "id")
        .model(CHAPTER, "id")
        .model(LOAN, "id")
        .model(BOOKMARK, "id")
        .model(REVIEW, "id")
        .model(ARCHIVE_ENTRY, "id")
        .model(TAG, "id")
        .join_model(BOOK_TAG, "id")
        .model(CATEGORY, "id")
        .relation(BOOK, "publisher", PUBLISHER, false, RelationPolicy::Cascade)
        .relation(CHAPTER, "book", BOOK, false, RelationPolicy::Cascade)
        .relation(LOAN, "book", BOOK, false, RelationPolicy::Protect)
        .relation(BOOKMARK, "book", BOOK, true, RelationPolicy::SetNull)
        .relation(REVIEW, "book", BOOK, false, RelationPolicy::SetDefault)
        .default_value(REVIEW, "book", UNREVIEWED_BOOK)
        .relation(
            ARCHIVE_ENTRY,
            "book",
            BOOK,
            true,
            RelationPolicy::Set(SetValue::Provider(archived_book)),
        )
        .relation(BOOK_TAG, "book", BOOK, false, RelationPolicy::Cascade)
        .relation(BOOK_TAG, "tag", TAG, false, RelationPolicy::Cascade)
        .relation(CATEGORY, "parent", CATEGORY, true, RelationPolicy::Cascade)
        .build()
        .expect("catalog schema should build")
}

/// One publisher, two books, five chapters.
pub fn seed_catalog(store: &MemoryStore) {
    store.insert(PUBLISHER, Value::Uint(1), Row::new());
    for book in [10, 11] {
        store.insert(
            BOOK,
            Value::Uint(book),
            Row::from([("publisher", Value::Uint(1))]),
        );
    }
    for chapter in [100, 101, 102] {
        store.insert(
            CHAPTER,
            Value::Uint(chapter),
            Row::from([("book", Value::Uint(10))]),
        );
    }
    for chapter in [103, 104] {
        store.insert(
            CHAPTER,
            Value::Uint(chapter),
            Row::from([("book", Value::Uint(11))]),
        );
    }
}

/// Restrict diamond: the deliverable is restricted through its milestone
/// and cascaded through its workstream, both hanging off one project.
#[must_use]
pub fn diamond_schema() -> Schema {
    Schema::builder()
        .model(PROJECT, "id")
        .model(MILESTONE, "id")
        .model(WORKSTREAM, "id")
        .model(DELIVERABLE, "id")
        .relation(MILESTONE, "project", PROJECT, false, RelationPolicy::Cascade)
        .relation(
            WORKSTREAM,
            "project",
            PROJECT,
            false,
            RelationPolicy::Cascade,
        )
        .relation(
            DELIVERABLE,
            "milestone",
            MILESTONE,
            false,
            RelationPolicy::Restrict,
        )
        .relation(
            DELIVERABLE,
            "workstream",
            WORKSTREAM,
            false,
            RelationPolicy::Cascade,
        )
        .build()
        .expect("diamond schema should build")
}

pub fn seed_diamond(store: &MemoryStore) {
    store.insert(PROJECT, Value::Uint(1), Row::new());
    store.insert(
        MILESTONE,
        Value::Uint(10),
        Row::from([("project", Value::Uint(1))]),
    );
    store.insert(
        WORKSTREAM,
        Value::Uint(20),
        Row::from([("project", Value::Uint(1))]),
    );
    store.insert(
        DELIVERABLE,
        Value::Uint(30),
        Row::from([
            ("milestone", Value::Uint(10)),
            ("workstream", Value::Uint(20)),
        ]),
    );
}

/// Inheritance pair plus a relation targeting the parent type.
#[must_use]
pub fn staff_schema() -> Schema {
    Schema::builder()
        .model(PERSON, "id")
        .model(EMPLOYEE, "id")
        .model(BADGE, "id")
        .parent_link(EMPLOYEE, "person", PERSON)
        .relation(BADGE, "person", PERSON, true, RelationPolicy::SetNull)
        .build()
        .expect("staff schema should build")
}

pub fn seed_staff(store: &MemoryStore) {
    store.insert(PERSON, Value::Uint(1), Row::new());
    store.insert(
        EMPLOYEE,
        Value::Uint(7),
        Row::from([("person", Value::Uint(1))]),
    );
    store.insert(
        BADGE,
        Value::Uint(70),
        Row::from([("person", Value::Uint(1))]),
    );
}

/// Two models cascading into each other through non-nullable references.
#[must_use]
pub fn mutual_cycle_schema() -> (ModelType, ModelType, Schema) {
    const ALPHA: ModelType = ModelType::new("cycle::Alpha");
    const BETA: ModelType = ModelType::new("cycle::Beta");

    let schema = Schema::builder()
        .model(ALPHA, "id")
        .model(BETA, "id")
        .relation_descriptor(RelationDescriptor::new(
            ALPHA,
            "beta",
            BETA,
            false,
            RelationPolicy::Cascade,
        ))
        .relation_descriptor(RelationDescriptor::new(
            BETA,
            "alpha",
            ALPHA,
            false,
            RelationPolicy::Cascade,
        ))
        .build()
        .expect("cycle schema should build");

    (ALPHA, BETA, schema)
}

pub fn seed_mutual_cycle(store: &MemoryStore, alpha: ModelType, beta: ModelType) {
    store.insert(alpha, Value::Uint(1), Row::from([("beta", Value::Uint(2))]));
    store.insert(beta, Value::Uint(2), Row::from([("alpha", Value::Uint(1))]));
}
