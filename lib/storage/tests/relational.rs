use datafusion::arrow::array::{ArrayRef, Int64Array, StringArray};
use datafusion::arrow::record_batch::RecordBatch;
use mediator_common::{
    ObjectPropertyJoin, RawObject, RawTriple, SourceError, SourceLoader, SubjectFetch,
};
use mediator_model::vocab::xsd;
use mediator_storage::{RelationalSource, TableDescriptor};
use std::sync::Arc;

const PREFIX: &str = "http://ex.org/";

fn source() -> RelationalSource {
    let mut source = RelationalSource::new("KMS");

    let users = RecordBatch::try_from_iter(vec![
        ("ID", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
        (
            "NAME",
            Arc::new(StringArray::from(vec!["Alice", "Bob", "Carol"])) as ArrayRef,
        ),
        (
            "AGE",
            Arc::new(Int64Array::from(vec![Some(42), None, Some(23)])) as ArrayRef,
        ),
        (
            "DEPT_ID",
            Arc::new(Int64Array::from(vec![Some(10), Some(10), None])) as ArrayRef,
        ),
    ])
    .unwrap();
    source
        .register_batch(
            TableDescriptor::new("User")
                .with_primary_key("ID")
                .with_foreign_key("DEPT_ID", "Department"),
            users,
        )
        .unwrap();

    let departments = RecordBatch::try_from_iter(vec![
        ("ID", Arc::new(Int64Array::from(vec![10])) as ArrayRef),
        ("LABEL", Arc::new(StringArray::from(vec!["Research"])) as ArrayRef),
    ])
    .unwrap();
    source
        .register_batch(TableDescriptor::new("Department").with_primary_key("ID"), departments)
        .unwrap();

    let courses = RecordBatch::try_from_iter(vec![
        ("ID", Arc::new(Int64Array::from(vec![3, 4])) as ArrayRef),
        ("TITLE", Arc::new(StringArray::from(vec!["Rust", "SPARQL"])) as ArrayRef),
    ])
    .unwrap();
    source
        .register_batch(TableDescriptor::new("Course").with_primary_key("ID"), courses)
        .unwrap();

    let enrollments = RecordBatch::try_from_iter(vec![
        ("USER_ID", Arc::new(Int64Array::from(vec![1, 2, 1])) as ArrayRef),
        ("COURSE_ID", Arc::new(Int64Array::from(vec![3, 4, 4])) as ArrayRef),
    ])
    .unwrap();
    source
        .register_batch(
            TableDescriptor::new("Enrollment")
                .with_foreign_key("USER_ID", "User")
                .with_foreign_key("COURSE_ID", "Course"),
            enrollments,
        )
        .unwrap();

    source
}

fn subject_fetch(pk_value: &str) -> SubjectFetch {
    SubjectFetch {
        table: "User".to_owned(),
        pk_column: "ID".to_owned(),
        pk_value: pk_value.to_owned(),
        predicate_column: None,
        object: None,
    }
}

fn sorted(mut triples: Vec<RawTriple>) -> Vec<RawTriple> {
    triples.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
    triples
}

#[tokio::test]
async fn list_tables_in_registration_order() {
    assert_eq!(
        source().list_tables().await.unwrap(),
        vec!["User", "Department", "Course", "Enrollment"]
    );
}

#[tokio::test]
async fn keys_are_looked_up_in_catalog() {
    let source = source();
    assert_eq!(source.primary_key("User").await.unwrap(), "ID");
    assert_eq!(
        source
            .foreign_key_referencing("Enrollment", "Course")
            .await
            .unwrap(),
        Some("COURSE_ID".to_owned())
    );
    assert!(matches!(
        source.primary_key("Enrollment").await,
        Err(SourceError::MissingPrimaryKey(_))
    ));
    assert!(matches!(
        source.primary_key("Missing").await,
        Err(SourceError::UnknownTable(_))
    ));
}

#[test]
fn register_rejects_unknown_key_column() {
    let batch = RecordBatch::try_from_iter(vec![(
        "ID",
        Arc::new(Int64Array::from(vec![1])) as ArrayRef,
    )])
    .unwrap();
    let result = RelationalSource::new("KMS")
        .register_batch(TableDescriptor::new("User").with_primary_key("PK"), batch);
    assert!(matches!(result, Err(SourceError::UnknownColumn { .. })));
}

#[tokio::test]
async fn fetch_subject_returns_non_null_columns() {
    let triples = source()
        .fetch_for_subject(PREFIX, &subject_fetch("2"))
        .await
        .unwrap();
    assert_eq!(
        sorted(triples),
        vec![
            RawTriple::new(
                "http://ex.org/KMS/User/ID.2",
                "http://ex.org/KMS/User#DEPT_ID",
                RawObject::Literal {
                    value: "10".to_owned(),
                    datatype: Some(xsd::INTEGER.into_owned())
                }
            ),
            RawTriple::new(
                "http://ex.org/KMS/User/ID.2",
                "http://ex.org/KMS/User#ID",
                RawObject::Literal {
                    value: "2".to_owned(),
                    datatype: Some(xsd::INTEGER.into_owned())
                }
            ),
            RawTriple::new(
                "http://ex.org/KMS/User/ID.2",
                "http://ex.org/KMS/User#NAME",
                RawObject::plain("Bob")
            ),
        ]
    );
}

#[tokio::test]
async fn fetch_subject_with_column_and_value() {
    let source = source();
    let mut fetch = subject_fetch("1");
    fetch.predicate_column = Some("NAME".to_owned());
    assert_eq!(
        source.fetch_for_subject(PREFIX, &fetch).await.unwrap(),
        vec![RawTriple::new(
            "http://ex.org/KMS/User/ID.1",
            "http://ex.org/KMS/User#NAME",
            RawObject::plain("Alice")
        )]
    );

    fetch.object = Some("Bob".to_owned());
    assert!(source
        .fetch_for_subject(PREFIX, &fetch)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn fetch_subject_with_unknown_column_fails() {
    let mut fetch = subject_fetch("1");
    fetch.predicate_column = Some("EMAIL".to_owned());
    let result = source().fetch_for_subject(PREFIX, &fetch).await;
    assert!(matches!(result, Err(SourceError::UnknownColumn { .. })));
}

#[tokio::test]
async fn fetch_predicate_skips_nulls() {
    let triples = source()
        .fetch_for_predicate_object(PREFIX, "User", "AGE", None)
        .await
        .unwrap();
    let subjects = sorted(triples)
        .into_iter()
        .map(|t| t.subject)
        .collect::<Vec<_>>();
    assert_eq!(
        subjects,
        vec!["http://ex.org/KMS/User/ID.1", "http://ex.org/KMS/User/ID.3"]
    );
}

#[tokio::test]
async fn fetch_predicate_with_object() {
    let triples = source()
        .fetch_for_predicate_object(PREFIX, "User", "NAME", Some("Carol"))
        .await
        .unwrap();
    assert_eq!(
        triples,
        vec![RawTriple::new(
            "http://ex.org/KMS/User/ID.3",
            "http://ex.org/KMS/User#NAME",
            RawObject::plain("Carol")
        )]
    );
}

#[tokio::test]
async fn join_via_association_table() {
    let join = ObjectPropertyJoin {
        lhs_table: "User".to_owned(),
        assoc_table: "Enrollment".to_owned(),
        rhs_table: "Course".to_owned(),
        object_pk: Some("4".to_owned()),
    };
    let triples = sorted(
        source()
            .fetch_for_object_property_join(PREFIX, &join)
            .await
            .unwrap(),
    );
    assert_eq!(
        triples,
        vec![
            RawTriple::new(
                "http://ex.org/KMS/User/ID.1",
                "http://ex.org/KMS/User#Enrollment",
                RawObject::Iri("http://ex.org/KMS/Course/ID.4".to_owned())
            ),
            RawTriple::new(
                "http://ex.org/KMS/User/ID.2",
                "http://ex.org/KMS/User#Enrollment",
                RawObject::Iri("http://ex.org/KMS/Course/ID.4".to_owned())
            ),
        ]
    );
}

#[tokio::test]
async fn join_via_association_table_without_match() {
    let join = ObjectPropertyJoin {
        lhs_table: "User".to_owned(),
        assoc_table: "Enrollment".to_owned(),
        rhs_table: "Course".to_owned(),
        object_pk: Some("99".to_owned()),
    };
    assert!(source()
        .fetch_for_object_property_join(PREFIX, &join)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn join_via_foreign_key() {
    let join = ObjectPropertyJoin {
        lhs_table: "User".to_owned(),
        assoc_table: "Dept".to_owned(),
        rhs_table: "Department".to_owned(),
        object_pk: None,
    };
    let triples = sorted(
        source()
            .fetch_for_object_property_join(PREFIX, &join)
            .await
            .unwrap(),
    );
    assert_eq!(triples.len(), 2);
    assert_eq!(triples[0].predicate, "http://ex.org/KMS/User#Dept");
    assert_eq!(
        triples[0].object,
        RawObject::Iri("http://ex.org/KMS/Department/ID.10".to_owned())
    );
}

#[tokio::test]
async fn join_without_foreign_key_fails() {
    let join = ObjectPropertyJoin {
        lhs_table: "Course".to_owned(),
        assoc_table: "Course".to_owned(),
        rhs_table: "User".to_owned(),
        object_pk: None,
    };
    let result = source().fetch_for_object_property_join(PREFIX, &join).await;
    assert!(matches!(result, Err(SourceError::MissingForeignKey { .. })));
}
