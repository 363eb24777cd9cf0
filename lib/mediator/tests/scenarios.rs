use datafusion::arrow::array::{ArrayRef, Int64Array, StringArray};
use datafusion::arrow::record_batch::RecordBatch;
use mediator::common::{MediationError, SourceRegistry};
use mediator::engine::{QueryResults, QuerySolutions};
use mediator::model::{Literal, NamedNode, Term};
use mediator::storage::{GraphOntology, RelationalSource, TableDescriptor};
use mediator::{Mediator, MediatorOptions};
use oxrdfio::RdfFormat;
use std::sync::Arc;

const ONTOLOGY: &str = r#"
    @prefix owl: <http://www.w3.org/2002/07/owl#> .
    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
    @prefix fed: <http://ex.org/FEDERATED/> .

    fed:Person a owl:Class .
    fed:User a owl:Class ; rdfs:subClassOf fed:Person .
    <http://ex.org/KMS/User> rdfs:subClassOf fed:User .
    <http://ex.org/LMS/Account> rdfs:subClassOf fed:User .

    <http://ex.org/KMS/User#EMAIL> a owl:InverseFunctionalProperty ;
        owl:equivalentProperty <http://ex.org/FEDERATED/User#email> .
    <http://ex.org/LMS/Account#MAIL> a owl:InverseFunctionalProperty ;
        owl:equivalentProperty <http://ex.org/FEDERATED/User#email> .
    <http://ex.org/KMS/User#NAME> owl:equivalentProperty <http://ex.org/FEDERATED/User#name> .
    <http://ex.org/KMS/User#DISPLAY_NAME> owl:equivalentProperty <http://ex.org/FEDERATED/User#name> .

    <http://ex.org/KMS/User#Enrollment> a owl:ObjectProperty ;
        rdfs:range <http://ex.org/KMS/Course> .
"#;

const ALICE: &str = "http://ex.org/FEDERATED/User/KMS.ID.1.LMS.ID.7";

fn column(values: Vec<&str>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

fn ids(values: Vec<i64>) -> ArrayRef {
    Arc::new(Int64Array::from(values))
}

fn kms() -> RelationalSource {
    let mut source = RelationalSource::new("KMS");
    let users = RecordBatch::try_from_iter(vec![
        ("ID", ids(vec![1, 2])),
        ("NAME", column(vec!["Alex Cole", "Bob"])),
        ("DISPLAY_NAME", column(vec!["Alexander Cole", "Bob"])),
        ("EMAIL", column(vec!["alice@x.org", "bob@x.org"])),
    ])
    .unwrap();
    source
        .register_batch(TableDescriptor::new("User").with_primary_key("ID"), users)
        .unwrap();

    let courses = RecordBatch::try_from_iter(vec![
        ("ID", ids(vec![3, 4, 5])),
        ("TITLE", column(vec!["Rust", "SPARQL", "OWL"])),
    ])
    .unwrap();
    source
        .register_batch(TableDescriptor::new("Course").with_primary_key("ID"), courses)
        .unwrap();

    let enrollments = RecordBatch::try_from_iter(vec![
        ("USER_ID", ids(vec![1, 2])),
        ("COURSE_ID", ids(vec![3, 4])),
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

fn lms() -> RelationalSource {
    let mut source = RelationalSource::new("LMS");
    let accounts = RecordBatch::try_from_iter(vec![
        ("ID", ids(vec![7, 8])),
        ("FULL_NAME", column(vec!["Alex Cole", "Carol"])),
        ("MAIL", column(vec!["alice@x.org", "carol@x.org"])),
    ])
    .unwrap();
    source
        .register_batch(TableDescriptor::new("Account").with_primary_key("ID"), accounts)
        .unwrap();
    source
}

fn mediator_with(options: MediatorOptions) -> Mediator {
    let registry = SourceRegistry::new()
        .with_source("http://ex.org/KMS/", Arc::new(kms()))
        .unwrap()
        .with_source("http://ex.org/LMS/", Arc::new(lms()))
        .unwrap();
    let ontology =
        GraphOntology::from_reader(RdfFormat::Turtle, None, ONTOLOGY.as_bytes()).unwrap();
    Mediator::new_with_options(registry, Arc::new(ontology), options)
}

fn mediator() -> Mediator {
    mediator_with(MediatorOptions::default())
}

async fn select(mediator: &Mediator, query: &str) -> QuerySolutions {
    match mediator.query(query).await.unwrap() {
        QueryResults::Solutions(solutions) => solutions,
        _ => panic!("expected solutions"),
    }
}

fn iri(value: &str) -> Term {
    NamedNode::new_unchecked(value).into()
}

#[tokio::test]
async fn individuals_sharing_an_ifp_value_are_fused() {
    let solutions = select(
        &mediator(),
        "SELECT ?u1 ?u2 WHERE {
            ?u1 <http://ex.org/KMS/User#EMAIL> ?e .
            ?u2 <http://ex.org/LMS/Account#MAIL> ?e
        }",
    )
    .await;

    assert_eq!(solutions.len(), 1);
    let solution = solutions.iter().next().unwrap();
    assert_eq!(solution.get("u1"), Some(&iri(ALICE)));
    assert_eq!(solution.get("u2"), Some(&iri(ALICE)));
}

#[tokio::test]
async fn bound_subject_returns_its_column_value() {
    let solutions = select(
        &mediator(),
        "SELECT ?x WHERE { <http://ex.org/KMS/User/ID.2> <http://ex.org/KMS/User#NAME> ?x }",
    )
    .await;

    assert_eq!(
        solutions.values_of("x").collect::<Vec<_>>(),
        vec![Some(&Literal::new_simple_literal("Bob").into())]
    );
}

#[tokio::test]
async fn non_string_columns_are_typed() {
    let solutions = select(
        &mediator(),
        "SELECT ?id WHERE { <http://ex.org/KMS/Course/ID.3> <http://ex.org/KMS/Course#ID> ?id }",
    )
    .await;

    assert_eq!(
        solutions.values_of("id").collect::<Vec<_>>(),
        vec![Some(&Literal::from(3_i64).into())]
    );
}

#[tokio::test]
async fn bound_federated_subject_is_rejected() {
    let result = mediator()
        .query(
            "SELECT ?e WHERE { <http://ex.org/FEDERATED/User/KMS.ID.1> <http://ex.org/FEDERATED/User#email> ?e }",
        )
        .await;

    assert!(matches!(
        result,
        Err(MediationError::FederatedSubjectMustBePattern(_))
    ));
}

#[tokio::test]
async fn association_table_is_joined() {
    let solutions = select(
        &mediator(),
        "SELECT ?s WHERE { ?s <http://ex.org/KMS/User#Enrollment> <http://ex.org/KMS/Course/ID.3> }",
    )
    .await;
    // No IFP triple is derived, so nothing is fused.
    assert_eq!(
        solutions.values_of("s").collect::<Vec<_>>(),
        vec![Some(&iri("http://ex.org/KMS/User/ID.1"))]
    );

    let solutions = select(
        &mediator(),
        "SELECT ?s WHERE { ?s <http://ex.org/KMS/User#Enrollment> <http://ex.org/KMS/Course/ID.5> }",
    )
    .await;
    assert!(solutions.is_empty());
}

#[tokio::test]
async fn bound_subject_with_object_property_is_joined() {
    let solutions = select(
        &mediator(),
        "SELECT ?c WHERE { <http://ex.org/KMS/User/ID.1> <http://ex.org/KMS/User#Enrollment> ?c }",
    )
    .await;
    assert_eq!(
        solutions.values_of("c").collect::<Vec<_>>(),
        vec![Some(&iri("http://ex.org/KMS/Course/ID.3"))]
    );

    let enrolled = mediator()
        .query(
            "ASK { <http://ex.org/KMS/User/ID.1> <http://ex.org/KMS/User#Enrollment> <http://ex.org/KMS/Course/ID.3> }",
        )
        .await
        .unwrap();
    assert!(matches!(enrolled, QueryResults::Boolean(true)));
}

#[tokio::test]
async fn federated_property_returns_fused_entities() {
    let solutions = select(
        &mediator(),
        "SELECT ?u ?e WHERE { ?u <http://ex.org/FEDERATED/User#email> ?e }",
    )
    .await;

    let mut emails = solutions
        .iter()
        .map(|solution| {
            (
                solution.get("u").map(ToString::to_string),
                solution.get("e").map(ToString::to_string),
            )
        })
        .collect::<Vec<_>>();
    emails.sort();
    assert_eq!(
        emails,
        vec![
            (Some(format!("<{ALICE}>")), Some("\"alice@x.org\"".to_owned())),
            (
                Some("<http://ex.org/FEDERATED/User/KMS.ID.2>".to_owned()),
                Some("\"bob@x.org\"".to_owned())
            ),
            (
                Some("<http://ex.org/FEDERATED/User/LMS.ID.8>".to_owned()),
                Some("\"carol@x.org\"".to_owned())
            ),
        ]
    );
}

#[tokio::test]
async fn conflicting_names_are_concatenated_under_a_strict_threshold() {
    // KMS/User#NAME and KMS/User#DISPLAY_NAME both map to the federated name.
    let mediator = mediator_with(MediatorOptions {
        ambiguity_threshold: 2,
    });
    let solutions = select(
        &mediator,
        "SELECT ?n WHERE {
            ?u <http://ex.org/FEDERATED/User#name> ?n .
            ?u <http://ex.org/FEDERATED/User#email> \"alice@x.org\"
        }",
    )
    .await;

    assert_eq!(
        solutions.values_of("n").collect::<Vec<_>>(),
        vec![Some(
            &Literal::new_simple_literal("Alexander Cole; Alex Cole").into()
        )]
    );
}

#[tokio::test]
async fn conflicting_names_keep_the_longer_value_by_default() {
    let solutions = select(
        &mediator(),
        "SELECT ?n WHERE {
            ?u <http://ex.org/FEDERATED/User#name> ?n .
            ?u <http://ex.org/FEDERATED/User#email> \"alice@x.org\"
        }",
    )
    .await;

    assert_eq!(
        solutions.values_of("n").collect::<Vec<_>>(),
        vec![Some(&Literal::new_simple_literal("Alexander Cole").into())]
    );
}

#[tokio::test]
async fn ask_and_construct_over_sources() {
    let mediator = mediator();
    assert!(matches!(
        mediator
            .query("ASK { ?c <http://ex.org/KMS/Course#TITLE> \"OWL\" }")
            .await
            .unwrap(),
        QueryResults::Boolean(true)
    ));

    let QueryResults::Graph(triples) = mediator
        .query(
            "CONSTRUCT { ?c <http://ex.org/title> ?t } WHERE { ?c <http://ex.org/KMS/Course#TITLE> ?t FILTER(?t = \"Rust\") }",
        )
        .await
        .unwrap()
    else {
        panic!("expected a graph");
    };
    assert_eq!(triples.len(), 1);
}
