use mediator_model::{Term, Triple, Variable, VariableRef};
use oxrdfio::{RdfFormat, RdfSerializer};
use sparesults::{QueryResultsFormat, QueryResultsSerializer};
use std::io::{self, Write};
use std::sync::Arc;

pub use sparesults::QuerySolution;

/// Results of a mediated [SPARQL query](https://www.w3.org/TR/sparql11-query/).
#[derive(Debug)]
pub enum QueryResults {
    /// Results of a [SELECT](https://www.w3.org/TR/sparql11-query/#select) query.
    Solutions(QuerySolutions),
    /// Result of a [ASK](https://www.w3.org/TR/sparql11-query/#ask) query.
    Boolean(bool),
    /// Results of a [CONSTRUCT](https://www.w3.org/TR/sparql11-query/#construct) query.
    Graph(Vec<Triple>),
}

impl QueryResults {
    /// Writes the query results (solutions or boolean).
    ///
    /// Graph results are written as a table of `?subject ?predicate ?object` solutions.
    pub fn write<W: Write>(self, writer: W, format: QueryResultsFormat) -> io::Result<W> {
        let serializer = QueryResultsSerializer::from_format(format);
        match self {
            Self::Boolean(value) => serializer.serialize_boolean_to_writer(writer, value),
            Self::Solutions(solutions) => {
                let mut serializer = serializer
                    .serialize_solutions_to_writer(writer, solutions.variables().to_vec())?;
                for solution in &solutions {
                    serializer.serialize(solution)?;
                }
                serializer.finish()
            }
            Self::Graph(triples) => {
                let s = VariableRef::new_unchecked("subject");
                let p = VariableRef::new_unchecked("predicate");
                let o = VariableRef::new_unchecked("object");
                let mut serializer = serializer.serialize_solutions_to_writer(
                    writer,
                    vec![s.into_owned(), p.into_owned(), o.into_owned()],
                )?;
                for triple in triples {
                    let subject: Term = triple.subject.into();
                    let predicate: Term = triple.predicate.into();
                    serializer.serialize([
                        (s, &subject),
                        (p, &predicate),
                        (o, &triple.object),
                    ])?;
                }
                serializer.finish()
            }
        }
    }

    /// Writes the graph query results.
    ///
    /// This method fails if it is called on the `Solution` or `Boolean` results.
    pub fn write_graph<W: Write>(self, writer: W, format: impl Into<RdfFormat>) -> io::Result<W> {
        let Self::Graph(triples) = self else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Only graph results can be serialized as RDF",
            ));
        };
        let mut serializer = RdfSerializer::from_format(format.into()).for_writer(writer);
        for triple in &triples {
            serializer.serialize_triple(triple)?;
        }
        serializer.finish()
    }
}

/// The solutions of a SELECT query.
#[derive(Debug, PartialEq)]
pub struct QuerySolutions {
    variables: Arc<[Variable]>,
    solutions: Vec<QuerySolution>,
}

impl QuerySolutions {
    pub fn new(variables: Arc<[Variable]>, solutions: Vec<QuerySolution>) -> Self {
        Self {
            variables,
            solutions,
        }
    }

    /// The variables used in the solutions.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuerySolution> {
        self.solutions.iter()
    }

    /// Returns the values bound to `variable` in all solutions.
    pub fn values_of<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = Option<&'a Term>> + 'a {
        self.solutions
            .iter()
            .map(move |solution| solution.get(variable))
    }
}

impl IntoIterator for QuerySolutions {
    type Item = QuerySolution;
    type IntoIter = std::vec::IntoIter<QuerySolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySolutions {
    type Item = &'a QuerySolution;
    type IntoIter = std::slice::Iter<'a, QuerySolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}
