//! Builds the SQL statements issued against a relational source.
//!
//! Identifiers are always quoted so that DataFusion keeps their case. Comparisons are done on the
//! string representation of a column, as the mediator only knows the lexical value of a term.

fn identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn equals(column: &str, value: &str) -> String {
    format!("CAST({} AS VARCHAR) = {}", identifier(column), literal(value))
}

/// Selects the row of `table` whose `pk` equals `pk_value`.
pub(super) fn select_row(table: &str, pk: &str, pk_value: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {}",
        identifier(table),
        equals(pk, pk_value)
    )
}

/// Selects `(pk, column)` for all rows with a non-null `column`, optionally restricted to rows
/// whose column equals `value`.
pub(super) fn select_column(table: &str, pk: &str, column: &str, value: Option<&str>) -> String {
    let filter = match value {
        Some(value) => equals(column, value),
        None => format!("{} IS NOT NULL", identifier(column)),
    };
    format!(
        "SELECT {} AS \"subject\", {} AS \"object\" FROM {} WHERE {filter}",
        identifier(pk),
        identifier(column),
        identifier(table)
    )
}

/// Selects the pairs `(lhs, rhs)` of `table` where both columns are set, optionally restricted to
/// pairs whose rhs equals `rhs_value`.
pub(super) fn select_pairs(table: &str, lhs: &str, rhs: &str, rhs_value: Option<&str>) -> String {
    let mut filter = format!(
        "{} IS NOT NULL AND {} IS NOT NULL",
        identifier(lhs),
        identifier(rhs)
    );
    if let Some(value) = rhs_value {
        filter = format!("{filter} AND {}", equals(rhs, value));
    }
    format!(
        "SELECT {} AS \"subject\", {} AS \"object\" FROM {} WHERE {filter}",
        identifier(lhs),
        identifier(rhs),
        identifier(table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_is_selected_by_string_value() {
        assert_eq!(
            select_row("User", "ID", "5"),
            "SELECT * FROM \"User\" WHERE CAST(\"ID\" AS VARCHAR) = '5'"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(
            select_column("User", "ID", "NAME", Some("O'Brien")),
            "SELECT \"ID\" AS \"subject\", \"NAME\" AS \"object\" FROM \"User\" WHERE CAST(\"NAME\" AS VARCHAR) = 'O''Brien'"
        );
        assert_eq!(identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn column_without_value_filters_nulls() {
        assert_eq!(
            select_column("User", "ID", "EMAIL", None),
            "SELECT \"ID\" AS \"subject\", \"EMAIL\" AS \"object\" FROM \"User\" WHERE \"EMAIL\" IS NOT NULL"
        );
    }

    #[test]
    fn pairs_with_value() {
        assert_eq!(
            select_pairs("Enrollment", "USER_ID", "COURSE_ID", Some("3")),
            "SELECT \"USER_ID\" AS \"subject\", \"COURSE_ID\" AS \"object\" FROM \"Enrollment\" WHERE \"USER_ID\" IS NOT NULL AND \"COURSE_ID\" IS NOT NULL AND CAST(\"COURSE_ID\" AS VARCHAR) = '3'"
        );
    }
}
