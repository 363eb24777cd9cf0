use datafusion::arrow::array::{Array, ArrayRef};
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::util::display::array_value_to_string;
use mediator_common::SourceError;
use mediator_model::vocab::xsd;
use mediator_model::NamedNode;

/// Returns the XSD datatype of literals built from a column of type `data_type`.
///
/// Returns `None` for columns whose values are plain strings.
pub fn xsd_datatype(data_type: &DataType) -> Option<NamedNode> {
    let datatype = match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => xsd::INTEGER,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => xsd::DOUBLE,
        DataType::Decimal128(..) | DataType::Decimal256(..) => xsd::DECIMAL,
        DataType::Boolean => xsd::BOOLEAN,
        DataType::Date32 => xsd::DATE,
        // Arrow renders Date64 with a time component.
        DataType::Date64 | DataType::Timestamp(..) => xsd::DATE_TIME,
        _ => return None,
    };
    Some(datatype.into_owned())
}

/// Renders the value at `row`. Returns `None` for nulls.
pub(super) fn render(column: &ArrayRef, row: usize) -> Result<Option<String>, SourceError> {
    if column.is_null(row) {
        return Ok(None);
    }
    array_value_to_string(column.as_ref(), row)
        .map(Some)
        .map_err(SourceError::other)
}
