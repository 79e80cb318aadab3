//! Error types for the shared primitives.

/// Grid cell packing failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CellError {
    /// A value does not fit the integer width reserved for it in the cell.
    #[error("{field} = {value} does not fit in {width}")]
    Range {
        field: &'static str,
        value: f64,
        width: &'static str,
    },

    /// Rotation index (or stored rotation code) outside the four face orientations.
    #[error("rotation {0} is not one of the four face orientations")]
    Domain(u32),
}

/// Attribute text that is not an accepted literal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LiteralError {
    #[error("expected True or False, got {0:?}")]
    Bool(String),

    #[error("expected a parenthesised number list, got {0:?}")]
    Tuple(String),
}
