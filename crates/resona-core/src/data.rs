//! Data-type contract for values flowing through operator graphs.

use crate::literal::Literal;
use crate::settings::OperatorSettings;

/// A value type that can travel along graph edges.
///
/// The `TYPE_NAME` is the declared data-type identity vertices are matched
/// on: an edge is only valid when the source and destination vertex declare
/// the same name. [`from_literal`](Self::from_literal) constructs the
/// default (or replacement) value for a vertex from its declared
/// [`Literal`], sized against the render instance's settings.
pub trait GraphData: Send + Sync + Sized + 'static {
    /// Declared data-type identity, unique per type.
    const TYPE_NAME: &'static str;

    /// Constructs a value from a declared literal.
    ///
    /// A [`Literal::None`] (or any mismatched literal variant) yields the
    /// type's natural default.
    fn from_literal(literal: &Literal, settings: &OperatorSettings) -> Self;
}

impl GraphData for f32 {
    const TYPE_NAME: &'static str = "float";

    fn from_literal(literal: &Literal, _settings: &OperatorSettings) -> Self {
        match literal {
            Literal::Float(v) => *v,
            Literal::Int(v) => *v as f32,
            _ => 0.0,
        }
    }
}

impl GraphData for i32 {
    const TYPE_NAME: &'static str = "int";

    fn from_literal(literal: &Literal, _settings: &OperatorSettings) -> Self {
        match literal {
            Literal::Int(v) => *v,
            Literal::Float(v) => *v as i32,
            _ => 0,
        }
    }
}

impl GraphData for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_literal(literal: &Literal, _settings: &OperatorSettings) -> Self {
        matches!(literal, Literal::Bool(true))
    }
}

impl GraphData for String {
    const TYPE_NAME: &'static str = "string";

    fn from_literal(literal: &Literal, _settings: &OperatorSettings) -> Self {
        match literal {
            Literal::String(v) => v.clone(),
            _ => String::new(),
        }
    }
}
