//! Textual I/O: reading and writing variable values against the stream
//! format described in `SPEC_FULL.md` §4.5/§6.
//!
//! Reading and checking a value are deliberately separate passes (mirroring
//! the rest of the crate): [`read_value`] only parses a value off the
//! cursor, it does not validate it against the variable's constraints.
//! Callers that want both call [`crate::variable::Variable::validate`]
//! afterward.

pub mod cursor;
pub mod format;
pub mod writer;

pub use cursor::InputCursor;
pub use format::{
    GraphStyle, MArrayFormat, MGraphFormat, MTupleFormat, MVariantFormat, NodeIndexBase,
    NumericStrictness, Whitespace, WhitespaceStrictness,
};
pub use writer::OutputWriter;

use crate::error::{IoError, SpecimenError};
use crate::resolver::Resolver;
use crate::value::{Edge, Graph, Value};
use crate::variable::Variable;

/// Bundles every per-kind format setting plus the two global strictness
/// policies. Threaded through every `read_value`/`write_value` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IoFormat {
    /// Whether the declared separator must match exactly or any whitespace
    /// is accepted.
    pub whitespace_strictness: WhitespaceStrictness,
    /// Whether integers must be canonically spelled.
    pub numeric_strictness: NumericStrictness,
    /// Array separator.
    pub array: MArrayFormat,
    /// Tuple separator.
    pub tuple: MTupleFormat,
    /// Graph layout.
    pub graph: MGraphFormat,
    /// Variant discriminators and separator.
    pub variant: MVariantFormat,
}

impl IoFormat {
    /// An empty format using every default setting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes any non-default setting from `other`, field by field.
    pub fn merge(self, other: IoFormat) -> IoFormat {
        IoFormat {
            whitespace_strictness: if self.whitespace_strictness == WhitespaceStrictness::default()
            {
                other.whitespace_strictness
            } else {
                self.whitespace_strictness
            },
            numeric_strictness: if self.numeric_strictness == NumericStrictness::default() {
                other.numeric_strictness
            } else {
                self.numeric_strictness
            },
            array: self.array.merge(other.array),
            tuple: self.tuple.merge(other.tuple),
            graph: self.graph.merge(other.graph),
            variant: self.variant.merge(other.variant),
        }
    }
}

fn io_err<T>(r: Result<T, IoError>) -> Result<T, SpecimenError> {
    r.map_err(SpecimenError::Io)
}

/// Reads a value for `variable` off `cursor`.
///
/// Compound kinds recurse: `Array`/`Tuple`/`Variant` read each child in turn,
/// separated per `format`; `Graph` reads its declared node/edge counts'
/// unique values and then an edge list.
///
/// # Errors
/// [`SpecimenError::Io`] on a malformed stream; [`SpecimenError::ConfigurationError`]
/// if a compound variable's size cannot be pinned to a single value (e.g. an
/// `Array` without an exact `Length`).
pub fn read_value(
    name: &str,
    variable: &Variable,
    cursor: &mut InputCursor<'_>,
    format: &IoFormat,
    resolver: &mut Resolver,
) -> Result<Value, SpecimenError> {
    match variable {
        Variable::Integer(_) => {
            let n = io_err(cursor.read_integer(format.numeric_strictness))?;
            Ok(Value::Integer(n))
        }
        Variable::String(_) => {
            let s = io_err(cursor.read_token())?;
            Ok(Value::Str(s))
        }
        Variable::None(_) => Ok(Value::None),
        Variable::Array(v) => {
            let n = v
                .unique_length(&mut resolver.generate_lookup())
                .ok_or_else(|| {
                    SpecimenError::configuration(
                        name,
                        "cannot read an Array whose Length does not evaluate to a single value",
                    )
                })?;
            if n < 0 {
                return Err(SpecimenError::configuration(
                    name,
                    "evaluated Array length is negative",
                ));
            }
            let mut elements = Vec::with_capacity(n as usize);
            for i in 0..n {
                if i > 0 {
                    io_err(cursor.read_whitespace(
                        format.array.separator,
                        format.whitespace_strictness,
                    ))?;
                }
                let elem_name = format!("{name}.elem[{i}]");
                elements.push(read_value(
                    &elem_name,
                    v.element(),
                    cursor,
                    format,
                    resolver,
                )?);
            }
            Ok(Value::Array(elements))
        }
        Variable::Tuple(v) => {
            let mut values = Vec::with_capacity(v.components().len());
            for (i, component) in v.components().iter().enumerate() {
                if i > 0 {
                    io_err(cursor.read_whitespace(
                        format.tuple.separator,
                        format.whitespace_strictness,
                    ))?;
                }
                let child_name = format!("{name}.{i}");
                values.push(read_value(&child_name, component, cursor, format, resolver)?);
            }
            Ok(Value::Tuple(values))
        }
        Variable::Variant(v) => {
            let discriminator = io_err(cursor.read_token())?;
            let index = format
                .variant
                .discriminators
                .iter()
                .position(|d| d == &discriminator)
                .ok_or_else(|| {
                    SpecimenError::Io(IoError::new(
                        cursor.position(),
                        format!(
                            "invalid discriminator '{discriminator}', expected one of: {}",
                            format.variant.discriminators.join(", ")
                        ),
                    ))
                })?;
            let alternative = v.alternatives().get(index).ok_or_else(|| {
                SpecimenError::configuration(
                    name,
                    format!("discriminator index {index} has no matching alternative"),
                )
            })?;
            let payload = if matches!(alternative, Variable::None(_)) {
                Value::None
            } else {
                io_err(cursor.read_whitespace(
                    format.variant.separator,
                    format.whitespace_strictness,
                ))?;
                let child_name = format!("{name}.{index}");
                read_value(&child_name, alternative, cursor, format, resolver)?
            };
            Ok(Value::Variant {
                index,
                value: Box::new(payload),
            })
        }
        Variable::Graph(v) => {
            let num_nodes = v
                .unique_node_count(&mut resolver.generate_lookup())
                .ok_or_else(|| {
                    SpecimenError::configuration(
                        name,
                        "cannot read a Graph whose NumNodes does not evaluate to a single value",
                    )
                })?;
            let num_edges = v
                .unique_edge_count(&mut resolver.generate_lookup())
                .ok_or_else(|| {
                    SpecimenError::configuration(
                        name,
                        "cannot read a Graph whose NumEdges does not evaluate to a single value",
                    )
                })?;
            if num_nodes < 0 || num_edges < 0 {
                return Err(SpecimenError::configuration(
                    name,
                    "evaluated Graph node/edge count is negative",
                ));
            }
            let base = match format.graph.index_base {
                NodeIndexBase::ZeroBased => 0i64,
                NodeIndexBase::OneBased => 1i64,
            };
            let mut edges = Vec::with_capacity(num_edges as usize);
            for _ in 0..num_edges {
                let u = io_err(cursor.read_integer(format.numeric_strictness))? - base;
                io_err(cursor.read_whitespace(Whitespace::Space, format.whitespace_strictness))?;
                let v_node = io_err(cursor.read_integer(format.numeric_strictness))? - base;
                if u < 0 || v_node < 0 || u >= num_nodes || v_node >= num_nodes {
                    return Err(SpecimenError::Io(IoError::new(
                        cursor.position(),
                        format!("edge endpoint out of range for {num_nodes} nodes"),
                    )));
                }
                edges.push(Edge::new(u as usize, v_node as usize));
                io_err(cursor.read_whitespace(Whitespace::Newline, format.whitespace_strictness))?;
            }
            Ok(Value::Graph(Graph {
                num_nodes: num_nodes as usize,
                edges,
                node_labels: None,
            }))
        }
    }
}

/// Writes `value` (which must have been produced by `variable`, directly or
/// via generation) to `writer`.
///
/// # Errors
/// [`SpecimenError::Io`] if the underlying sink fails, or the value's shape
/// does not match `variable`'s kind.
pub fn write_value(
    name: &str,
    variable: &Variable,
    value: &Value,
    writer: &mut OutputWriter<'_>,
    format: &IoFormat,
) -> Result<(), SpecimenError> {
    match (variable, value) {
        (Variable::Integer(_), Value::Integer(n)) => io_err(writer.write_integer(*n)),
        (Variable::String(_), Value::Str(s)) => io_err(writer.write_token(s)),
        (Variable::None(_), Value::None) => Ok(()),
        (Variable::Array(v), Value::Array(elements)) => {
            for (i, elem) in elements.iter().enumerate() {
                if i > 0 {
                    io_err(writer.write_whitespace(format.array.separator))?;
                }
                let elem_name = format!("{name}.elem[{i}]");
                write_value(&elem_name, v.element(), elem, writer, format)?;
            }
            Ok(())
        }
        (Variable::Tuple(v), Value::Tuple(components)) => {
            for (i, (component, value)) in v.components().iter().zip(components).enumerate() {
                if i > 0 {
                    io_err(writer.write_whitespace(format.tuple.separator))?;
                }
                let child_name = format!("{name}.{i}");
                write_value(&child_name, component, value, writer, format)?;
            }
            Ok(())
        }
        (Variable::Variant(v), Value::Variant { index, value }) => {
            let discriminator = format.variant.discriminators.get(*index).ok_or_else(|| {
                SpecimenError::configuration(
                    name,
                    format!("no discriminator configured for alternative {index}"),
                )
            })?;
            io_err(writer.write_token(discriminator))?;
            let alternative = v.alternatives().get(*index).ok_or_else(|| {
                SpecimenError::configuration(name, format!("alternative index {index} out of range"))
            })?;
            if !matches!(alternative, Variable::None(_)) {
                io_err(writer.write_whitespace(format.variant.separator))?;
                let child_name = format!("{name}.{index}");
                write_value(&child_name, alternative, value, writer, format)?;
            }
            Ok(())
        }
        (Variable::Graph(_), Value::Graph(graph)) => {
            let base: i64 = match format.graph.index_base {
                NodeIndexBase::ZeroBased => 0,
                NodeIndexBase::OneBased => 1,
            };
            for edge in &graph.edges {
                io_err(writer.write_integer(edge.u as i64 + base))?;
                io_err(writer.write_whitespace(Whitespace::Space))?;
                io_err(writer.write_integer(edge.v as i64 + base))?;
                if let Some(label) = &edge.label {
                    io_err(writer.write_whitespace(Whitespace::Space))?;
                    io_err(writer.write_token(&label.to_string()))?;
                }
                io_err(writer.write_whitespace(Whitespace::Newline))?;
            }
            Ok(())
        }
        (v, _) => Err(SpecimenError::ValueTypeMismatch {
            name: name.to_string(),
            expected_type: v.typename().to_string(),
        }),
    }
}
