//! Schema-driven structural codecs
//!
//! A [`Codec`] walks a resolved [`TypeGraph`], consulting a [`Registry`] at
//! each node. The binary side ([`binary`]) moves between wire bytes and
//! typed [`Value`]s; the object side ([`object`]) builds typed values from
//! untyped JSON. Both apply the same dispatch at every node:
//!
//! 1. the optional flag (presence byte, or JSON `null`),
//! 2. the array flag (varuint32 count, or JSON array),
//! 3. the element: a registered leaf descriptor, else a value carrying its
//!    own binary form, else the alias, struct or variant structure declared
//!    by the schema, else an unknown type.
//!
//! Every error carries the [`CodingPath`] at which it was raised.

use std::collections::HashSet;

use crate::error::AbiError;
use crate::registry::Registry;
use crate::schema::{TypeGraph, TypeId, TypeKind};
use crate::value::{Struct, Value};

use self::path::CodingPath;

pub mod binary;
pub mod object;
pub mod path;

/// Structural codec over one resolved type graph and one registry
#[derive(Clone, Copy, Debug)]
pub struct Codec<'a> {
    graph: &'a TypeGraph,
    registry: &'a Registry,
}

impl<'a> Codec<'a> {
    #[must_use]
    pub const fn new(graph: &'a TypeGraph, registry: &'a Registry) -> Self {
        Self { graph, registry }
    }

    #[must_use]
    pub const fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    /// Value of a node whose bytes are absent: `null` when optional, an empty
    /// array, or the default of the element type
    pub fn default_value(&self, id: TypeId, path: &CodingPath) -> Result<Value, AbiError> {
        self.default_guarded(id, path, &mut HashSet::new())
    }

    fn default_guarded(
        &self,
        id: TypeId,
        path: &CodingPath,
        in_progress: &mut HashSet<String>,
    ) -> Result<Value, AbiError> {
        let node = self.graph.get(id);
        if node.is_optional {
            return Ok(Value::Null);
        }
        if node.is_array {
            return Ok(Value::Array(Vec::new()));
        }
        if let Some(value) = self
            .registry
            .get(&node.name)
            .and_then(|d| d.default_value())
        {
            return Ok(value);
        }
        if !in_progress.insert(node.name.clone()) {
            return Err(AbiError::circular(path, &node.name));
        }
        let ret = match &node.kind {
            TypeKind::Alias(_) => {
                let target = self.graph.follow_alias(id, path)?;
                self.default_guarded(target, path, in_progress)
            }
            TypeKind::Struct { .. } => {
                let mut value = Struct::new(node.name.as_str());
                for (field, fid) in self.graph.flatten_fields(id, path)? {
                    let field_value = self.default_guarded(fid, path, in_progress)?;
                    value.push(field, field_value);
                }
                Ok(Value::Struct(value))
            }
            TypeKind::Variant(branches) => match branches.first() {
                Some(&branch) => {
                    let tag = self.graph.get(branch).type_name.clone();
                    let inner = self.default_guarded(branch, path, in_progress)?;
                    Ok(Value::Variant(tag, Box::new(inner)))
                }
                None => Err(AbiError::non_conforming(
                    path,
                    format!("variant `{}` has no branches", node.name),
                )),
            },
            TypeKind::Leaf => Err(self.leaf_error(id, path, "default value")),
        };
        in_progress.remove(&node.name);
        ret
    }

    /// Fewest bytes a value of node `id` occupies on the wire
    ///
    /// Extension fields count as zero, as do recursive occurrences of a
    /// struct already being measured.
    fn width_guarded(
        &self,
        id: TypeId,
        path: &CodingPath,
        in_progress: &mut HashSet<TypeId>,
    ) -> Result<usize, AbiError> {
        let node = self.graph.get(id);
        if node.is_extension {
            return Ok(0);
        }
        if node.is_optional || node.is_array {
            return Ok(1);
        }
        self.element_width(id, path, in_progress)
    }

    /// Width of one element of node `id`, ignoring its suffix markers
    pub(crate) fn element_width(
        &self,
        id: TypeId,
        path: &CodingPath,
        in_progress: &mut HashSet<TypeId>,
    ) -> Result<usize, AbiError> {
        let node = self.graph.get(id);
        if let Some(codec) = self.registry.get(&node.name).and_then(|d| d.binary()) {
            return Ok(codec.min_width());
        }
        if !in_progress.insert(id) {
            return Ok(0);
        }
        let ret = match &node.kind {
            TypeKind::Alias(_) => {
                let target = self.graph.follow_alias(id, path)?;
                self.width_guarded(target, path, in_progress)
            }
            TypeKind::Struct { .. } => {
                let mut total = 0;
                for (_, fid) in self.graph.flatten_fields(id, path)? {
                    total += self.width_guarded(fid, path, in_progress)?;
                }
                Ok(total)
            }
            TypeKind::Variant(_) => Ok(1),
            TypeKind::Leaf => Ok(0),
        };
        in_progress.remove(&id);
        ret
    }

    /// Error for a leaf node that has no usable capability for `what`
    ///
    /// Registered types are unsupported for the operation; anything else is unknown.
    fn leaf_error(&self, id: TypeId, path: &CodingPath, what: &str) -> AbiError {
        let node = self.graph.get(id);
        if self.registry.get(&node.name).is_some() {
            AbiError::unsupported(path, format!("type `{}` has no {what}", node.name))
        } else {
            AbiError::unknown_type(path, &node.name)
        }
    }
}
