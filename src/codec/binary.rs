//! Binary side of the structural codec
//!
//! Struct values are laid out as their flattened fields, base chain first.
//! A binary-extension field that is reached once the input is exhausted
//! takes the default value of its type. On encode, absent extension fields
//! after the last written field are skipped; an absent extension field
//! followed by a present one is written as its default. Variant types have no binary
//! layout here and fail with [`ErrorKind::Unsupported`](crate::ErrorKind).

use std::collections::HashSet;

use log::trace;

use super::path::{CodingPath, PathSegment};
use super::Codec;
use crate::builder::PagedBuilder;
use crate::conv::target::Target;
use crate::error::{AbiError, ErrorKind};
use crate::parse::{Parser, SliceParser};
use crate::prim::write_len;
use crate::schema::{TypeId, TypeKind};
use crate::value::{Struct, Value};

/// Largest element count accepted for an array of zero-width elements that
/// exceeds the remaining input
pub const ZERO_WIDTH_LIMIT: usize = 4096;

impl Codec<'_> {
    /// Reads one value of node `id` from `p`
    pub fn read(
        &self,
        id: TypeId,
        p: &mut SliceParser<'_>,
        path: &mut CodingPath,
    ) -> Result<Value, AbiError> {
        let node = self.graph.get(id);
        trace!("read `{}` at offset {}", node.type_name, p.offset());
        if node.is_optional && !p.take_bool().map_err(|e| AbiError::from_parse(e, path))? {
            return Ok(Value::Null);
        }
        if node.is_array {
            let count = p
                .take_varuint32()
                .map_err(|e| AbiError::from_parse(e, path))? as usize;
            if count > p.remainder() {
                self.check_oversized_count(id, count, p.remainder(), path)?;
            }
            let mut elems = Vec::with_capacity(count);
            for ix in 0..count {
                path.push(PathSegment::Index(ix));
                elems.push(self.read_element(id, p, path)?);
                path.pop();
            }
            return Ok(Value::Array(elems));
        }
        self.read_element(id, p, path)
    }

    fn read_element(
        &self,
        id: TypeId,
        p: &mut SliceParser<'_>,
        path: &mut CodingPath,
    ) -> Result<Value, AbiError> {
        let node = self.graph.get(id);
        if let Some(codec) = self.registry.get(&node.name).and_then(|d| d.binary()) {
            return codec.read(p).map_err(|e| AbiError::from_parse(e, path));
        }
        match &node.kind {
            TypeKind::Alias(_) => {
                let target = self.graph.follow_alias(id, path)?;
                self.read(target, p, path)
            }
            TypeKind::Struct { .. } => {
                let mut value = Struct::new(node.name.as_str());
                for (field, fid) in self.graph.flatten_fields(id, path)? {
                    path.push_field(&field);
                    let field_value = if self.graph.get(fid).is_extension && p.remainder() == 0 {
                        self.default_value(fid, path)?
                    } else {
                        self.read(fid, p, path)?
                    };
                    path.pop();
                    value.push(field, field_value);
                }
                Ok(Value::Struct(value))
            }
            TypeKind::Variant(_) => Err(AbiError::unsupported(
                path,
                format!("binary decoding of variant `{}` is not implemented", node.name),
            )),
            TypeKind::Leaf => Err(self.leaf_error(id, path, "binary layout")),
        }
    }

    /// Checks an array count that exceeds the remaining input
    ///
    /// Elements of nonzero width cannot all fit, which is an underrun.
    /// Zero-width elements fit any count, so theirs is capped at
    /// [`ZERO_WIDTH_LIMIT`].
    fn check_oversized_count(
        &self,
        id: TypeId,
        count: usize,
        remainder: usize,
        path: &CodingPath,
    ) -> Result<(), AbiError> {
        let node = self.graph.get(id);
        if self.element_width(id, path, &mut HashSet::new())? > 0 {
            return Err(AbiError::new(
                ErrorKind::BufferUnderrun,
                path,
                format!("{count} elements of `{}` cannot fit in {remainder} bytes", node.name),
            ));
        }
        if count > ZERO_WIDTH_LIMIT {
            return Err(AbiError::non_conforming(
                path,
                format!(
                    "{count} elements of zero-width `{}` exceed the limit of {ZERO_WIDTH_LIMIT}",
                    node.name
                ),
            ));
        }
        Ok(())
    }

    /// Appends the binary form of `value` as node `id`
    pub fn write(
        &self,
        id: TypeId,
        value: &Value,
        buf: &mut PagedBuilder,
        path: &mut CodingPath,
    ) -> Result<(), AbiError> {
        let node = self.graph.get(id);
        trace!("write `{}`", node.type_name);
        if node.is_optional {
            if value.is_null() {
                buf.push_one(0x00);
                return Ok(());
            }
            buf.push_one(0x01);
        }
        if node.is_array {
            let elems = value.as_array().ok_or_else(|| {
                AbiError::non_conforming(path, format!("expected array for `{}`", node.type_name))
            })?;
            if u32::try_from(elems.len()).is_err() {
                return Err(AbiError::non_conforming(path, "array length exceeds 32 bits"));
            }
            write_len(elems.len(), buf);
            for (ix, elem) in elems.iter().enumerate() {
                path.push(PathSegment::Index(ix));
                self.write_element(id, elem, buf, path)?;
                path.pop();
            }
            return Ok(());
        }
        self.write_element(id, value, buf, path)
    }

    fn write_element(
        &self,
        id: TypeId,
        value: &Value,
        buf: &mut PagedBuilder,
        path: &mut CodingPath,
    ) -> Result<(), AbiError> {
        let node = self.graph.get(id);
        if let Some(codec) = self.registry.get(&node.name).and_then(|d| d.binary()) {
            return codec
                .write(value, buf)
                .map(|_| ())
                .map_err(|e| AbiError::from_value(e, &node.type_name, path));
        }
        let is_alias = matches!(node.kind, TypeKind::Alias(_));
        if let (Value::Object(obj), false) = (value, is_alias) {
            if obj.abi_type() != node.name {
                return Err(AbiError::non_conforming(
                    path,
                    format!("value of type `{}` given for `{}`", obj.abi_type(), node.name),
                ));
            }
            obj.write_abi(buf);
            return Ok(());
        }
        match &node.kind {
            TypeKind::Alias(_) => {
                let target = self.graph.follow_alias(id, path)?;
                self.write(target, value, buf, path)
            }
            TypeKind::Struct { .. } => {
                let fields = value.as_struct().ok_or_else(|| {
                    AbiError::non_conforming(path, format!("expected struct `{}`", node.name))
                })?;
                let flat = self.graph.flatten_fields(id, path)?;
                // past this index, absent extension fields are left off the wire
                let last_written = flat
                    .iter()
                    .rposition(|(field, fid)| {
                        fields.get(field).is_some() || !self.graph.get(*fid).is_extension
                    });
                for (ix, (field, fid)) in flat.into_iter().enumerate() {
                    let fnode = self.graph.get(fid);
                    path.push_field(&field);
                    match fields.get(&field) {
                        Some(field_value) => self.write(fid, field_value, buf, path)?,
                        None if fnode.is_extension && last_written.map_or(true, |last| ix > last) => (),
                        None if fnode.is_extension => {
                            let default = self.default_value(fid, path)?;
                            self.write(fid, &default, buf, path)?;
                        }
                        None if fnode.is_optional => {
                            buf.push_one(0x00);
                        }
                        None => {
                            return Err(AbiError::non_conforming(
                                path,
                                format!("missing field `{field}` of `{}`", node.name),
                            ))
                        }
                    }
                    path.pop();
                }
                Ok(())
            }
            TypeKind::Variant(_) => Err(AbiError::unsupported(
                path,
                format!("binary encoding of variant `{}` is not implemented", node.name),
            )),
            TypeKind::Leaf => Err(self.leaf_error(id, path, "binary layout")),
        }
    }
}
