//! Object side of the structural codec: typed values from untyped JSON
//!
//! Leaves are built by their registered descriptor's
//! [`construct`](crate::registry::TypeDescriptor::construct). Structs are
//! built from JSON objects, field by field in flattened order. Variants accept the
//! tagged form `[tag, value]`, with the tag naming a branch type, or else a
//! bare value, which is taken by the first leaf branch that accepts it.
//!
//! Absent extension fields at the end of a struct are omitted. One that is
//! followed by a given field takes its default, so that the binary form
//! stays aligned with the declared field order.

use log::trace;
use serde_json::Value as Json;

use super::path::{CodingPath, PathSegment};
use super::Codec;
use crate::error::AbiError;
use crate::schema::{TypeId, TypeKind};
use crate::value::{Struct, Value};

impl Codec<'_> {
    /// Builds a typed value of node `id` from `json`, where `None` stands
    /// for a field that is absent from its enclosing object
    pub fn construct(
        &self,
        id: TypeId,
        json: Option<&Json>,
        path: &mut CodingPath,
    ) -> Result<Value, AbiError> {
        let node = self.graph.get(id);
        trace!("construct `{}`", node.type_name);
        let json = match json {
            None | Some(Json::Null) if node.is_optional => return Ok(Value::Null),
            None | Some(Json::Null) => {
                return Err(AbiError::non_conforming(
                    path,
                    format!("missing value for non-optional `{}`", node.type_name),
                ))
            }
            Some(json) => json,
        };
        if node.is_array {
            let elems = json.as_array().ok_or_else(|| {
                AbiError::non_conforming(path, format!("expected array for `{}`", node.type_name))
            })?;
            let mut ret = Vec::with_capacity(elems.len());
            for (ix, elem) in elems.iter().enumerate() {
                path.push(PathSegment::Index(ix));
                ret.push(self.construct_element(id, elem, path)?);
                path.pop();
            }
            return Ok(Value::Array(ret));
        }
        self.construct_element(id, json, path)
    }

    fn construct_element(
        &self,
        id: TypeId,
        json: &Json,
        path: &mut CodingPath,
    ) -> Result<Value, AbiError> {
        let node = self.graph.get(id);
        if let Some(descriptor) = self.registry.get(&node.name) {
            if descriptor.shape().is_none() {
                return descriptor
                    .construct(json)
                    .map_err(|e| AbiError::from_value(e, &node.type_name, path));
            }
        }
        match &node.kind {
            TypeKind::Alias(_) => {
                let target = self.graph.follow_alias(id, path)?;
                self.construct(target, Some(json), path)
            }
            TypeKind::Struct { .. } => {
                let object = json.as_object().ok_or_else(|| {
                    AbiError::non_conforming(path, format!("expected object for `{}`", node.name))
                })?;
                let mut value = Struct::new(node.name.as_str());
                let flat = self.graph.flatten_fields(id, path)?;
                let last_given = flat.iter().rposition(|(field, fid)| {
                    object.contains_key(field) || !self.graph.get(*fid).is_extension
                });
                for (ix, (field, fid)) in flat.into_iter().enumerate() {
                    let field_json = object.get(&field);
                    let is_extension = self.graph.get(fid).is_extension;
                    if field_json.is_none() && is_extension && last_given.map_or(true, |last| ix > last) {
                        continue;
                    }
                    path.push_field(&field);
                    let field_value = match field_json {
                        // extension gap before a later given field
                        None if is_extension => self.default_value(fid, path)?,
                        _ => self.construct(fid, field_json, path)?,
                    };
                    path.pop();
                    value.push(field, field_value);
                }
                Ok(Value::Struct(value))
            }
            TypeKind::Variant(branches) => self.construct_variant(id, branches, json, path),
            TypeKind::Leaf => Err(AbiError::unknown_type(path, &node.name)),
        }
    }

    fn construct_variant(
        &self,
        id: TypeId,
        branches: &[TypeId],
        json: &Json,
        path: &mut CodingPath,
    ) -> Result<Value, AbiError> {
        if let Some([Json::String(tag), inner]) = json.as_array().map(Vec::as_slice) {
            let tagged = branches
                .iter()
                .copied()
                .find(|&b| self.graph.get(b).type_name == *tag);
            if let Some(branch) = tagged {
                path.push_type(tag);
                let value = self.construct(branch, Some(inner), path)?;
                path.pop();
                return Ok(Value::Variant(tag.clone(), Box::new(value)));
            }
        }
        for &branch in branches {
            let bnode = self.graph.get(branch);
            if bnode.has_flags() {
                continue;
            }
            let leaf = self
                .registry
                .get(&bnode.name)
                .filter(|d| d.shape().is_none());
            if let Some(Ok(value)) = leaf.map(|d| d.construct(json)) {
                return Ok(Value::Variant(bnode.type_name.clone(), Box::new(value)));
            }
        }
        Err(AbiError::non_conforming(
            path,
            format!(
                "no branch of variant `{}` accepts the value",
                self.graph.get(id).name
            ),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use crate::registry::Registry;
    use crate::schema::Abi;
    use serde_json::json;

    const SCHEMA: &str = r#"{
        "types": [{"new_type_name": "account", "type": "name"}],
        "structs": [
            {"name": "foo", "base": "", "fields": [
                {"name": "one", "type": "string"},
                {"name": "two", "type": "int8"}
            ]},
            {"name": "bar", "base": "foo", "fields": [
                {"name": "three", "type": "account?"},
                {"name": "four", "type": "string[]?"},
                {"name": "five", "type": "uint64$"}
            ]}
        ],
        "variants": [{"name": "v", "types": ["int8", "string", "foo"]}]
    }"#;

    fn construct(type_name: &str, json: &Json) -> Result<Value, AbiError> {
        let abi = Abi::from_json(SCHEMA).unwrap();
        let registry = Registry::builtin();
        let graph = abi.resolve(type_name);
        Codec::new(&graph, &registry).construct(
            TypeId(0),
            Some(json),
            &mut CodingPath::root(type_name),
        )
    }

    #[test]
    fn struct_from_object() {
        let json = json!({"one": "one", "two": 2, "three": "two", "four": ["f", "o"]});
        let value = construct("bar", &json).unwrap();
        assert_eq!(value.type_name(), Some("bar"));
        assert_eq!(value.to_json(), json);
        let s = value.as_struct().unwrap();
        assert_eq!(s.get("three"), Some(&Value::Name("two".parse().unwrap())));
        assert!(s.get("five").is_none());

        let value = construct("bar", &json!({"one": "", "two": -1, "five": "9"})).unwrap();
        assert_eq!(
            value.to_json(),
            json!({"one": "", "two": -1, "three": null, "four": null, "five": "9"})
        );
    }

    #[test]
    fn non_conforming() {
        let err = construct("foo", &json!({"one": "x"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConformingValue);
        assert_eq!(err.path().to_string(), "foo.two");

        let err = construct("foo", &json!({"one": "x", "two": 128})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonConformingValue);

        let err = construct("string[]", &json!(["a", 1])).unwrap_err();
        assert_eq!(err.path().to_string(), "string[][1]");

        assert_eq!(
            construct("foo", &json!([1])).unwrap_err().kind(),
            ErrorKind::NonConformingValue
        );
        assert_eq!(
            construct("nonsense", &json!(1)).unwrap_err().kind(),
            ErrorKind::UnknownType
        );
    }

    #[test]
    fn variants() {
        assert_eq!(
            construct("v", &json!(["string", "hi"])).unwrap(),
            Value::Variant("string".into(), Box::new(Value::from("hi")))
        );
        assert_eq!(
            construct("v", &json!(5)).unwrap(),
            Value::Variant("int8".into(), Box::new(Value::from(5i8)))
        );
        assert_eq!(
            construct("v", &json!("bare")).unwrap().to_json(),
            json!(["string", "bare"])
        );
        let tagged = construct("v", &json!(["foo", {"one": "a", "two": 1}])).unwrap();
        assert_eq!(tagged.to_json(), json!(["foo", {"one": "a", "two": 1}]));
        assert_eq!(
            construct("v", &json!({"one": "a"})).unwrap_err().kind(),
            ErrorKind::NonConformingValue
        );
    }

    #[test]
    fn optional_root() {
        assert_eq!(construct("int8?", &Json::Null).ok(), Some(Value::Null));
        assert_eq!(
            construct("int8", &Json::Null).unwrap_err().kind(),
            ErrorKind::NonConformingValue
        );
    }
}
