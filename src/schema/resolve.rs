//! Expansion of type names into a type graph
//!
//! [`Abi::resolve`] turns a type name into a [`TypeGraph`]: an arena of
//! [`ResolvedType`] nodes, one per distinct full type string encountered,
//! linked by [`TypeId`] indices. A node is registered under its full type
//! string before any of its children are resolved, so recursive and
//! mutually recursive declarations share nodes rather than being unrolled.
//!
//! Resolution itself never fails; names that are not declared by the
//! document become leaves, to be looked up in the registry by the codecs.
//! Chains that can only be followed forever (an alias that reaches itself,
//! a struct that is its own base) are detected where they are walked, by
//! [`TypeGraph::follow_alias`] and [`TypeGraph::flatten_fields`].

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use log::trace;

use super::Abi;
use crate::codec::path::CodingPath;
use crate::error::AbiError;

/// Index of a node within its [`TypeGraph`], in order of visitation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// Built-in, registered or unknown type with no structure in the document
    Leaf,
    Alias(TypeId),
    Struct {
        base: Option<TypeId>,
        fields: Vec<(String, TypeId)>,
    },
    Variant(Vec<TypeId>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedType {
    pub id: TypeId,
    /// Full type string, including suffix markers
    pub type_name: String,
    /// Type name with suffix markers stripped
    pub name: String,
    pub is_array: bool,
    pub is_optional: bool,
    /// Binary extension: decodes as its default when the input is exhausted
    pub is_extension: bool,
    pub kind: TypeKind,
}

impl ResolvedType {
    /// Whether any suffix marker applies to this node
    #[must_use]
    pub const fn has_flags(&self) -> bool {
        self.is_array || self.is_optional || self.is_extension
    }
}

/// Splits the suffix markers off a type string, right to left: `$`, then `?`, then `[]`
///
/// Returns the base name and the array, optional and extension flags.
#[must_use]
pub fn strip_suffixes(type_name: &str) -> (&str, bool, bool, bool) {
    let (rest, is_extension) = match type_name.strip_suffix('$') {
        Some(rest) => (rest, true),
        None => (type_name, false),
    };
    let (rest, is_optional) = match rest.strip_suffix('?') {
        Some(rest) => (rest, true),
        None => (rest, false),
    };
    let (rest, is_array) = match rest.strip_suffix("[]") {
        Some(rest) => (rest, true),
        None => (rest, false),
    };
    (rest, is_array, is_optional, is_extension)
}

/// Arena of resolved nodes, memoized by full type string
#[derive(Clone, Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<ResolvedType>,
    memo: HashMap<String, TypeId>,
}

impl TypeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `type_name` against `abi`, reusing nodes already in the graph
    pub fn resolve(&mut self, abi: &Abi, type_name: &str) -> TypeId {
        if let Some(&id) = self.memo.get(type_name) {
            return id;
        }
        let (name, is_array, is_optional, is_extension) = strip_suffixes(type_name);
        let id = TypeId(self.nodes.len());
        trace!("resolving `{type_name}` as node {id}");
        self.nodes.push(ResolvedType {
            id,
            type_name: type_name.to_owned(),
            name: name.to_owned(),
            is_array,
            is_optional,
            is_extension,
            kind: TypeKind::Leaf,
        });
        self.memo.insert(type_name.to_owned(), id);

        let kind = if let Some(alias) = abi.find_alias(name) {
            TypeKind::Alias(self.resolve(abi, &alias.type_))
        } else if let Some(def) = abi.find_struct(name) {
            let base = def.base().map(|base| self.resolve(abi, base));
            let fields = def
                .fields
                .iter()
                .map(|field| (field.name.clone(), self.resolve(abi, &field.type_)))
                .collect();
            TypeKind::Struct { base, fields }
        } else if let Some(def) = abi.find_variant(name) {
            TypeKind::Variant(def.types.iter().map(|ty| self.resolve(abi, ty)).collect())
        } else {
            TypeKind::Leaf
        };
        self.nodes[id.0].kind = kind;
        id
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> &ResolvedType {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn lookup(&self, type_name: &str) -> Option<TypeId> {
        self.memo.get(type_name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedType> {
        self.nodes.iter()
    }

    /// Follows the alias chain starting at the alias node `id`, returning the
    /// first node that is not a bare alias
    ///
    /// A suffixed alias occurrence ends the walk, since its flags must be
    /// applied before its target is coded.
    pub fn follow_alias(&self, id: TypeId, path: &CodingPath) -> Result<TypeId, AbiError> {
        let mut visited = HashSet::from([id]);
        let mut cur = match self.get(id).kind {
            TypeKind::Alias(target) => target,
            _ => return Ok(id),
        };
        loop {
            if !visited.insert(cur) {
                return Err(AbiError::circular(path, &self.get(id).name));
            }
            let node = self.get(cur);
            match node.kind {
                TypeKind::Alias(target) if !node.has_flags() => cur = target,
                _ => return Ok(cur),
            }
        }
    }

    /// Flattens the fields of the struct node `id`, base chain first
    ///
    /// Bases are followed through aliases; a base that is not a struct is an
    /// unknown type, a suffixed base (`foo[]`, `foo?`) is non-conforming,
    /// and a base chain that revisits a struct is circular.
    pub fn flatten_fields(
        &self,
        id: TypeId,
        path: &CodingPath,
    ) -> Result<Vec<(String, TypeId)>, AbiError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cur = id;
        loop {
            if !visited.insert(self.get(cur).name.as_str()) {
                return Err(AbiError::circular(path, &self.get(id).name));
            }
            chain.push(cur);
            let base = match &self.get(cur).kind {
                TypeKind::Struct { base: Some(base), .. } => *base,
                TypeKind::Struct { base: None, .. } => break,
                _ => return Err(AbiError::unknown_type(path, &self.get(cur).name)),
            };
            cur = match self.get(base).kind {
                TypeKind::Alias(_) => self.follow_alias(base, path)?,
                _ => base,
            };
            if !matches!(self.get(cur).kind, TypeKind::Struct { .. }) {
                return Err(AbiError::unknown_type(path, &self.get(cur).name));
            }
            if self.get(cur).has_flags() {
                return Err(AbiError::non_conforming(
                    path,
                    format!("base `{}` of `{}` is not a plain struct", self.get(cur).type_name, self.get(id).name),
                ));
            }
        }
        Ok(chain
            .iter()
            .rev()
            .flat_map(|&ix| match &self.get(ix).kind {
                TypeKind::Struct { fields, .. } => fields.clone(),
                _ => Vec::new(),
            })
            .collect())
    }
}

impl Abi {
    /// Resolves `type_name` into a fresh graph, whose root is [`TypeId(0)`](TypeId)
    #[must_use]
    pub fn resolve(&self, type_name: &str) -> TypeGraph {
        let mut graph = TypeGraph::new();
        graph.resolve(self, type_name);
        graph
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    fn abi(json: &str) -> Abi {
        Abi::from_json(json).unwrap()
    }

    #[test]
    fn suffix_order() {
        assert_eq!(strip_suffixes("string[]?$"), ("string", true, true, true));
        assert_eq!(strip_suffixes("name?"), ("name", false, true, false));
        assert_eq!(strip_suffixes("int8[]"), ("int8", true, false, false));
        assert_eq!(strip_suffixes("int8?[]"), ("int8?", true, false, false));
        assert_eq!(strip_suffixes("bool"), ("bool", false, false, false));
    }

    #[test]
    fn struct_with_base() {
        let abi = abi(r#"{"structs": [
            {"name": "foo", "base": "", "fields": [{"name": "one", "type": "string"}]},
            {"name": "bar", "base": "foo", "fields": [{"name": "four", "type": "string[]?"}]}
        ]}"#);
        let graph = abi.resolve("bar");
        let root = graph.get(TypeId(0));
        assert_eq!(root.name, "bar");
        let fields = graph.flatten_fields(root.id, &CodingPath::default()).unwrap();
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["one", "four"]);
        let four = graph.get(fields[1].1);
        assert!(four.is_array && four.is_optional && !four.is_extension);
        assert_eq!(four.name, "string");
        assert_eq!(graph.lookup("string"), Some(fields[0].1));
    }

    #[test]
    fn memoized_self_reference() {
        let abi = abi(r#"{"structs": [
            {"name": "node", "fields": [{"name": "next", "type": "node?"}]}
        ]}"#);
        let graph = abi.resolve("node");
        assert_eq!(graph.len(), 2);
        let next = graph.lookup("node?").unwrap();
        assert!(matches!(
            &graph.get(next).kind,
            TypeKind::Struct { fields, .. } if fields[0].1 == next
        ));
    }

    #[test]
    fn alias_cycles() {
        let abi = abi(r#"{"types": [
            {"new_type_name": "a", "type": "a"},
            {"new_type_name": "b1", "type": "b2"},
            {"new_type_name": "b2", "type": "b1"},
            {"new_type_name": "c", "type": "d"},
            {"new_type_name": "d", "type": "uint8"}
        ]}"#);
        let path = CodingPath::default();
        for name in ["a", "b1"] {
            let graph = abi.resolve(name);
            let err = graph.follow_alias(TypeId(0), &path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CircularType);
        }
        let graph = abi.resolve("c");
        let leaf = graph.follow_alias(TypeId(0), &path).unwrap();
        assert_eq!(graph.get(leaf).name, "uint8");
        assert_eq!(graph.get(leaf).kind, TypeKind::Leaf);
    }

    #[test]
    fn base_cycles() {
        let abi = abi(r#"{"structs": [
            {"name": "x", "base": "y", "fields": []},
            {"name": "y", "base": "x", "fields": []},
            {"name": "z", "base": "uint8", "fields": []}
        ]}"#);
        let path = CodingPath::default();
        let graph = abi.resolve("x");
        assert_eq!(
            graph.flatten_fields(TypeId(0), &path).unwrap_err().kind(),
            ErrorKind::CircularType
        );
        let graph = abi.resolve("z");
        assert_eq!(
            graph.flatten_fields(TypeId(0), &path).unwrap_err().kind(),
            ErrorKind::UnknownType
        );
    }

    #[test]
    fn suffixed_bases() {
        let abi = abi(r#"{
            "types": [{"new_type_name": "foos", "type": "foo[]"}],
            "structs": [
                {"name": "foo", "base": "", "fields": [{"name": "one", "type": "string"}]},
                {"name": "via_alias", "base": "foos", "fields": []},
                {"name": "direct", "base": "foo?", "fields": []},
                {"name": "plain", "base": "foo", "fields": [{"name": "two", "type": "int8"}]}
            ]
        }"#);
        let path = CodingPath::default();
        for name in ["via_alias", "direct"] {
            let graph = abi.resolve(name);
            assert_eq!(
                graph.flatten_fields(TypeId(0), &path).unwrap_err().kind(),
                ErrorKind::NonConformingValue,
                "{name}"
            );
        }
        let graph = abi.resolve("plain");
        let names: Vec<String> = graph
            .flatten_fields(TypeId(0), &path)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["one", "two"]);
    }
}
