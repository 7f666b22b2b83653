//! Schema synthesis from declared type shapes
//!
//! When a call supplies a type descriptor but no schema document,
//! [`synthesize`] derives one: a depth-first walk over the declared
//! [`Shape`]s reachable from the root, emitting one alias, struct or variant
//! entry per distinct descriptor. Descriptors are told apart by identity,
//! not by name. A final alias named [`ROOT_ALIAS`] points at the root type.

use std::collections::HashSet;

use log::debug;

use crate::registry::{descriptor_addr, Shape, TypeDescriptor};
use crate::schema::{Abi, AbiField, AbiStruct, AbiTypeDef, AbiVariant};

/// Name of the alias that a synthesized document resolves its root type under
pub const ROOT_ALIAS: &str = "root";

/// Synthesized document, plus every descriptor reached while building it
#[derive(Debug)]
pub struct Synthesized {
    pub abi: Abi,
    pub types: Vec<&'static dyn TypeDescriptor>,
}

struct Walker {
    abi: Abi,
    types: Vec<&'static dyn TypeDescriptor>,
    visited: HashSet<*const ()>,
}

impl Walker {
    fn visit(&mut self, descriptor: &'static dyn TypeDescriptor) {
        if !self.visited.insert(descriptor_addr(descriptor)) {
            return;
        }
        self.types.push(descriptor);
        let name = descriptor.abi_name().to_owned();
        match descriptor.shape() {
            None => (),
            Some(Shape::Struct { base, fields }) => {
                self.abi.structs.push(AbiStruct {
                    name,
                    base: base.map_or_else(String::new, |b| b.abi_name().to_owned()),
                    fields: fields
                        .iter()
                        .map(|field| AbiField {
                            name: field.name.to_owned(),
                            type_: field.ty.type_name(),
                        })
                        .collect(),
                });
                if let Some(base) = base {
                    self.visit(base);
                }
                for field in fields {
                    self.visit(field.ty.descriptor);
                }
            }
            Some(Shape::Variant(branches)) => {
                self.abi.variants.push(AbiVariant {
                    name,
                    types: branches.iter().map(|b| b.type_name()).collect(),
                });
                for branch in branches {
                    self.visit(branch.descriptor);
                }
            }
            Some(Shape::Alias(target)) => {
                self.abi.types.push(AbiTypeDef {
                    new_type_name: name,
                    type_: target.type_name(),
                });
                self.visit(target.descriptor);
            }
        }
    }
}

/// Derives a schema document from the declared shape of `root`
#[must_use]
pub fn synthesize(root: &'static dyn TypeDescriptor) -> Synthesized {
    let mut walker = Walker {
        abi: Abi::new(),
        types: Vec::new(),
        visited: HashSet::new(),
    };
    walker.visit(root);
    let Walker { mut abi, types, .. } = walker;
    abi.types.push(AbiTypeDef {
        new_type_name: ROOT_ALIAS.to_owned(),
        type_: root.abi_name().to_owned(),
    });
    debug!(
        "synthesized schema for `{}`: {} aliases, {} structs, {} variants",
        root.abi_name(),
        abi.types.len(),
        abi.structs.len(),
        abi.variants.len()
    );
    Synthesized { abi, types }
}
