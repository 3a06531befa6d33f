//! Resolves leafref types to the type of the leaf they point to.
use crate::schema::{LeafrefStep, SchemaContext, TypeDefinition};
use crate::{Error, QName};

/// Replaces every leafref in `type_def` (including union members and typedef
/// bases) with the type of its target. `leaf_path` is the data tree path of
/// the leaf `type_def` belongs to; relative leafref paths start there.
pub(super) fn resolve(
    schema: &SchemaContext,
    type_def: &TypeDefinition,
    leaf_path: &[QName],
) -> Result<TypeDefinition, Error> {
    let mut visited = vec![leaf_path.to_vec()];
    resolve_inner(schema, type_def, leaf_path, &mut visited)
}

fn resolve_inner(
    schema: &SchemaContext,
    type_def: &TypeDefinition,
    leaf_path: &[QName],
    visited: &mut Vec<Vec<QName>>,
) -> Result<TypeDefinition, Error> {
    Ok(match type_def {
        TypeDefinition::Leafref(path) => {
            let mut target = if path.absolute {
                Vec::new()
            } else {
                leaf_path.to_vec()
            };
            for step in &path.steps {
                match step {
                    LeafrefStep::Parent => {
                        target.pop().ok_or_else(|| {
                            Error::SchemaConstruction(format!(
                                "leafref of {} escapes the data tree",
                                display(leaf_path)
                            ))
                        })?;
                    }
                    LeafrefStep::Child(name) => target.push(name.clone()),
                }
            }

            if visited.contains(&target) {
                return Err(Error::SchemaConstruction(format!(
                    "leafref of {} refers back to {}",
                    display(leaf_path),
                    display(&target)
                )));
            }

            let referenced = schema.find_data_node(&target).ok_or_else(|| {
                Error::SchemaConstruction(format!(
                    "leafref target {} of {} does not exist",
                    display(&target),
                    display(leaf_path)
                ))
            })?;
            let referenced_type = referenced.type_definition().ok_or_else(|| {
                Error::SchemaConstruction(format!(
                    "leafref target {} is not a leaf",
                    display(&target)
                ))
            })?;

            visited.push(target.clone());
            let resolved = resolve_inner(schema, referenced_type, &target, visited)?;
            visited.pop();
            resolved
        }
        TypeDefinition::Union(members) => TypeDefinition::Union(
            members
                .iter()
                .map(|m| resolve_inner(schema, m, leaf_path, visited))
                .collect::<Result<_, _>>()?,
        ),
        TypeDefinition::Derived(derived) => TypeDefinition::derived(
            derived.name.clone(),
            resolve_inner(schema, &derived.base, leaf_path, visited)?,
            derived.restrictions.clone(),
        ),
        other => other.clone(),
    })
}

fn display(path: &[QName]) -> String {
    let mut out = String::new();
    for name in path {
        out.push('/');
        out.push_str(name.local_name());
    }
    out
}
