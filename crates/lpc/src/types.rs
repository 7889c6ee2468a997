use std::fmt;

use serde::Serialize;

use crate::ast::{BasicKind, Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// A keyword type; `type_file` narrows `object` and `exception` to a
    /// program.
    Basic {
        kind: BasicKind,
        type_file: Option<String>,
    },
    Array(Box<Type>),
    Or(Box<Type>, Box<Type>),
    FunctionReference {
        return_type: Box<Type>,
        parameters: Vec<Type>,
        variadic: bool,
    },
    /// The type of `this`: an object of the file being resolved.
    This,
}

impl Type {
    pub fn basic(kind: BasicKind) -> Self {
        Type::Basic {
            kind,
            type_file: None,
        }
    }

    pub fn object(file: impl Into<String>) -> Self {
        Type::Basic {
            kind: BasicKind::Object,
            type_file: Some(file.into()),
        }
    }

    pub fn any() -> Self {
        Type::basic(BasicKind::Any)
    }

    pub fn void() -> Self {
        Type::basic(BasicKind::Void)
    }

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    pub fn or(lhs: Type, rhs: Type) -> Self {
        Type::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn function(return_type: Type, parameters: Vec<Type>, variadic: bool) -> Self {
        Type::FunctionReference {
            return_type: Box::new(return_type),
            parameters,
            variadic,
        }
    }

    /// `nil` fits every reference-like type.
    pub fn nil() -> Self {
        Type::or(
            Type::basic(BasicKind::Mapping),
            Type::or(
                Type::basic(BasicKind::Object),
                Type::or(
                    Type::basic(BasicKind::String),
                    Type::basic(BasicKind::Symbol),
                ),
            ),
        )
    }

    /// Reads a type node; holes and anything unrecognized become `any`.
    pub fn from_node(node: &Node) -> Self {
        match &node.kind {
            NodeKind::BasicType { kind, type_file } => Type::Basic {
                kind: *kind,
                type_file: type_file.clone(),
            },
            NodeKind::ArrayType { element } => Type::array(Type::from_node(element)),
            NodeKind::OrType { lhs, rhs } => Type::or(Type::from_node(lhs), Type::from_node(rhs)),
            NodeKind::FunctionReferenceType {
                return_type,
                parameters,
                variadic,
            } => Type::function(
                Type::from_node(return_type),
                parameters.iter().map(Type::from_node).collect(),
                *variadic,
            ),
            NodeKind::Combination { primary, .. } => Type::from_node(primary),
            _ => Type::any(),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(
            self,
            Type::Basic {
                kind: BasicKind::Any | BasicKind::Auto,
                ..
            }
        )
    }

    /// Replaces `This` with `object<file>` for the given program.
    pub fn resolve_this(&self, this_file: Option<&str>) -> Type {
        match self {
            Type::This => Type::Basic {
                kind: BasicKind::Object,
                type_file: this_file.map(str::to_string),
            },
            Type::Array(element) => Type::array(element.resolve_this(this_file)),
            Type::Or(lhs, rhs) => Type::or(lhs.resolve_this(this_file), rhs.resolve_this(this_file)),
            Type::FunctionReference {
                return_type,
                parameters,
                variadic,
            } => Type::function(
                return_type.resolve_this(this_file),
                parameters
                    .iter()
                    .map(|parameter| parameter.resolve_this(this_file))
                    .collect(),
                *variadic,
            ),
            Type::Basic { .. } => self.clone(),
        }
    }

    /// Whether a value of type `from` may be stored where `self` is expected.
    pub fn is_assignable(&self, from: &Type) -> bool {
        self.is_assignable_in(from, None)
    }

    /// Like [`Type::is_assignable`], resolving `this` to `object<this_file>`.
    pub fn is_assignable_in(&self, from: &Type, this_file: Option<&str>) -> bool {
        let to = self.resolve_this(this_file);
        let from = from.resolve_this(this_file);
        to.assignable(&from)
    }

    fn assignable(&self, from: &Type) -> bool {
        if self.is_any() || from.is_any() {
            return true;
        }
        match (self, from) {
            (Type::Or(lhs, rhs), _) => lhs.assignable(from) || rhs.assignable(from),
            // A union source fits when one of its members does; this is what
            // lets `nil` flow into `string`.
            (_, Type::Or(lhs, rhs)) => self.assignable(lhs) || self.assignable(rhs),
            (
                Type::Basic {
                    kind: to_kind,
                    type_file: to_file,
                },
                Type::Basic {
                    kind: from_kind,
                    type_file: from_file,
                },
            ) => to_kind == from_kind && (to_file.is_none() || to_file == from_file),
            (Type::Array(to), Type::Array(from)) => to.assignable(from),
            (
                Type::Basic {
                    kind: BasicKind::Function,
                    ..
                },
                Type::FunctionReference { .. },
            ) => true,
            (
                Type::FunctionReference {
                    return_type: to_return,
                    parameters: to_parameters,
                    variadic: to_variadic,
                },
                Type::FunctionReference {
                    return_type: from_return,
                    parameters: from_parameters,
                    variadic: from_variadic,
                },
            ) => {
                let arity = if *from_variadic {
                    to_parameters.len() >= from_parameters.len()
                } else {
                    to_parameters.len() == from_parameters.len() && !to_variadic
                };
                arity
                    && to_parameters
                        .iter()
                        .zip(from_parameters)
                        .all(|(to, from)| from.assignable(to))
                    && to_return.assignable(from_return)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic { kind, type_file } => {
                f.write_str(kind.as_str())?;
                if let Some(file) = type_file {
                    write!(f, "<{file:?}>")?;
                }
                Ok(())
            }
            Type::Array(element) => match element.as_ref() {
                Type::Or(..) | Type::FunctionReference { .. } => write!(f, "({element})[]"),
                _ => write!(f, "{element}[]"),
            },
            Type::Or(lhs, rhs) => write!(f, "{lhs}|{rhs}"),
            Type::FunctionReference {
                return_type,
                parameters,
                variadic,
            } => {
                write!(f, "{return_type}(")?;
                for (index, parameter) in parameters.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{parameter}")?;
                }
                if *variadic {
                    f.write_str("...")?;
                }
                f.write_str(")")
            }
            Type::This => f.write_str("this"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> Type {
        Type::basic(BasicKind::Int)
    }

    fn string() -> Type {
        Type::basic(BasicKind::String)
    }

    #[test]
    fn arrays_compare_element_types() {
        assert!(Type::array(int()).is_assignable(&Type::array(int())));
        assert!(!Type::array(int()).is_assignable(&Type::array(string())));
        assert!(!Type::array(int()).is_assignable(&int()));
    }

    #[test]
    fn variadic_source_covers_longer_targets() {
        let fixed = Type::function(Type::void(), vec![int()], false);
        let variadic = Type::function(Type::void(), vec![int()], true);
        assert!(fixed.is_assignable(&variadic));
        assert!(!variadic.is_assignable(&fixed));
        let wider = Type::function(Type::void(), vec![int(), string()], false);
        assert!(wider.is_assignable(&variadic));
        assert!(!wider.is_assignable(&fixed));
    }

    #[test]
    fn function_references_check_returns_and_parameters() {
        let returns_int = Type::function(int(), vec![], false);
        let returns_string = Type::function(string(), vec![], false);
        assert!(!returns_int.is_assignable(&returns_string));
        let takes_any = Type::function(Type::void(), vec![Type::any()], false);
        let takes_int = Type::function(Type::void(), vec![int()], false);
        assert!(takes_int.is_assignable(&takes_any));
        assert!(Type::basic(BasicKind::Function).is_assignable(&takes_int));
    }

    #[test]
    fn nil_fits_reference_types_only() {
        assert!(string().is_assignable(&Type::nil()));
        assert!(Type::basic(BasicKind::Mapping).is_assignable(&Type::nil()));
        assert!(!int().is_assignable(&Type::nil()));
    }

    #[test]
    fn or_targets_accept_either_member() {
        let either = Type::or(int(), string());
        assert!(either.is_assignable(&int()));
        assert!(either.is_assignable(&string()));
        assert!(!either.is_assignable(&Type::basic(BasicKind::Float)));
    }

    #[test]
    fn object_files_narrow_objects() {
        let any_object = Type::basic(BasicKind::Object);
        let room = Type::object("/std/room");
        assert!(any_object.is_assignable(&room));
        assert!(!room.is_assignable(&Type::object("/std/item")));
        assert!(room.is_assignable_in(&Type::This, Some("/std/room")));
        assert!(!room.is_assignable_in(&Type::This, Some("/std/item")));
    }

    #[test]
    fn display_uses_source_syntax() {
        let ty = Type::function(
            Type::void(),
            vec![Type::array(Type::or(int(), string())), Type::object("/x")],
            true,
        );
        assert_eq!(ty.to_string(), "void((int|string)[], object<\"/x\">...)");
        assert_eq!(Type::function(int(), vec![], true).to_string(), "int(...)");
    }
}
