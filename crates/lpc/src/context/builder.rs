use crate::ast::{BasicKind, BinaryOp, Expected, Modifier, Node, NodeKind, UnaryOp};
use crate::types::Type;

use super::{
    Context, ContextId, ContextProvider, ContextTree, Definition, DefinitionKind, Instruction,
    Resolution,
};

/// Builds the context tree of one parsed file. Include and inherit targets
/// come from `provider`; the ones it lacks are listed in
/// [`Resolution::unresolved`] so the caller can load them and resolve again.
pub fn resolve(
    nodes: &[Node],
    file_name: Option<&str>,
    provider: &dyn ContextProvider,
) -> Resolution {
    let mut builder = Builder {
        tree: ContextTree::empty(file_name),
        provider,
        unresolved: Vec::new(),
    };
    for node in nodes {
        builder.visit(node, ContextId::ROOT);
    }
    Resolution {
        tree: builder.tree,
        unresolved: builder.unresolved,
    }
}

struct Builder<'p> {
    tree: ContextTree,
    provider: &'p dyn ContextProvider,
    unresolved: Vec<String>,
}

impl Builder<'_> {
    fn push_scope(&mut self, parent: ContextId, begin: usize, end: usize) -> ContextId {
        let id = ContextId(self.tree.contexts.len());
        self.tree
            .contexts
            .push(Context::new(begin, end, Some(parent)));
        self.tree.contexts[parent.0].children.push(id);
        id
    }

    /// Opens a scope for a block node; an unclosed block extends to the end
    /// of the file and beyond, so typing at the end stays inside it.
    fn push_block_scope(&mut self, parent: ContextId, block: &Node) -> ContextId {
        let end = if is_unclosed(block) {
            usize::MAX
        } else {
            block.end
        };
        self.push_scope(parent, block.begin, end)
    }

    fn define(&mut self, scope: ContextId, definition: Definition) {
        self.tree.contexts[scope.0]
            .instructions
            .entry(definition.begin)
            .or_insert(Instruction::Define(definition));
    }

    fn this_file(&self) -> Option<&str> {
        self.tree.file_name()
    }

    fn link(&mut self, node: &Node, path: &Node, inherit: bool) {
        let Some(path) = string_value(path) else {
            return;
        };
        let instruction = if inherit {
            Instruction::Inherit { path: path.clone() }
        } else {
            Instruction::Include { path: path.clone() }
        };
        self.tree.contexts[0]
            .instructions
            .entry(node.begin)
            .or_insert(instruction);
        match self.provider.context_for(&path) {
            Some(tree) => {
                let root = &mut self.tree.contexts[0];
                if inherit {
                    root.inherited.push(tree);
                } else {
                    root.included.push(tree);
                }
            }
            None => {
                tracing::debug!(target_file = %path, inherit, "dependency not loaded");
                if !self.unresolved.contains(&path) {
                    self.unresolved.push(path);
                }
            }
        }
    }

    /// Visits `node` in `scope` and returns the type of the value it
    /// produces; statements produce `void`.
    fn visit(&mut self, node: &Node, scope: ContextId) -> Type {
        match &node.kind {
            NodeKind::Missing { .. } | NodeKind::Wrong { .. } => Type::any(),
            NodeKind::Combination {
                primary,
                diagnostics,
            } => {
                match primary.kind {
                    NodeKind::Block { .. } => return self.visit_block(scope, node),
                    NodeKind::Class { .. } => return self.visit_class(scope, node),
                    _ => {}
                }
                let ty = self.visit(primary, scope);
                for diagnostic in diagnostics {
                    self.visit(diagnostic, scope);
                }
                ty
            }
            NodeKind::Include { path } => {
                self.link(node, path, false);
                Type::void()
            }
            NodeKind::Inherit { path } => {
                self.link(node, path, true);
                Type::void()
            }
            NodeKind::Class { .. } => self.visit_class(scope, node),
            NodeKind::Modifiers { .. } => Type::void(),
            NodeKind::VariableDefinition {
                modifiers,
                ty,
                name,
                value,
                ..
            } => {
                let value_type = value.as_deref().map(|value| self.visit(value, scope));
                let declared = match (ty.as_deref(), value_type) {
                    (Some(ty), _) => Type::from_node(ty),
                    (None, Some(value_type)) => value_type,
                    (None, None) => Type::any(),
                };
                self.define_variable(scope, node, name, declared, modifiers.as_deref());
                Type::void()
            }
            NodeKind::FunctionDefinition {
                modifiers,
                return_type,
                name,
                parameters,
                variadic,
                body,
            } => {
                self.visit_function(
                    scope,
                    node,
                    modifiers.as_deref(),
                    return_type,
                    name,
                    parameters,
                    *variadic,
                    body.as_deref(),
                );
                Type::void()
            }
            NodeKind::Parameter { .. } => Type::void(),
            NodeKind::Block { .. } => self.visit_block(scope, node),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit(condition, scope);
                self.visit(then_branch, scope);
                if let Some(else_branch) = else_branch {
                    self.visit(else_branch, scope);
                }
                Type::void()
            }
            NodeKind::While { condition, body } | NodeKind::DoWhile { body, condition } => {
                self.visit(condition, scope);
                self.visit(body, scope);
                Type::void()
            }
            NodeKind::For {
                initializer,
                condition,
                step,
                body,
            } => {
                let loop_scope = self.push_scope(scope, node.begin, node.end);
                for part in [initializer, condition, step].into_iter().flatten() {
                    self.visit(part, loop_scope);
                }
                self.visit(body, loop_scope);
                Type::void()
            }
            NodeKind::Foreach {
                variable,
                iterable,
                body,
            } => {
                let iterable_type = self.visit(iterable, scope);
                let loop_scope = self.push_scope(scope, node.begin, node.end);
                self.visit_loop_variable(loop_scope, variable, &iterable_type);
                self.visit(body, loop_scope);
                Type::void()
            }
            NodeKind::Switch { value, cases } => {
                self.visit(value, scope);
                let switch_scope = self.push_scope(scope, node.begin, node.end);
                for case in cases {
                    self.visit(case, switch_scope);
                }
                Type::void()
            }
            NodeKind::Case { label, statements } => {
                if let Some(label) = label {
                    self.visit(label, scope);
                }
                for statement in statements {
                    self.visit(statement, scope);
                }
                Type::void()
            }
            NodeKind::Return { value } => {
                if let Some(value) = value {
                    self.visit(value, scope);
                }
                Type::void()
            }
            NodeKind::TryCatch {
                body,
                exception,
                handler,
            } => {
                self.visit(body, scope);
                let handler_scope = self.push_scope(scope, node.begin, node.end);
                if let Some(exception) = exception {
                    self.visit(exception, handler_scope);
                }
                self.visit(handler, handler_scope);
                Type::void()
            }
            NodeKind::Break | NodeKind::Continue | NodeKind::Empty => Type::void(),

            NodeKind::Name { name } => self
                .tree
                .get_identifiers(scope, name, node.begin, false, true)
                .first()
                .map_or_else(Type::any, |definition| definition.value_type()),
            NodeKind::ScopeChain { scope: label, name } => {
                let Some(name) = name.name_text() else {
                    return Type::any();
                };
                let found = match label.as_deref().and_then(Node::name_text) {
                    Some(label) => self.tree.get_labelled_identifiers(label, name),
                    None => self.tree.get_super_identifiers(name),
                };
                found
                    .first()
                    .map_or_else(Type::any, |definition| definition.value_type())
            }
            NodeKind::FunctionCall { callee, arguments } => {
                let callee_type = self.visit(callee, scope);
                for argument in arguments {
                    self.visit(argument, scope);
                }
                match callee_type {
                    Type::FunctionReference { return_type, .. } => *return_type,
                    _ => Type::any(),
                }
            }
            NodeKind::MemberAccess { receiver, .. } => {
                self.visit(receiver, scope);
                Type::any()
            }
            NodeKind::New { target, arguments } => {
                for argument in arguments {
                    self.visit(argument, scope);
                }
                if is_type_node(target) {
                    return Type::from_node(target);
                }
                self.visit(target, scope);
                match string_value(target) {
                    Some(path) => Type::object(path),
                    None => Type::basic(BasicKind::Object),
                }
            }
            NodeKind::Cast { ty, value } => {
                self.visit(value, scope);
                Type::from_node(ty)
            }
            NodeKind::Subscript { target, index } => {
                let target_type = self.visit(target, scope);
                self.visit(index, scope);
                if matches!(index.primary().kind, NodeKind::Range { .. }) {
                    return target_type;
                }
                match target_type {
                    Type::Array(element) => *element,
                    Type::Basic {
                        kind: BasicKind::String,
                        ..
                    } => Type::basic(BasicKind::Int),
                    _ => Type::any(),
                }
            }
            NodeKind::Range { lower, upper } => {
                for bound in [lower, upper].into_iter().flatten() {
                    self.visit(bound, scope);
                }
                Type::any()
            }
            NodeKind::BinaryOperation { op, lhs, rhs } => {
                let lhs_type = self.visit(lhs, scope);
                let rhs_type = self.visit(rhs, scope);
                binary_type(*op, lhs_type, rhs_type)
            }
            NodeKind::UnaryOperation { op, operand } => {
                let operand_type = self.visit(operand, scope);
                match op {
                    UnaryOp::Not | UnaryOp::Sizeof => Type::basic(BasicKind::Int),
                    _ => operand_type,
                }
            }
            NodeKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                self.visit(condition, scope);
                let then_type = self.visit(then_value, scope);
                let else_type = self.visit(else_value, scope);
                if then_type == else_type {
                    then_type
                } else {
                    Type::or(then_type, else_type)
                }
            }
            NodeKind::TypeTest { value, .. } => {
                self.visit(value, scope);
                Type::basic(BasicKind::Bool)
            }
            NodeKind::ArrayLiteral { items } => {
                let mut element: Option<Type> = None;
                let mut uniform = true;
                for item in items {
                    let item_type = self.visit(item, scope);
                    match &element {
                        None => element = Some(item_type),
                        Some(existing) if *existing != item_type => uniform = false,
                        Some(_) => {}
                    }
                }
                match element {
                    Some(element) if uniform => Type::array(element),
                    _ => Type::array(Type::any()),
                }
            }
            NodeKind::MappingLiteral { entries } => {
                for entry in entries {
                    self.visit(entry, scope);
                }
                Type::basic(BasicKind::Mapping)
            }
            NodeKind::MappingEntry { key, value } => {
                self.visit(key, scope);
                self.visit(value, scope);
                Type::any()
            }
            NodeKind::StringConcatenation { .. } | NodeKind::StringLiteral(_) => {
                Type::basic(BasicKind::String)
            }
            NodeKind::IntLiteral(_) => Type::basic(BasicKind::Int),
            NodeKind::FloatLiteral(_) => Type::basic(BasicKind::Float),
            NodeKind::CharLiteral(_) => Type::basic(BasicKind::Char),
            NodeKind::SymbolLiteral(_) => Type::basic(BasicKind::Symbol),
            NodeKind::BoolLiteral(_) => Type::basic(BasicKind::Bool),
            NodeKind::Nil => Type::nil(),
            NodeKind::This => match self.this_file() {
                Some(file) => Type::object(file),
                None => Type::This,
            },
            NodeKind::BasicType { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::OrType { .. }
            | NodeKind::FunctionReferenceType { .. } => Type::from_node(node),
        }
    }

    /// `block` is a Block node or a combination wrapping one.
    fn visit_block(&mut self, scope: ContextId, block: &Node) -> Type {
        let block_scope = self.push_block_scope(scope, block);
        if let NodeKind::Block { statements } = &block.primary().kind {
            for statement in statements {
                self.visit(statement, block_scope);
            }
        }
        Type::void()
    }

    /// `class` declarations; `class` may still carry the holes of an
    /// unclosed body, which then extends to the end of the file.
    fn visit_class(&mut self, scope: ContextId, class: &Node) -> Type {
        let NodeKind::Class {
            name,
            inherits,
            body,
        } = &class.primary().kind
        else {
            return Type::void();
        };
        let return_type = match inherits.as_deref().and_then(string_value) {
            Some(path) => Type::object(path),
            None => Type::basic(BasicKind::Object),
        };
        if let Some(name) = name.name_text() {
            self.define(
                scope,
                Definition {
                    begin: class.begin,
                    end: class.end,
                    name: name.to_string(),
                    return_type,
                    kind: DefinitionKind::Class,
                    modifiers: Vec::new(),
                },
            );
        }
        if inherits.is_none() {
            let class_scope = self.push_block_scope(scope, class);
            for member in body {
                self.visit(member, class_scope);
            }
        }
        Type::void()
    }

    fn define_variable(
        &mut self,
        scope: ContextId,
        node: &Node,
        name: &Node,
        declared: Type,
        modifiers: Option<&Node>,
    ) {
        let Some(text) = name.name_text() else {
            return;
        };
        self.define(
            scope,
            Definition {
                begin: node.begin,
                end: node.end,
                name: text.to_string(),
                return_type: declared,
                kind: DefinitionKind::Variable,
                modifiers: modifier_list(modifiers),
            },
        );
    }

    fn visit_loop_variable(&mut self, scope: ContextId, variable: &Node, iterable: &Type) {
        let NodeKind::VariableDefinition { ty, name, .. } = &variable.primary().kind else {
            self.visit(variable, scope);
            return;
        };
        let declared = match ty.as_deref() {
            Some(ty) => Type::from_node(ty),
            None => match iterable {
                Type::Array(element) => element.as_ref().clone(),
                Type::Basic {
                    kind: BasicKind::String,
                    ..
                } => Type::basic(BasicKind::Int),
                _ => Type::any(),
            },
        };
        self.define_variable(scope, variable.primary(), name, declared, None);
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_function(
        &mut self,
        scope: ContextId,
        node: &Node,
        modifiers: Option<&Node>,
        return_type: &Node,
        name: &Node,
        parameters: &[Node],
        variadic: bool,
        body: Option<&Node>,
    ) {
        let parameter_types: Vec<Type> = parameters.iter().map(parameter_type).collect();
        if let Some(text) = name.name_text() {
            self.define(
                scope,
                Definition {
                    begin: node.begin,
                    end: node.end,
                    name: text.to_string(),
                    return_type: Type::from_node(return_type),
                    kind: DefinitionKind::Function {
                        parameters: parameter_types,
                        variadic,
                    },
                    modifiers: modifier_list(modifiers),
                },
            );
        }
        let Some(body) = body else {
            return;
        };
        let body_scope = self.push_block_scope(scope, body);
        self.tree.contexts[body_scope.0].owner = Some(node.begin);
        for parameter in parameters {
            let NodeKind::Parameter { ty, name: Some(name) } = &parameter.primary().kind else {
                continue;
            };
            let Some(text) = name.name_text() else {
                continue;
            };
            self.define(
                body_scope,
                Definition {
                    begin: parameter.begin,
                    end: parameter.end,
                    name: text.to_string(),
                    return_type: Type::from_node(ty),
                    kind: DefinitionKind::Parameter,
                    modifiers: Vec::new(),
                },
            );
        }
        // The body block shares the scope its parameters live in.
        match &body.primary().kind {
            NodeKind::Block { statements } => {
                for statement in statements {
                    self.visit(statement, body_scope);
                }
            }
            _ => {
                self.visit(body, body_scope);
            }
        }
    }
}

fn parameter_type(parameter: &Node) -> Type {
    match &parameter.primary().kind {
        NodeKind::Parameter { ty, .. } => Type::from_node(ty),
        _ => Type::any(),
    }
}

fn modifier_list(modifiers: Option<&Node>) -> Vec<Modifier> {
    match modifiers.map(|node| &node.kind) {
        Some(NodeKind::Modifiers { modifiers }) => modifiers.clone(),
        _ => Vec::new(),
    }
}

fn is_type_node(node: &Node) -> bool {
    matches!(
        node.primary().kind,
        NodeKind::BasicType { .. }
            | NodeKind::ArrayType { .. }
            | NodeKind::OrType { .. }
            | NodeKind::FunctionReferenceType { .. }
    )
}

/// A block whose closing brace was reported missing.
fn is_unclosed(block: &Node) -> bool {
    let NodeKind::Combination { diagnostics, .. } = &block.kind else {
        return false;
    };
    diagnostics.iter().any(|diagnostic| {
        matches!(
            diagnostic.kind,
            NodeKind::Missing {
                expected: Expected::RightBrace,
                ..
            }
        )
    })
}

/// The text of a string literal or of adjacent concatenated literals.
pub(crate) fn string_value(node: &Node) -> Option<String> {
    match &node.primary().kind {
        NodeKind::StringLiteral(text) => Some(text.clone()),
        NodeKind::StringConcatenation { parts } => {
            let mut out = String::new();
            for part in parts {
                match &part.kind {
                    NodeKind::StringLiteral(text) => out.push_str(text),
                    _ => return None,
                }
            }
            Some(out)
        }
        _ => None,
    }
}

fn binary_type(op: BinaryOp, lhs: Type, rhs: Type) -> Type {
    if op.is_assignment() {
        return lhs;
    }
    if op.is_comparison() {
        return Type::basic(BasicKind::Int);
    }
    let kind_of = |ty: &Type| match ty {
        Type::Basic { kind, .. } => Some(*kind),
        _ => None,
    };
    match (kind_of(&lhs), kind_of(&rhs)) {
        (Some(BasicKind::String), _) | (_, Some(BasicKind::String))
            if op == BinaryOp::Add =>
        {
            Type::basic(BasicKind::String)
        }
        (Some(BasicKind::Float), Some(BasicKind::Int))
        | (Some(BasicKind::Int), Some(BasicKind::Float)) => Type::basic(BasicKind::Float),
        _ if lhs == rhs => lhs,
        _ => Type::any(),
    }
}
