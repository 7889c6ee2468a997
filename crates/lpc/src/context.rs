use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::ast::{Modifier, Node};
use crate::types::Type;

mod builder;

pub use builder::resolve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContextId(usize);

impl ContextId {
    pub const ROOT: ContextId = ContextId(0);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DefinitionKind {
    Variable,
    Parameter,
    Function { parameters: Vec<Type>, variadic: bool },
    Class,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub begin: usize,
    pub end: usize,
    pub name: String,
    /// Declared type of a variable, or the return type of a function.
    pub return_type: Type,
    pub kind: DefinitionKind,
    pub modifiers: Vec<Modifier>,
}

impl Definition {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, DefinitionKind::Function { .. })
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// The type of the name used as a value: functions become references.
    pub fn value_type(&self) -> Type {
        match &self.kind {
            DefinitionKind::Function {
                parameters,
                variadic,
            } => Type::function(self.return_type.clone(), parameters.clone(), *variadic),
            _ => self.return_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Instruction {
    Define(Definition),
    Include { path: String },
    Inherit { path: String },
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub begin: usize,
    /// `usize::MAX` for blocks whose closing brace is missing.
    pub end: usize,
    pub parent: Option<ContextId>,
    pub children: Vec<ContextId>,
    pub file_name: Option<String>,
    pub instructions: BTreeMap<usize, Instruction>,
    pub included: Vec<Arc<ContextTree>>,
    pub inherited: Vec<Arc<ContextTree>>,
    /// Offset of the function definition whose body this context is.
    pub owner: Option<usize>,
}

impl Context {
    fn new(begin: usize, end: usize, parent: Option<ContextId>) -> Self {
        Self {
            begin,
            end,
            parent,
            ..Self::default()
        }
    }

    /// Strictly inside: a cursor on the opening brace is still outside.
    pub fn contains(&self, pos: usize) -> bool {
        self.begin < pos && pos < self.end
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.instructions.values().filter_map(|instruction| match instruction {
            Instruction::Define(definition) => Some(definition),
            _ => None,
        })
    }

    fn definitions_before(&self, pos: usize) -> impl Iterator<Item = &Definition> {
        self.instructions
            .range(..pos)
            .filter_map(|(_, instruction)| match instruction {
                Instruction::Define(definition) => Some(definition),
                _ => None,
            })
    }
}

/// Which members of inherited programs a lookup may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub include_private: bool,
    pub include_protected: bool,
}

impl Visibility {
    /// What code in an inheriting program sees.
    pub const INHERITOR: Visibility = Visibility {
        include_private: false,
        include_protected: true,
    };

    fn admits(self, definition: &Definition) -> bool {
        (self.include_private || !definition.has_modifier(Modifier::Private))
            && (self.include_protected || !definition.has_modifier(Modifier::Protected))
    }
}

/// All contexts of one file, stored as an arena rooted at [`ContextId::ROOT`].
#[derive(Debug, Clone)]
pub struct ContextTree {
    contexts: Vec<Context>,
}

impl ContextTree {
    pub fn empty(file_name: Option<&str>) -> Self {
        let mut root = Context::new(0, usize::MAX, None);
        root.file_name = file_name.map(str::to_string);
        Self {
            contexts: vec![root],
        }
    }

    pub fn root(&self) -> ContextId {
        ContextId::ROOT
    }

    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.0]
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.len() <= 1 && self.contexts[0].instructions.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.contexts[0].file_name.as_deref()
    }

    pub fn top_level_definitions(&self) -> impl Iterator<Item = &Definition> {
        self.contexts[0].definitions()
    }

    /// Include and inherit paths named by the file, in source order.
    pub fn dependencies(&self) -> Vec<String> {
        self.contexts[0]
            .instructions
            .values()
            .filter_map(|instruction| match instruction {
                Instruction::Include { path } | Instruction::Inherit { path } => {
                    Some(path.clone())
                }
                Instruction::Define(_) => None,
            })
            .collect()
    }

    /// The innermost context containing `pos`.
    pub fn scope_at(&self, pos: usize) -> ContextId {
        let mut scope = ContextId::ROOT;
        loop {
            let next = self.contexts[scope.0]
                .children
                .iter()
                .rev()
                .find(|child| self.contexts[child.0].contains(pos));
            match next {
                Some(child) => scope = *child,
                None => return scope,
            }
        }
    }

    /// Definitions named `name` visible from `scope` at `pos`: own ones
    /// declared before `pos`, then the enclosing contexts, then included
    /// files, then inherited programs.
    pub fn get_identifiers(
        &self,
        scope: ContextId,
        name: &str,
        pos: usize,
        include_private: bool,
        include_protected: bool,
    ) -> Vec<&Definition> {
        let visibility = Visibility {
            include_private,
            include_protected,
        };
        self.lookup(scope, name, pos, visibility)
    }

    fn lookup(
        &self,
        scope: ContextId,
        name: &str,
        pos: usize,
        visibility: Visibility,
    ) -> Vec<&Definition> {
        let context = &self.contexts[scope.0];
        let own: Vec<&Definition> = context
            .definitions_before(pos)
            .filter(|definition| definition.name == name)
            .collect();
        if !own.is_empty() {
            return own;
        }
        if let Some(parent) = context.parent {
            let found = self.lookup(parent, name, pos, visibility);
            if !found.is_empty() {
                return found;
            }
        }
        for included in &context.included {
            let found = included.lookup(ContextId::ROOT, name, usize::MAX, visibility);
            if !found.is_empty() {
                return found;
            }
        }
        if context.parent.is_none() {
            return self.super_lookup(name, visibility);
        }
        Vec::new()
    }

    /// Resolves `::name`: only inherited programs are searched.
    pub fn get_super_identifiers(&self, name: &str) -> Vec<&Definition> {
        self.super_lookup(name, Visibility::INHERITOR)
    }

    fn super_lookup(&self, name: &str, visibility: Visibility) -> Vec<&Definition> {
        for inherited in &self.contexts[0].inherited {
            let found = inherited.inherited_lookup(name, visibility);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// `name` as a program inheriting this one sees it. Members hidden by
    /// `visibility` are passed over, so the search goes on into the files
    /// this one includes and inherits.
    fn inherited_lookup(&self, name: &str, visibility: Visibility) -> Vec<&Definition> {
        let root = &self.contexts[0];
        let own: Vec<&Definition> = root
            .definitions()
            .filter(|definition| definition.name == name && visibility.admits(definition))
            .collect();
        if !own.is_empty() {
            return own;
        }
        for included in &root.included {
            let found = included.inherited_lookup(name, visibility);
            if !found.is_empty() {
                return found;
            }
        }
        self.super_lookup(name, visibility)
    }

    /// Resolves `label::name`, where `label` is the last path segment of an
    /// inherited program, without extension.
    pub fn get_labelled_identifiers(&self, label: &str, name: &str) -> Vec<&Definition> {
        let labelled = self.contexts[0]
            .inherited
            .iter()
            .find(|inherited| inherited.file_name().is_some_and(|file| file_label(file) == label));
        match labelled {
            Some(inherited) => inherited.inherited_lookup(name, Visibility::INHERITOR),
            None => self.get_super_identifiers(name),
        }
    }

    /// Everything visible at `pos`; inner names shadow outer ones.
    pub fn visible_definitions(&self, pos: usize) -> Vec<&Definition> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut scope = Some(self.scope_at(pos));
        while let Some(id) = scope {
            let context = &self.contexts[id.0];
            for definition in context.definitions_before(pos) {
                if seen.insert(definition.name.as_str()) {
                    out.push(definition);
                }
            }
            scope = context.parent;
        }
        let mut visited = HashSet::new();
        self.collect_outside(&mut seen, &mut out, &mut visited);
        out
    }

    fn collect_outside<'a>(
        &'a self,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<&'a Definition>,
        visited: &mut HashSet<*const ContextTree>,
    ) {
        let root = &self.contexts[0];
        for included in &root.included {
            if !visited.insert(Arc::as_ptr(included)) {
                continue;
            }
            for definition in included.top_level_definitions() {
                if seen.insert(definition.name.as_str()) {
                    out.push(definition);
                }
            }
            included.collect_outside(seen, out, visited);
        }
        for inherited in &root.inherited {
            if !visited.insert(Arc::as_ptr(inherited)) {
                continue;
            }
            for definition in inherited.top_level_definitions() {
                if Visibility::INHERITOR.admits(definition) && seen.insert(definition.name.as_str())
                {
                    out.push(definition);
                }
            }
            inherited.collect_outside(seen, out, visited);
        }
    }

    /// The function whose body contains `pos`.
    pub fn query_enclosing_function(&self, pos: usize) -> Option<&Definition> {
        let mut scope = Some(self.scope_at(pos));
        while let Some(id) = scope {
            let context = &self.contexts[id.0];
            if let (Some(owner), Some(parent)) = (context.owner, context.parent) {
                return match self.contexts[parent.0].instructions.get(&owner) {
                    Some(Instruction::Define(definition)) => Some(definition),
                    _ => None,
                };
            }
            scope = context.parent;
        }
        None
    }

    /// Resolves the type of the expression-bearing name at `node`, if any.
    pub fn type_of_name(&self, node: &Node, pos: usize) -> Option<Type> {
        let name = node.name_text()?;
        let scope = self.scope_at(pos);
        let found = self.get_identifiers(scope, name, pos, false, true);
        found.first().map(|definition| definition.value_type())
    }
}

fn file_label(file: &str) -> &str {
    let last = file.rsplit('/').next().unwrap_or(file);
    last.split('.').next().unwrap_or(last)
}

/// Supplies the resolved contexts of other files by name.
pub trait ContextProvider {
    fn context_for(&self, name: &str) -> Option<Arc<ContextTree>>;
}

impl ContextProvider for HashMap<String, Arc<ContextTree>> {
    fn context_for(&self, name: &str) -> Option<Arc<ContextTree>> {
        self.get(name).cloned()
    }
}

/// A provider that knows no files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContexts;

impl ContextProvider for NoContexts {
    fn context_for(&self, _name: &str) -> Option<Arc<ContextTree>> {
        None
    }
}

/// The outcome of resolving one file.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tree: ContextTree,
    /// Include and inherit targets the provider could not supply.
    pub unresolved: Vec<String>,
}

#[cfg(test)]
mod tests;
