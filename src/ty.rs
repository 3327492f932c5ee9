//! Types and the table that resolves source annotations into them.

use std::collections::HashMap;
use std::fmt;

use crate::parser::TypeExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
  Int,
  Bool,
  Arrow,
  /// Placeholder for stack slots that hold a value with no name.
  Never,
}

impl TypeKind {
  pub fn name(self) -> &'static str {
    match self {
      Self::Int => "int",
      Self::Bool => "bool",
      Self::Arrow => "arrow",
      Self::Never => "never",
    }
  }
}

/// A type together with the number of bytes a value of it occupies on the
/// stack. Two types are equal only when both kind and size agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
  pub kind: TypeKind,
  size: usize,
}

impl Type {
  pub const INT: Type = Type {
    kind: TypeKind::Int,
    size: 8,
  };

  pub const BOOL: Type = Type {
    kind: TypeKind::Bool,
    size: 8,
  };

  /// The address of a function.
  pub const ARROW: Type = Type {
    kind: TypeKind::Arrow,
    size: 8,
  };

  pub fn never(size: usize) -> Self {
    Self {
      kind: TypeKind::Never,
      size,
    }
  }

  pub fn is_integer(&self) -> bool {
    matches!(self.kind, TypeKind::Int)
  }

  pub fn size(&self) -> usize {
    self.size
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.kind.name())
  }
}

/// Catalogue of the named types a program may mention.
#[derive(Debug, Clone)]
pub struct TypeTable {
  named: HashMap<String, Type>,
}

impl TypeTable {
  pub fn new() -> Self {
    let named = [("int", Type::INT), ("bool", Type::BOOL)]
      .into_iter()
      .map(|(name, ty)| (name.to_string(), ty))
      .collect();
    Self { named }
  }

  /// Resolve an annotation. Arrow types resolve to [`Type::ARROW`] whatever
  /// their arity, but only once every parameter and the return type do.
  pub fn lookup(&self, ty: &TypeExpr) -> Option<Type> {
    match ty {
      TypeExpr::Named { name } => self.named.get(name).copied(),
      TypeExpr::Arrow { params, returns } => {
        for param in params {
          self.lookup(param)?;
        }
        self.lookup(returns)?;
        Some(Type::ARROW)
      }
    }
  }
}

impl Default for TypeTable {
  fn default() -> Self {
    Self::new()
  }
}
