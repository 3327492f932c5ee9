//! Lexical environments: which names live where on the runtime stack.
//!
//! An [`Environment`] is an immutable snapshot. Every extension returns a new
//! value and leaves the receiver untouched, so a parent scope stays valid
//! after a child has been derived from it.
//!
//! The most recently pushed binding sits on top of the stack at offset 0; the
//! offset of any other binding is the total size of everything pushed after
//! it.

use std::sync::Arc;

use crate::error::{CompileResult, UnboundVariableSnafu, UnknownTypeSnafu};
use crate::parser::TypeExpr;
use crate::ty::{Type, TypeTable};

/// One value on the evaluation stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
  Named { name: String, ty: Type },
  /// A pushed temporary that no identifier can refer to.
  Anonymous { ty: Type },
}

impl Binding {
  pub fn ty(&self) -> Type {
    match self {
      Self::Named { ty, .. } | Self::Anonymous { ty } => *ty,
    }
  }

  fn name(&self) -> Option<&str> {
    match self {
      Self::Named { name, .. } => Some(name),
      Self::Anonymous { .. } => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Environment {
  bindings: Vec<Binding>,
  types: Arc<TypeTable>,
}

impl Environment {
  pub fn new(types: Arc<TypeTable>) -> Self {
    Self {
      bindings: Vec::new(),
      types,
    }
  }

  /// A fresh scope with no bindings that shares this environment's types.
  pub fn scope(&self) -> Self {
    Self::new(Arc::clone(&self.types))
  }

  pub fn bindings(&self) -> &[Binding] {
    &self.bindings
  }

  /// Bytes occupied on the stack by every binding in this environment.
  pub fn frame_size(&self) -> usize {
    self.bindings.iter().map(|b| b.ty().size()).sum()
  }

  pub fn lookup_type(&self, ty: &TypeExpr) -> Option<Type> {
    self.types.lookup(ty)
  }

  /// Bind `name` to a value of the annotated type.
  pub fn add_binding(&self, name: &str, declared: &TypeExpr) -> CompileResult<Self> {
    let ty = self.lookup_type(declared).ok_or_else(|| {
      UnknownTypeSnafu {
        name: declared.to_string(),
      }
      .build()
    })?;
    Ok(self.bind(name, ty))
  }

  /// Bind `name` to an already resolved type.
  pub fn bind(&self, name: &str, ty: Type) -> Self {
    self.extend(Binding::Named {
      name: name.to_string(),
      ty,
    })
  }

  /// Account for `size` bytes pushed without a name.
  pub fn add_never(&self, size: usize) -> Self {
    self.extend(Binding::Anonymous {
      ty: Type::never(size),
    })
  }

  /// Byte offset from the top of the stack and type of the newest binding
  /// called `name`.
  pub fn lexical_address(&self, name: &str) -> CompileResult<(usize, Type)> {
    let mut offset = 0;
    for binding in self.bindings.iter().rev() {
      if binding.name() == Some(name) {
        return Ok((offset, binding.ty()));
      }
      offset += binding.ty().size();
    }
    UnboundVariableSnafu { name }.fail()
  }

  fn extend(&self, binding: Binding) -> Self {
    let mut bindings = Vec::with_capacity(self.bindings.len() + 1);
    bindings.extend_from_slice(&self.bindings);
    bindings.push(binding);
    Self {
      bindings,
      types: Arc::clone(&self.types),
    }
  }
}

impl Default for Environment {
  fn default() -> Self {
    Self::new(Arc::new(TypeTable::new()))
  }
}
