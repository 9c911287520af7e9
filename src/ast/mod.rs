//! Query AST: comprehensions, scalar expressions and bound-variable symbols.

pub mod comprehension;
pub mod node;
pub mod ordering;
pub mod symbol;
pub mod values;

pub use comprehension::{Comprehension, DefNode};
pub use node::{Function, Literal, Node};
pub use ordering::{Direction, NullOrdering, Ordering};
pub use symbol::{Symbol, SymbolTable};
pub use values::{ScalarKind, Value};
