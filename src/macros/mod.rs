//! Template macro language
//!
//! Document text may contain `%NAME%` and `%NAME(ARG)%` tokens. The engine
//! finds them, the substitutors rewrite them, and the includer drives the
//! engine until every `%INCLUDE(path)%` is expanded.

pub mod engine;
pub mod includer;
pub mod lookup;
pub mod substitutor;
pub mod token;

pub use engine::{MacroSubstitutionEngine, PassReport};
pub use includer::{DEFAULT_INCLUDE_DEPTH_LIMIT, DocumentIncluder};
pub use lookup::{LookupTable, format_date};
pub use substitutor::{Substitution, Substitutor, Verdict};
pub use token::{INCLUDE_PATTERN, MACRO_PATTERN, MAIN_TEXT_PATTERN, Macro};
