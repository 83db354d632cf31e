//! argtree: a command-line argument parsing engine.
//!
//! Declare a tree of [`Command`](domain::Command)s with typed
//! [`Argument`](domain::Argument)s, optionally grouped into exclusive
//! [`ArgumentGroup`](domain::ArgumentGroup)s, then parse token lists against
//! it. Every parse returns a [`ParseOutcome`](domain::ParseOutcome) holding the
//! typed values and all severity-tagged errors found in one pass.
//!
//! ```
//! use argtree::domain::{Argument, Command, CommandTree, ErrorReporter, IntType};
//!
//! let mut tree = CommandTree::new(Command::new("cmd1").unwrap());
//! let root = tree.root();
//! let number = tree
//!     .define_argument(root, Argument::new(IntType::default(), ["number"]).unwrap())
//!     .unwrap();
//! let flag = tree.define_argument(root, Argument::flag(["f", "name1"]).unwrap()).unwrap();
//!
//! let outcome = tree.parse(["--number", "5", "-f"]);
//! assert_eq!(outcome.get(&number), Some(&5));
//! assert_eq!(outcome.get(&flag), Some(&true));
//! assert!(outcome.errors().is_empty());
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod tree_traits;
pub mod util;
