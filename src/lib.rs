//! Translation stage of the IDL front end: parsed syntax tree in, IR document out.
//!
//! ```
//! let kind = idl_ir::kind::encode("int32[10]").unwrap();
//! assert_eq!(kind.to_string(), "a10:i32");
//! ```

pub mod ast;
pub mod attributes;
pub mod config;
pub mod error;
pub mod ir;
pub mod kind;
pub mod path_de;
pub mod translate;

pub use error::{Result, TranslateError};
pub use translate::{translate, translate_json, Translator};
