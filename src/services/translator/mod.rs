// Source-dialect translation layer
//
// Rewrites portable command trees into backend-native SQL: function
// modifiers substitute per-dialect syntax, the renderer emits text, and the
// translation service coordinates per-system translators.

pub mod convert;
pub mod dialect;
pub mod modifiers;
pub mod renderer;
pub mod service;

pub use convert::ConvertModifier;
pub use dialect::{
    DialectTranslator, GenericTranslator, SqlServerTranslator, SybaseTranslator, TranslatedCommand,
};
pub use modifiers::{
    AliasModifier, DropFunctionModifier, FunctionModifier, ModFunctionModifier, Part, Rewritten,
};
pub use renderer::{CallStyle, RenderOptions, SqlRenderer};
pub use service::{SourceSystem, TranslationService};
