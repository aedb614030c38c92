//! Rulebook Policy
//!
//! Compiles an organization's rulebook (step templates and assertion
//! templates) into the immutable [`Policy`] every compliance check reads.
//!
//! # Overview
//!
//! - **Placeholder grammar**: fixed token → regex fragment table
//! - **Template compiler**: normalizes rulebook lines and renders anchored patterns
//! - **Policy**: keyword set, compiled rulebooks, status matrix, checklist targets
//!
//! # Example
//!
//! ```rust
//! use rulebook_policy::{Policy, PolicySettings, RulebookSource};
//!
//! let policy = Policy::compile(
//!     &RulebookSource::present("Given endpoint <url>\nmethod <method>"),
//!     &RulebookSource::present("status <expected_status_code>"),
//!     PolicySettings::default(),
//! );
//!
//! assert!(policy.steps().matches("When method GET"));
//! assert!(policy.assertions().matches("Then status 200"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod keyword;
pub mod kind;
pub mod placeholder;
pub mod policy;
pub mod settings;
pub mod template;

// Re-exports
pub use error::{PolicyError, PolicyResult};
pub use keyword::{Keyword, UnknownKeyword};
pub use kind::{ScenarioKind, UnknownScenarioKind};
pub use placeholder::{PlaceholderRule, PLACEHOLDER_RULES};
pub use policy::{Policy, PolicyFingerprint, RulebookSource};
pub use settings::{ChecklistTargets, PolicySettings, SettingsFormat, StatusMatrix};
pub use template::{
    compile_template, compile_templates, normalize_line, CompiledPattern, CompiledTemplates, TemplateKind,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for policy construction
    pub use crate::{
        CompiledPattern, Keyword, Policy, PolicySettings, RulebookSource, ScenarioKind,
        TemplateKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
