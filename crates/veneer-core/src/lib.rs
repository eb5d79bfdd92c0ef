//! # Veneer Core - The Engine
//!
//! Method interception for Rust values: cross-cutting behavior (logging,
//! caching, authorization, retries) is declared per method and run, in
//! declared order, around the original method body.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use veneer_core::{args, Decoratable, Decorated, DecoratorRef, MethodDef, MethodTable};
//! use serde_json::{json, Value};
//!
//! struct Invoice { cents: i64 }
//!
//! impl Decoratable for Invoice {
//!     type Output = Value;
//!
//!     fn methods() -> MethodTable<Self> {
//!         MethodTable::new().method(
//!             MethodDef::restricted("total", |invoice: &Invoice, _| Ok(json!(invoice.cents)))
//!                 .decorated_with(DecoratorRef::named("trace")),
//!         )
//!     }
//!
//!     // Name used in manifests and error messages.
//!     fn type_name() -> &'static str {
//!         "Invoice"
//!     }
//! }
//!
//! let invoice = Decorated::new(Invoice { cents: 1250 }).with_registry(registry);
//! let total = invoice.invoke("total", args![])?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller ──invoke(name, args)──► Decorated<T>
//!                                   │ lookup in MethodTable<T>
//!                                   │ resolve DecoratorRef list (DeclarationSource + DecoratorRegistry)
//!                                   ▼
//!                     D1 ─next─► D2 ─next─► ... ─next─► method body
//! ```

pub mod arguments;
pub mod config;
pub mod declaration;
pub mod decorator;
pub mod dispatch;
pub mod error;
pub mod method;
pub mod registry;

pub use arguments::Arguments;
pub use config::{CachePolicy, DispatchConfig};
pub use declaration::{DeclarationSource, Manifest};
pub use decorator::{Decorator, DecoratorRef, FnDecorator, Next, decorator_fn};
pub use dispatch::Decorated;
pub use error::{BoxError, Error, Result};
pub use method::{Ancestor, Decoratable, Fallback, MethodBody, MethodDef, MethodTable, Visibility};
pub use registry::{DecoratorFactory, DecoratorRegistry};

// Re-exported for the `args!` macro and for method bodies.
pub use serde_json::{Value, json};
