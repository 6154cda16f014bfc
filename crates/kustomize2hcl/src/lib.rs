//! # kustomize2hcl - kubernetes resources as terraform declarations
//!
//! Turns the output of `kustomize build` into terraform files for the `kubernetes-alpha` provider.
//! Each resource becomes one `kubernetes_manifest` declaration in its own file.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `kustomize2hcl` works internally.
//!
//! ### Loading resources
//!
//! see [resource::ResourceCollection]
//!
//! Input is rendered yaml, one resource per document. Each resource keeps two identities
//! ([resource::ResId]): the one it was loaded with (*origin*) and the one it has now (*current*).
//! They only differ once the namespace of a resource was rewritten.
//!
//! ### Naming
//!
//! see [naming::identifier]
//!
//! Declarations are named `<kind>_<name>_<fingerprint>`, the fingerprint being the first 7 hex
//! characters of the sha512 of the origin identity. The same resource gets the same name on every run.
//!
//! ### Rewriting
//!
//! see [rewrite::rewrite]
//!
//! Some values can't stay literals:
//!
//! | **value**                                 | **becomes**                                                  |
//! |-------------------------------------------|--------------------------------------------------------------|
//! | `metadata.namespace` of a declared namespace | `kubernetes_manifest.Namespace_acme_bf2a56b.manifest.metadata.name` |
//! | multi-line values in `data` ending in `\n` | a heredoc, `${` and `%{` escaped                             |
//!
//! Rewriting replaces them with a token wrapped in `###` ([placeholder::Token]) and records a
//! [placeholder::Placeholder] for it. The rewritten resource replaces the original in the collection
//! and must still have a unique current identity.
//!
//! Rewriting returns a [rewrite::Renderable], the only thing the renderer accepts.
//!
//! ### Rendering
//!
//! see [render::render]
//!
//! The resource tree is normalized through json and converted to an [hcl::Expression]. We walk the
//! expression tree and swap every string that is a known wrapped token for the placeholder's
//! expression. The result is wrapped in a `resource` block and formatted with [hcl::format].
//!
//! ### Output
//!
//! see [writer::HclWriter]
//!
//! One file per declaration plus `_main.tf` and `_variables.tf`, written into an empty directory.
//!
pub mod config;
pub mod naming;
pub mod placeholder;
pub mod render;
pub mod resource;
pub mod rewrite;
mod util;
mod visit;
pub mod writer;
