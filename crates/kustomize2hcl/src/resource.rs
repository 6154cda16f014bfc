//! collection of rendered kubernetes resources ([Resource] and its identity [ResId])
//!
//! [ResourceCollection] tracks
//! - every resource in the order it was loaded
//! - the identity each resource had when it was loaded (its origin)
//! - the identity it has now, which changes when its namespace is rewritten
//!
//! Positions are stable once added, removal is not possible.
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Composite identity of a resource: group, version, kind, namespace and name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResId {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResId {
    /// Splits `api_version` into group and version (no `/` means the core group)
    pub fn new(api_version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        let (group, version) = api_version.rsplit_once('/').unwrap_or(("", api_version));
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Identity of the `Namespace` resource called `name`
    pub fn namespace(name: &str) -> Self {
        Self::new("v1", "Namespace", "", name)
    }
}

/// Renders like kustomize does, e.g. `apps_v1_Deployment|default|web` or `~G_v1_Namespace|~X|acme`
///
/// Naming depends on this exact format, changing it renames every generated declaration.
impl std::fmt::Display for ResId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn or<'a>(value: &'a str, missing: &'a str) -> &'a str {
            if value.is_empty() {
                missing
            } else {
                value
            }
        }

        write!(
            f,
            "{}_{}_{}|{}|{}",
            or(&self.group, "~G"),
            or(&self.version, "~V"),
            or(&self.kind, "~K"),
            or(&self.namespace, "~X"),
            or(&self.name, "~N"),
        )
    }
}

/// A single kubernetes resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// identity as loaded
    origin: ResId,
    /// identity after rewrites
    id: ResId,
    tree: Map<String, Value>,
}

impl Resource {
    pub fn from_value(value: Value) -> Result<Self, ResourceError> {
        let Value::Object(tree) = value else {
            return Err(ResourceError::NotAMapping);
        };

        let api_version = required_str(tree.get("apiVersion"), "apiVersion")?;
        let kind = required_str(tree.get("kind"), "kind")?;

        let Some(Value::Object(metadata)) = tree.get("metadata") else {
            return Err(ResourceError::MissingField("metadata"));
        };
        let name = required_str(metadata.get("name"), "metadata.name")?;
        let namespace = match metadata.get("namespace") {
            None | Some(Value::Null) => "",
            Some(Value::String(namespace)) => namespace.as_str(),
            Some(_) => return Err(ResourceError::NotAString("metadata.namespace")),
        };

        let id = ResId::new(api_version, kind, namespace, name);
        Ok(Self {
            origin: id.clone(),
            id,
            tree,
        })
    }

    pub fn origin(&self) -> &ResId {
        &self.origin
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.id.kind
    }

    pub fn original_name(&self) -> &str {
        &self.origin.name
    }

    pub fn namespace(&self) -> &str {
        &self.id.namespace
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.tree.get(key)
    }

    pub fn tree(&self) -> &Map<String, Value> {
        &self.tree
    }

    /// Copy of this resource with `metadata.namespace` (and its current identity) set to `namespace`
    pub fn with_namespace(&self, namespace: &str) -> Self {
        let mut resource = self.clone();
        if let Some(Value::Object(metadata)) = resource.tree.get_mut("metadata") {
            metadata.insert("namespace".to_string(), namespace.into());
        }
        resource.id.namespace = namespace.to_string();
        resource
    }

    /// Copy of this resource with the top level field `key` replaced
    ///
    /// Must not be used for fields that make up the identity.
    pub(crate) fn with_field(&self, key: &str, value: Value) -> Self {
        debug_assert!(!matches!(key, "apiVersion" | "kind" | "metadata"));

        let mut resource = self.clone();
        resource.tree.insert(key.to_string(), value);
        resource
    }
}

fn required_str<'v>(value: Option<&'v Value>, field: &'static str) -> Result<&'v str, ResourceError> {
    match value {
        None | Some(Value::Null) => Err(ResourceError::MissingField(field)),
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(ResourceError::NotAString(field)),
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ResourceError {
    #[error("document is not a mapping")]
    NotAMapping,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is not a string")]
    NotAString(&'static str),
}

#[derive(Default, Debug, Clone)]
pub struct ResourceCollection {
    resources: Vec<Resource>,
}

impl ResourceCollection {
    /// Appends a resource, its current identity must not be taken yet
    pub fn insert(&mut self, resource: Resource) -> Result<(), LoadError> {
        if self.get_by_id(resource.id()).is_some() {
            return Err(LoadError::DuplicateResource(resource.id().clone()));
        }

        self.resources.push(resource);
        Ok(())
    }

    /// Resource whose *current* identity is `id`
    pub fn get_by_id(&self, id: &ResId) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.id() == id)
    }

    /// All resources whose *current* identity satisfies `predicate`
    pub fn matching_current_id(&self, predicate: impl Fn(&ResId) -> bool) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|resource| predicate(resource.id()))
            .collect()
    }

    /// Swaps the resource at `index` for its rewritten value
    pub(crate) fn replace(&mut self, index: usize, resource: Resource) -> Resource {
        std::mem::replace(&mut self.resources[index], resource)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl std::ops::Index<usize> for ResourceCollection {
    type Output = Resource;

    fn index(&self, index: usize) -> &Self::Output {
        &self.resources[index]
    }
}

impl ResourceCollection {
    pub fn from_yaml(yaml: &str) -> Result<Self, LoadError> {
        let mut collection = Self::default();
        collection.insert_yaml(yaml, None)?;
        Ok(collection)
    }

    /// Inserts every document of a (multi document) yaml stream
    ///
    /// Empty documents are skipped.
    pub fn insert_yaml(&mut self, yaml: &str, path: Source) -> Result<(), LoadError> {
        for (document, deserializer) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = Value::deserialize(deserializer).map_err(|error| LoadError::Yaml {
                path: path.clone(),
                error,
            })?;

            if value.is_null() {
                continue;
            }

            let resource =
                Resource::from_value(value).map_err(|error| LoadError::InvalidResource {
                    path: path.clone(),
                    document,
                    error,
                })?;

            tracing::trace!(id = %resource.id(), "loaded resource");
            self.insert(resource)?;
        }

        Ok(())
    }

    /// Loads a file or every yaml file in a directory
    pub fn load(&mut self, path: &Path) -> Result<(), LoadError> {
        if path.is_dir() {
            self.load_directory(path)
        } else {
            self.load_file(path)
        }
    }

    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize().map_err(io_error(file_path))?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path).map_err(io_error(&file_path))?;
        self.insert_yaml(&file_contents, Some(file_path))
    }

    /// Loads `*.yaml` and `*.yml` files (not recursive) ordered by file name
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        let read_dir = std::fs::read_dir(dir_path).map_err(io_error(dir_path))?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(io_error(dir_path))?;
            if !dir_entry.file_type().map_err(io_error(dir_path))?.is_file() {
                continue;
            }

            let file_path = dir_entry.path();
            let is_yaml_file = file_path
                .extension()
                .is_some_and(|extension| extension == "yaml" || extension == "yml");
            if is_yaml_file {
                file_paths.push(file_path);
            }
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound(dir_path.to_owned()));
        }

        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |error| LoadError::Io {
        path: path.to_owned(),
        error,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No yaml files found in directory {0}")]
    NoFilesFound(PathBuf),
    #[error("IO error for {path}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("Unable to parse yaml from {}", display_source(.path))]
    Yaml {
        path: Source,
        #[source]
        error: serde_yaml::Error,
    },
    #[error("Invalid resource in document {document} of {}", display_source(.path))]
    InvalidResource {
        path: Source,
        document: usize,
        #[source]
        error: ResourceError,
    },
    #[error("Duplicate resource {0}")]
    DuplicateResource(ResId),
}

/// Utility macro to create a [ResourceCollection]
///
/// Create from a single yaml stream
/// ```
/// # use kustomize2hcl::resources;
/// let collection = resources!(r#"
/// apiVersion: v1
/// kind: Namespace
/// metadata:
///   name: acme
/// "#);
/// assert_eq!(collection.len(), 1);
/// ```
///
/// Create from multiple streams (path required)
/// ```
/// # use kustomize2hcl::resources;
/// let collection = resources! {
///   "namespace.yaml" => "{apiVersion: v1, kind: Namespace, metadata: {name: acme}}",
///   "account.yaml" => "{apiVersion: v1, kind: ServiceAccount, metadata: {name: svc, namespace: acme}}"
/// };
/// assert_eq!(collection.len(), 2);
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use kustomize2hcl::resources;
/// resources!("kind: [not, a, resource]");
/// ```
#[macro_export]
macro_rules! resources {
    // single stream without source
    { $expr:expr } => {
        $crate::resource::ResourceCollection::from_yaml($expr).expect("resources must load")
    };
    // multiple streams with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut collection = $crate::resource::ResourceCollection::default();
        $(
            collection
                .insert_yaml($expr, Some(::std::path::PathBuf::from($source)))
                .expect("resources must load");
        )+

        collection
    }};
}

pub type Source = Option<PathBuf>;

fn display_source(source: &Source) -> String {
    match source {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    }
}
