//! Go identifiers, import paths and qualification.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;
use parser::{DescriptorPool, FileDescriptor};
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::naming::{go_camel_case, go_sanitized};

/// A Go import path together with the package name used to reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct GoImportPath {
    path: String,
    package_name: String,
}

impl GoImportPath {
    /// Parses `"github.com/x/y;y"` style values. Without `;name` the package
    /// name is the sanitized last path segment.
    pub fn parse(value: &str) -> Self {
        let (path, name) = match value.split_once(';') {
            Some((path, name)) => (path, Some(name)),
            None => (value, None),
        };
        let package_name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => path
                .rsplit('/')
                .find(|seg| !seg.is_empty())
                .map(go_sanitized)
                .unwrap_or_default(),
        };
        GoImportPath {
            path: path.to_string(),
            package_name,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoIdent {
    pub go_name: String,
    pub import_path: GoImportPath,
}

/// Go import paths of every file in a pool, plus identifier derivation for
/// the types they declare.
#[derive(Debug)]
pub struct GoPackages<'a> {
    pool: &'a DescriptorPool,
    by_file: HashMap<&'a str, GoImportPath>,
}

impl<'a> GoPackages<'a> {
    /// Import path precedence: `M` mapping, then `go_package`, then the
    /// directory holding the proto file.
    pub fn new(pool: &'a DescriptorPool, config: &GeneratorConfig) -> Self {
        let by_file = pool
            .files()
            .iter()
            .map(|file| (file.name.as_str(), import_path_for(file, config)))
            .collect();
        GoPackages { pool, by_file }
    }

    pub fn for_file(&self, name: &str) -> Option<&GoImportPath> {
        self.by_file.get(name)
    }

    /// Identifier of a message or enum, e.g. `Order_Address`.
    pub fn ident(&self, full_name: &str) -> GoIdent {
        let (file, relative) = self.split(full_name);
        GoIdent {
            go_name: go_camel_case(relative),
            import_path: self.import_path(file),
        }
    }

    /// Identifier of an enum value: `Enum_VALUE` for top-level enums,
    /// `Message_VALUE` for enums nested in a message.
    pub fn enum_value_ident(&self, enum_full_name: &str, value: &str) -> GoIdent {
        let (file, relative) = self.split(enum_full_name);
        let parent = relative.rsplit_once('.').map_or(relative, |(p, _)| p);
        GoIdent {
            go_name: format!("{}_{}", go_camel_case(parent), value),
            import_path: self.import_path(file),
        }
    }

    fn split<'n>(&self, full_name: &'n str) -> (Option<&'a FileDescriptor>, &'n str) {
        let file = self.pool.file_of(full_name);
        let relative = file
            .and_then(|f| f.package.as_deref())
            .and_then(|pkg| full_name.strip_prefix(pkg))
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(full_name);
        (file, relative)
    }

    fn import_path(&self, file: Option<&FileDescriptor>) -> GoImportPath {
        file.and_then(|f| self.by_file.get(f.name.as_str()))
            .cloned()
            .unwrap_or_default()
    }
}

fn import_path_for(file: &FileDescriptor, config: &GeneratorConfig) -> GoImportPath {
    if let Some(mapping) = config
        .import_mappings
        .get(&file.name)
        .or(file.go_package.as_ref())
    {
        return GoImportPath::parse(mapping);
    }
    let dir = file.name.rsplit_once('/').map_or("", |(d, _)| d);
    let mut path = GoImportPath::parse(dir);
    if path.package_name.is_empty() {
        path.package_name = file
            .package
            .as_deref()
            .and_then(|p| p.rsplit('.').next())
            .map(go_sanitized)
            .unwrap_or_else(|| "main".to_string());
    }
    path
}

/// The output file being generated. Qualifies identifiers relative to its
/// own package and remembers which imports the emitted code needs.
#[derive(Debug)]
pub struct GeneratedFile {
    filename: String,
    import_path: GoImportPath,
    // import path -> package name, in first-use order
    imports: RefCell<IndexMap<String, String>>,
}

impl GeneratedFile {
    pub fn new(filename: impl Into<String>, import_path: GoImportPath) -> Self {
        GeneratedFile {
            filename: filename.into(),
            import_path,
            imports: RefCell::new(IndexMap::new()),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn import_path(&self) -> &GoImportPath {
        &self.import_path
    }

    /// Returns the expression the generated code uses to refer to `ident`.
    /// Identifiers in the file's own package (or with no known package) are
    /// used bare; others are prefixed with their package name, which is
    /// suffixed with a counter when two import paths share a name.
    pub fn qualified_go_ident(&self, ident: &GoIdent) -> String {
        let path = ident.import_path.path();
        if path.is_empty() || path == self.import_path.path() {
            return ident.go_name.clone();
        }

        let mut imports = self.imports.borrow_mut();
        if let Some(name) = imports.get(path) {
            return format!("{name}.{}", ident.go_name);
        }
        let base = ident.import_path.package_name();
        let mut name = base.to_string();
        let mut n = 1;
        while name == self.import_path.package_name() || imports.values().any(|v| *v == name) {
            name = format!("{base}{n}");
            n += 1;
        }
        let qualified = format!("{name}.{}", ident.go_name);
        imports.insert(path.to_string(), name);
        qualified
    }

    /// Imports recorded so far as `(path, package name)` pairs.
    pub fn imports(&self) -> Vec<(String, String)> {
        self.imports
            .borrow()
            .iter()
            .map(|(p, n)| (p.clone(), n.clone()))
            .collect()
    }
}
