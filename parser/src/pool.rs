use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    EnumDescriptor, FieldType, FileDescriptor, MessageDescriptor, ParseError, parse_proto_str,
};

/// Where a named type lives: file index, chain of message indices, and for
/// enums the index inside the last container.
#[derive(Debug, Clone)]
struct TypeLocation {
    file: usize,
    messages: Vec<usize>,
    enum_index: Option<usize>,
}

/// Registry of parsed files with every field type reference resolved.
#[derive(Debug, Default)]
pub struct DescriptorPool {
    files: Vec<FileDescriptor>,
    index: HashMap<String, TypeLocation>,
}

impl DescriptorPool {
    /// Builds the type index and resolves `FieldType::Custom` references.
    pub fn new(files: Vec<FileDescriptor>) -> Result<Self, ParseError> {
        let mut pool = DescriptorPool {
            files,
            index: HashMap::new(),
        };
        pool.build_index()?;
        pool.resolve_fields()?;
        Ok(pool)
    }

    /// Parses `files` plus everything they import, searching `include_paths`.
    ///
    /// Requested files must exist. Imports that cannot be found are skipped:
    /// option-definition protos such as `google/protobuf/descriptor.proto`
    /// are usually not on the include path.
    pub fn load<S: AsRef<str>>(files: &[S], include_paths: &[PathBuf]) -> Result<Self, ParseError> {
        let mut parsed = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<(String, bool)> = files
            .iter()
            .map(|f| (f.as_ref().to_string(), true))
            .collect();

        while let Some((name, requested)) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(path) = locate(&name, include_paths) else {
                if requested {
                    return Err(ParseError::FileNotFound(name));
                }
                tracing::warn!(import = %name, "import not found on include path, skipping");
                continue;
            };
            tracing::debug!(file = %name, path = %path.display(), "parsing proto file");
            let content = fs::read_to_string(&path)?;
            let file = parse_proto_str(&name, &content)?;
            queue.extend(file.imports.iter().map(|i| (i.clone(), false)));
            parsed.push(file);
        }

        Self::new(parsed)
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.name == name)
    }

    /// File declaring the message or enum `full_name`.
    pub fn file_of(&self, full_name: &str) -> Option<&FileDescriptor> {
        self.index.get(full_name).map(|loc| &self.files[loc.file])
    }

    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        let loc = self.index.get(full_name)?;
        if loc.enum_index.is_some() {
            return None;
        }
        self.container(loc)
    }

    pub fn enumeration(&self, full_name: &str) -> Option<&EnumDescriptor> {
        let loc = self.index.get(full_name)?;
        let idx = loc.enum_index?;
        if loc.messages.is_empty() {
            self.files[loc.file].enums.get(idx)
        } else {
            self.container(loc)?.enums.get(idx)
        }
    }

    fn container(&self, loc: &TypeLocation) -> Option<&MessageDescriptor> {
        let (first, rest) = loc.messages.split_first()?;
        let mut msg = self.files[loc.file].messages.get(*first)?;
        for i in rest {
            msg = msg.messages.get(*i)?;
        }
        Some(msg)
    }

    fn build_index(&mut self) -> Result<(), ParseError> {
        let mut index = HashMap::new();
        for (fi, file) in self.files.iter().enumerate() {
            for (ei, e) in file.enums.iter().enumerate() {
                insert(&mut index, &e.full_name, TypeLocation {
                    file: fi,
                    messages: Vec::new(),
                    enum_index: Some(ei),
                })?;
            }
            for (mi, m) in file.messages.iter().enumerate() {
                index_message(&mut index, fi, vec![mi], m)?;
            }
        }
        self.index = index;
        Ok(())
    }

    fn resolve_fields(&mut self) -> Result<(), ParseError> {
        let index = &self.index;
        for file in &mut self.files {
            for m in &mut file.messages {
                resolve_message(index, m)?;
            }
        }
        Ok(())
    }
}

fn locate(name: &str, include_paths: &[PathBuf]) -> Option<PathBuf> {
    if include_paths.is_empty() {
        let p = Path::new(name);
        return p.is_file().then(|| p.to_path_buf());
    }
    include_paths
        .iter()
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}

fn insert(
    index: &mut HashMap<String, TypeLocation>,
    name: &str,
    loc: TypeLocation,
) -> Result<(), ParseError> {
    if index.insert(name.to_string(), loc).is_some() {
        return Err(ParseError::DuplicateType(name.to_string()));
    }
    Ok(())
}

fn index_message(
    index: &mut HashMap<String, TypeLocation>,
    file: usize,
    path: Vec<usize>,
    m: &MessageDescriptor,
) -> Result<(), ParseError> {
    for (ei, e) in m.enums.iter().enumerate() {
        insert(index, &e.full_name, TypeLocation {
            file,
            messages: path.clone(),
            enum_index: Some(ei),
        })?;
    }
    for (ni, nested) in m.messages.iter().enumerate() {
        let mut child = path.clone();
        child.push(ni);
        index_message(index, file, child, nested)?;
    }
    insert(index, &m.full_name, TypeLocation {
        file,
        messages: path,
        enum_index: None,
    })
}

fn resolve_message(
    index: &HashMap<String, TypeLocation>,
    m: &mut MessageDescriptor,
) -> Result<(), ParseError> {
    for field in &mut m.fields {
        if let FieldType::Custom(name) = &field.ty {
            let full = lookup(index, &m.full_name, name).ok_or_else(|| {
                ParseError::UnresolvedType {
                    name: name.clone(),
                    scope: m.full_name.clone(),
                }
            })?;
            field.ty = if index[&full].enum_index.is_some() {
                FieldType::Enum(full)
            } else {
                FieldType::Message(full)
            };
        }
    }
    for nested in &mut m.messages {
        resolve_message(index, nested)?;
    }
    Ok(())
}

/// Protobuf scoping: try `scope.name`, then drop one scope component at a
/// time. A leading dot makes the name absolute.
fn lookup(index: &HashMap<String, TypeLocation>, scope: &str, name: &str) -> Option<String> {
    if let Some(abs) = name.strip_prefix('.') {
        return index.contains_key(abs).then(|| abs.to_string());
    }
    let mut scope = scope.to_string();
    loop {
        let candidate = if scope.is_empty() {
            name.to_string()
        } else {
            format!("{scope}.{name}")
        };
        if index.contains_key(&candidate) {
            return Some(candidate);
        }
        if scope.is_empty() {
            return None;
        }
        match scope.rfind('.') {
            Some(i) => scope.truncate(i),
            None => scope.clear(),
        }
    }
}
