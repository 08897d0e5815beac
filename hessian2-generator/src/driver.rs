//! Per-file generation over a descriptor pool.
//!
//! Each requested file gets its own [`GeneratedFile`] and transformation.
//! A file that fails is dropped from the output and reported; the remaining
//! files are still generated.

use parser::DescriptorPool;
use tracing::{error, info};

use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::ident::{GeneratedFile, GoPackages};
use crate::ir::Hessian2File;
use crate::transform::Transformer;

/// IR of one successfully transformed file plus its output bookkeeping.
#[derive(Debug)]
pub struct GeneratedOutput<'a> {
    pub file: GeneratedFile,
    pub ir: Hessian2File<'a>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub file: String,
    pub error: GenerateError,
}

#[derive(Debug, Default)]
pub struct GenerationReport<'a> {
    pub generated: Vec<GeneratedOutput<'a>>,
    pub failed: Vec<FileFailure>,
}

impl GenerationReport<'_> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parses `files` (and their imports) from the configured include paths.
pub fn load_pool<S: AsRef<str>>(
    config: &GeneratorConfig,
    files: &[S],
) -> Result<DescriptorPool, GenerateError> {
    Ok(DescriptorPool::load(files, &config.include_paths)?)
}

pub fn generate<'a, S: AsRef<str>>(
    pool: &'a DescriptorPool,
    files_to_generate: &[S],
    config: &GeneratorConfig,
) -> GenerationReport<'a> {
    let packages = GoPackages::new(pool, config);
    let mut report = GenerationReport::default();

    for name in files_to_generate.iter().map(AsRef::as_ref) {
        match generate_one(pool, &packages, config, name) {
            Ok(output) => {
                info!(file = %name, output = %output.file.filename(), "generated");
                report.generated.push(output);
            }
            Err(err) => {
                error!(file = %name, error = %err, "generation failed, skipping file");
                report.failed.push(FileFailure {
                    file: name.to_string(),
                    error: err,
                });
            }
        }
    }
    report
}

fn generate_one<'a>(
    pool: &'a DescriptorPool,
    packages: &GoPackages<'a>,
    config: &GeneratorConfig,
    name: &str,
) -> Result<GeneratedOutput<'a>, GenerateError> {
    let file = pool
        .file(name)
        .ok_or_else(|| GenerateError::UnknownFile(name.to_string()))?;
    let import_path = packages
        .for_file(name)
        .cloned()
        .unwrap_or_default();
    let filename = config.output_filename(file, &import_path)?;
    let out = GeneratedFile::new(filename, import_path);

    let ir = Transformer::new(pool, packages, &out).process_file(file)?;
    Ok(GeneratedOutput { file: out, ir })
}
