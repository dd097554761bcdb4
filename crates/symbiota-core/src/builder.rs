//! # Instance Builder
//!
//! Merges per-organism fact sets into one `FactModel`.
//!
//! - Host facts are tagged with `draft`; without a host no `draft` is emitted
//! - Every symbiont is read independently on a bounded worker pool
//! - A symbiont that cannot be read is skipped and reported, never fatal
//! - Host, seed and target read failures abort the build
//! - Merging is single-threaded and follows sorted organism order

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::formats::{append_facts, read_instance};
use crate::model::FactModel;
use crate::primitives::HOST_ORGANISM;
use crate::types::{CompoundRole, Fact, NetworkReader, SymbiotaError};

// =============================================================================
// REQUEST / OUTCOME
// =============================================================================

/// Inputs for building a model from network files.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Host network, if any.
    pub host: Option<PathBuf>,
    /// Directory whose regular files are symbiont networks.
    pub symbionts: PathBuf,
    /// Seed compound list.
    pub seeds: Option<PathBuf>,
    /// Target compound list.
    pub targets: Option<PathBuf>,
}

/// Every way a query can obtain its instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceInputs {
    /// Pre-built instance file. Takes precedence over network files.
    pub instance: Option<PathBuf>,
    pub host: Option<PathBuf>,
    pub symbionts: Option<PathBuf>,
    pub seeds: Option<PathBuf>,
    pub targets: Option<PathBuf>,
}

/// A symbiont that was left out of the model.
#[derive(Debug)]
pub struct SkippedOrganism {
    pub organism: String,
    pub path: PathBuf,
    pub error: SymbiotaError,
}

/// Result of a build: the merged model plus the per-organism report.
#[derive(Debug)]
pub struct BuildOutcome {
    pub model: FactModel,
    /// Symbionts merged into the model, in sorted order.
    pub loaded: Vec<String>,
    /// Symbionts that failed to read.
    pub skipped: Vec<SkippedOrganism>,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds fact models from network sources through a [`NetworkReader`].
pub struct InstanceBuilder<R: NetworkReader> {
    reader: R,
    concurrency: usize,
}

impl<R: NetworkReader> InstanceBuilder<R> {
    /// Create a builder. Concurrency defaults to the available parallelism.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            concurrency: default_concurrency(),
        }
    }

    /// Bound the worker pool. Zero selects the default.
    #[must_use]
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = if workers == 0 {
            default_concurrency()
        } else {
            workers
        };
        self
    }

    /// Worker pool size in use.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// List symbiont files as `(organism, path)`, sorted by organism name.
    ///
    /// # Errors
    /// - `NotFound` if the directory does not exist
    /// - `MissingInput` if it contains no regular file
    /// - `InvalidOption` if two files share a stem or a stem is the host name
    pub fn symbiont_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, SymbiotaError> {
        if !dir.is_dir() {
            return Err(SymbiotaError::not_found(dir, "Symbiont directory"));
        }

        let entries = fs::read_dir(dir).map_err(|e| SymbiotaError::io(dir, &e))?;
        let mut files: BTreeMap<String, PathBuf> = BTreeMap::new();

        for entry in entries {
            let entry = entry.map_err(|e| SymbiotaError::io(dir, &e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let organism = stem.to_string();
            if organism == HOST_ORGANISM {
                return Err(SymbiotaError::InvalidOption(format!(
                    "symbiont file {} uses the reserved host name '{HOST_ORGANISM}'",
                    path.display()
                )));
            }
            if let Some(previous) = files.insert(organism.clone(), path.clone()) {
                return Err(SymbiotaError::InvalidOption(format!(
                    "organism name '{organism}' is shared by {} and {}",
                    previous.display(),
                    path.display()
                )));
            }
        }

        if files.is_empty() {
            return Err(SymbiotaError::MissingInput(format!(
                "no symbiont networks in {}",
                dir.display()
            )));
        }

        Ok(files.into_iter().collect())
    }

    /// Build a model from network files.
    pub fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, SymbiotaError> {
        let files = Self::symbiont_files(&request.symbionts)?;
        let mut model = FactModel::new();

        if let Some(host) = &request.host {
            model.merge(self.reader.read_network(host, HOST_ORGANISM)?);
            model.insert(Fact::draft(HOST_ORGANISM));
        }

        let (seeds, targets) = self.read_compounds(request.seeds.as_deref(), request.targets.as_deref())?;
        model.augment(&seeds, &targets);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .build()
            .map_err(|e| SymbiotaError::Io(format!("worker pool: {e}")))?;

        let reader = &self.reader;
        let results: Vec<_> = pool.install(|| {
            files
                .par_iter()
                .map(|(organism, path)| reader.read_network(path, organism))
                .collect()
        });

        let mut loaded = Vec::new();
        let mut skipped = Vec::new();
        for ((organism, path), result) in files.into_iter().zip(results) {
            match result {
                Ok(facts) => {
                    model.merge(facts);
                    model.insert(Fact::bacteria(&organism));
                    loaded.push(organism);
                }
                Err(error) => skipped.push(SkippedOrganism {
                    organism,
                    path,
                    error,
                }),
            }
        }

        Ok(BuildOutcome {
            model,
            loaded,
            skipped,
        })
    }

    /// Obtain a model from either a pre-built instance or network files.
    ///
    /// A pre-built instance is augmented in place with any seeds and targets
    /// given. Network files require a symbiont directory, and seeds when
    /// `seeds_required` is set.
    pub fn resolve(
        &self,
        inputs: &InstanceInputs,
        seeds_required: bool,
    ) -> Result<BuildOutcome, SymbiotaError> {
        if let Some(path) = &inputs.instance {
            let mut instance = Instance::open(path)?;
            let (seeds, targets) = self.read_compounds(inputs.seeds.as_deref(), inputs.targets.as_deref())?;
            instance.augment(&seeds, &targets)?;
            let model = instance.into_model();
            let loaded = model.bacteria().into_iter().collect();
            return Ok(BuildOutcome {
                model,
                loaded,
                skipped: Vec::new(),
            });
        }

        let Some(symbionts) = &inputs.symbionts else {
            return Err(SymbiotaError::MissingInput(
                "either an instance or symbiont networks are required".to_string(),
            ));
        };
        if seeds_required && inputs.seeds.is_none() {
            return Err(SymbiotaError::MissingInput(
                "seeds are required with symbiont networks".to_string(),
            ));
        }

        self.build(&BuildRequest {
            host: inputs.host.clone(),
            symbionts: symbionts.clone(),
            seeds: inputs.seeds.clone(),
            targets: inputs.targets.clone(),
        })
    }

    fn read_compounds(
        &self,
        seeds: Option<&Path>,
        targets: Option<&Path>,
    ) -> Result<(Vec<Fact>, Vec<Fact>), SymbiotaError> {
        let seeds = match seeds {
            Some(p) => self.reader.read_compounds(p, CompoundRole::Seed)?,
            None => Vec::new(),
        };
        let targets = match targets {
            Some(p) => self.reader.read_compounds(p, CompoundRole::Target)?,
            None => Vec::new(),
        };
        Ok((seeds, targets))
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

// =============================================================================
// PERSISTED INSTANCE
// =============================================================================

/// A fact model backed by an instance file.
#[derive(Debug)]
pub struct Instance {
    path: PathBuf,
    model: FactModel,
}

impl Instance {
    /// Load and validate an instance file.
    pub fn open(path: &Path) -> Result<Self, SymbiotaError> {
        let model = read_instance(path)?;
        model.validate(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            model,
        })
    }

    /// Persist a model to `path` and keep it as an instance.
    pub fn create(path: &Path, model: FactModel) -> Result<Self, SymbiotaError> {
        crate::formats::write_instance(path, &model)?;
        Ok(Self {
            path: path.to_path_buf(),
            model,
        })
    }

    /// Append seed and target facts to the file and the model.
    pub fn augment(&mut self, seeds: &[Fact], targets: &[Fact]) -> Result<(), SymbiotaError> {
        if seeds.is_empty() && targets.is_empty() {
            return Ok(());
        }
        append_facts(&self.path, seeds.iter().chain(targets))?;
        self.model.augment(seeds, targets);
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn model(&self) -> &FactModel {
        &self.model
    }

    /// Release the model for grounding.
    #[must_use]
    pub fn into_model(self) -> FactModel {
        self.model
    }
}

// =============================================================================
// TESTS
// =============================================================================
