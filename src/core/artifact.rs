//! On-disk model artifacts.
//!
//! A model directory holds two JSON files written together:
//!
//! - `feature_space.json`: weighting parameters, `n_documents` and the
//!   vocabulary with integer document frequencies
//! - `model.json`: classifier weights plus the identity of the feature space
//!   they were trained against
//!
//! Loading recomputes the feature-space identity from its parts and refuses
//! to pair it with weights trained on anything else.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::core::classifier::ClassifierModel;
use crate::core::error::{Result, SiftError};
use crate::core::features::{FeatureSpace, VectorizerParams};
use crate::core::model::RelevanceModel;

pub const SCHEMA_VERSION: u32 = 1;
pub const FEATURE_SPACE_FILE: &str = "feature_space.json";
pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Serialize, Deserialize)]
struct FeatureSpaceFile
{
    schema_version: u32,
    identity: String,
    params: VectorizerParams,
    n_documents: usize,
    vocabulary: IndexMap<String, usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile
{
    schema_version: u32,
    trained_at: DateTime<Utc>,
    model: ClassifierModel,
}

/// Metadata read back alongside a model
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactInfo
{
    pub dir: PathBuf,
    pub trained_at: DateTime<Utc>,
    pub feature_space_id: String,
    pub vocabulary_size: usize,
}

/// Write both artifact files into `dir`, creating it if needed.
pub fn save(
    dir: &Path,
    model: &RelevanceModel,
) -> Result<()>
{
    fs::create_dir_all(dir).map_err(|source| SiftError::Io { path: dir.to_path_buf(), source })?;

    let space = model.feature_space();
    let fs_file = FeatureSpaceFile {
        schema_version: SCHEMA_VERSION,
        identity: space
            .identity()
            .to_string(),
        params: space
            .params()
            .clone(),
        n_documents: space.n_documents(),
        vocabulary: space
            .vocabulary()
            .clone(),
    };
    let model_file = ModelFile {
        schema_version: SCHEMA_VERSION,
        trained_at: Utc::now(),
        model: model
            .classifier()
            .clone(),
    };

    write_json_atomic(&dir.join(FEATURE_SPACE_FILE), &fs_file)?;
    write_json_atomic(&dir.join(MODEL_FILE), &model_file)?;

    info!(
        dir = %dir.display(),
        feature_space = space.identity(),
        vocabulary = space.dim(),
        "model artifacts written"
    );
    Ok(())
}

/// Load the frozen feature space alone.
pub fn load_feature_space(dir: &Path) -> Result<FeatureSpace>
{
    let path = dir.join(FEATURE_SPACE_FILE);
    let file: FeatureSpaceFile = read_json(&path)?;
    check_schema(&path, file.schema_version)?;

    let space = FeatureSpace::from_parts(file.params, file.n_documents, file.vocabulary);
    if space.identity() != file.identity
    {
        return Err(SiftError::mismatch(
            &file.identity,
            space.identity(),
            format!("{} content does not match its recorded identity", path.display()),
        ));
    }

    debug!(path = %path.display(), identity = space.identity(), "feature space loaded");
    Ok(space)
}

/// Load the paired feature space and classifier from `dir`.
pub fn load(dir: &Path) -> Result<(RelevanceModel, ArtifactInfo)>
{
    let space = load_feature_space(dir)?;

    let path = dir.join(MODEL_FILE);
    let file: ModelFile = read_json(&path)?;
    check_schema(&path, file.schema_version)?;

    let info = ArtifactInfo {
        dir: dir.to_path_buf(),
        trained_at: file.trained_at,
        feature_space_id: space
            .identity()
            .to_string(),
        vocabulary_size: space.dim(),
    };
    let model = RelevanceModel::new(space, file.model)?;

    debug!(dir = %dir.display(), trained_at = %info.trained_at, "model loaded");
    Ok((model, info))
}

fn check_schema(
    path: &Path,
    found: u32,
) -> Result<()>
{
    if found == SCHEMA_VERSION
    {
        return Ok(());
    }
    Err(SiftError::mismatch(
        format!("schema_version {SCHEMA_VERSION}"),
        format!("schema_version {found}"),
        format!("unsupported artifact format in {}", path.display()),
    ))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T>
{
    let file = fs::File::open(path).map_err(|source| SiftError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| SiftError::Json { path: path.to_path_buf(), source })
}

/// Serialize into a temp file beside `path`, then rename over it.
fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
) -> Result<()>
{
    let io_err = |source| SiftError::Io { path: path.to_path_buf(), source };
    let dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."));

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut w, value)
            .map_err(|source| SiftError::Json { path: path.to_path_buf(), source })?;
        w.write_all(b"\n")
            .map_err(io_err)?;
        w.flush()
            .map_err(io_err)?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(io_err)?;

    tmp.persist(path)
        .map_err(|e| io_err(e.error))?;
    Ok(())
}
