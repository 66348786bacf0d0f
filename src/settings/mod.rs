use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lvlimport")]
#[command(version)]
#[command(about = "Imports SWBF2 level models into a renderable scene representation")]
pub struct CliArgs {
    /// Where relative level paths are looked up.
    #[arg(long, env = "LVLIMPORT_DATA_DIR", default_value_t = default_data_dir())]
    pub data_dir: String,

    #[command(subcommand)]
    pub operation_mode: OperationMode,
}

pub fn default_data_dir() -> String {
    std::env::current_dir()
        .map(|dir| dir.join("_data"))
        .unwrap_or_else(|_| PathBuf::from("_data"))
        .to_string_lossy()
        .to_string()
}

#[derive(Subcommand, Debug)]
pub enum OperationMode {
    /// Import the models of one or more levels and log a summary per model.
    Import {
        #[arg(required = true)]
        levels: Vec<PathBuf>,
        /// Only import these models, may be repeated.
        #[arg(long = "model")]
        models: Vec<String>,
        /// Directories searched for textures, in order of priority. Defaults to the level's directory.
        #[arg(long = "texture-dir", env = "LVLIMPORT_TEXTURE_DIR", value_delimiter = ',')]
        texture_dirs: Vec<PathBuf>,
        #[command(flatten)]
        settings: ImportArgs,
    },
    /// List the models of a level with their flags.
    Inspect { level: PathBuf },
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, env = "LVLIMPORT_JOBS", default_value_t = default_jobs())]
    pub jobs: usize,
    #[arg(long, value_enum, default_value_t = HierarchyPolicy::Abort)]
    pub hierarchy_policy: HierarchyPolicy,
    /// Added to the bone indices of models with a broken skeleton.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub broken_bone_offset: i32,
    /// JSON object mapping model names to bone index tables, overriding the offset for those models.
    #[arg(long, env = "LVLIMPORT_BROKEN_BONE_TABLE")]
    pub broken_bone_table: Option<PathBuf>,
    /// Also import the low detail (LOWD) variants.
    #[arg(long)]
    pub keep_lowd: bool,
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|jobs| jobs.get())
        .unwrap_or(1)
}

impl ImportArgs {
    pub fn into_settings(self) -> Result<ImportSettings, anyhow::Error> {
        let broken_bone_tables = match &self.broken_bone_table {
            Some(path) => ImportSettings::load_broken_bone_tables(path)?,
            None => HashMap::new(),
        };

        Ok(ImportSettings {
            hierarchy_policy: self.hierarchy_policy,
            broken_bone_remap: match self.broken_bone_offset {
                0 => BoneIndexRemap::Direct,
                offset => BoneIndexRemap::Offset(offset),
            },
            broken_bone_tables,
            skip_lowd: !self.keep_lowd,
            jobs: self.jobs.max(1),
        })
    }
}

/// What to do with bones that can't be placed in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HierarchyPolicy {
    /// Fail the whole model.
    Abort,
    /// Leave the bone and everything below it out.
    SkipBone,
}

/// How the bone indices of a broken skeleton are mapped onto the imported bones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoneIndexRemap {
    Direct,
    /// Added to every index, results below zero are clamped to the first bone.
    Offset(i32),
    /// Looked up by the native index, unknown indices map to the first bone.
    Table(Vec<u32>),
}

impl Default for BoneIndexRemap {
    fn default() -> Self {
        BoneIndexRemap::Offset(-1)
    }
}

impl BoneIndexRemap {
    pub fn apply(&self, index: u8) -> u32 {
        match self {
            BoneIndexRemap::Direct => index as u32,
            BoneIndexRemap::Offset(offset) => (index as i64 + *offset as i64).max(0) as u32,
            BoneIndexRemap::Table(table) => table.get(index as usize).copied().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub hierarchy_policy: HierarchyPolicy,
    /// Only applies to models flagged with a broken skeleton.
    pub broken_bone_remap: BoneIndexRemap,
    /// Per model corrections, these take precedence over `broken_bone_remap`.
    pub broken_bone_tables: HashMap<String, BoneIndexRemap>,
    pub skip_lowd: bool,
    pub jobs: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            hierarchy_policy: HierarchyPolicy::Abort,
            broken_bone_remap: BoneIndexRemap::default(),
            broken_bone_tables: HashMap::new(),
            skip_lowd: true,
            jobs: 1,
        }
    }
}

impl ImportSettings {
    /// The remap for the broken skeleton of `model`.
    pub fn broken_bone_remap_for(&self, model: &str) -> &BoneIndexRemap {
        self.broken_bone_tables
            .get(model)
            .unwrap_or(&self.broken_bone_remap)
    }

    /// `{ "<model>": [<bone index>, ...], ... }`
    pub fn parse_broken_bone_tables(data: &[u8]) -> Result<HashMap<String, BoneIndexRemap>, serde_json::Error> {
        let tables: HashMap<String, Vec<u32>> = serde_json::from_slice(data)?;
        Ok(tables
            .into_iter()
            .map(|(model, table)| (model, BoneIndexRemap::Table(table)))
            .collect())
    }

    pub fn load_broken_bone_tables(path: &Path) -> Result<HashMap<String, BoneIndexRemap>, anyhow::Error> {
        let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let tables = ImportSettings::parse_broken_bone_tables(&data)
            .with_context(|| format!("Failed to parse the bone tables in {}", path.display()))?;
        debug!("Loaded broken bone tables for {} models", tables.len());
        Ok(tables)
    }
}
