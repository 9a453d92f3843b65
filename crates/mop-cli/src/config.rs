use crate::cli::BuildArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use mopbuild::core::models::ligand::LinkerPair;
use mopbuild::core::polyhedra::catalog::PolyhedronKind;
use mopbuild::engine::config as core_config;
use mopbuild::engine::error::EngineError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialPolyhedronConfig {
    shape: Option<String>,
    mode: Option<String>,
    scaling: Option<String>,
    orientation: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialAnchorsConfig {
    indices: Option<Vec<usize>>,
    #[serde(rename = "linker-oxygen")]
    linker_oxygen: Option<usize>,
    #[serde(rename = "linker-carbon")]
    linker_carbon: Option<usize>,
    registry: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialBoxConfig {
    lengths: Option<[f64; 3]>,
    padding: Option<f64>,
    open: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialValidationConfig {
    #[serde(rename = "max-anchor-deviation")]
    max_anchor_deviation: Option<f64>,
}

/// The TOML configuration file, with every field optional so CLI flags can fill the gaps.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAssemblyConfig {
    polyhedron: Option<PartialPolyhedronConfig>,
    anchors: Option<PartialAnchorsConfig>,
    #[serde(rename = "box")]
    box_config: Option<PartialBoxConfig>,
    validation: Option<PartialValidationConfig>,
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_enum<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = core_config::ConfigError>,
{
    value
        .parse()
        .map_err(|e: core_config::ConfigError| CliError::Core(EngineError::from(e)))
}

impl PartialAssemblyConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final assembly configuration.
    ///
    /// `-S` assignments are applied to the file first; dedicated CLI flags then take
    /// precedence over both.
    pub fn merge_with_cli(mut self, args: &BuildArgs) -> Result<core_config::AssemblyConfig> {
        self.apply_set_values(&args.set_values)?;

        let polyhedron = self.polyhedron.take().unwrap_or_default();
        let anchors_config = self.anchors.take().unwrap_or_default();
        let box_config = self.box_config.take().unwrap_or_default();
        let validation = self.validation.take().unwrap_or_default();

        let shape_name = args
            .shape
            .as_ref()
            .or(polyhedron.shape.as_ref())
            .ok_or_else(|| {
                CliError::Config(
                    "A value for 'polyhedron.shape' is required either in the config file or via --shape."
                        .to_string(),
                )
            })?;
        let shape: PolyhedronKind = shape_name
            .parse()
            .map_err(|e| CliError::Core(EngineError::from(e)))?;

        let mut builder = core_config::AssemblyConfigBuilder::new()
            .shape(shape)
            .anchors(Self::resolve_anchors(args, anchors_config)?)
            .box_spec(Self::resolve_box(args, box_config)?);

        if let Some(mode) = args.mode.as_ref().or(polyhedron.mode.as_ref()) {
            builder = builder.mode(parse_enum(mode)?);
        }
        if let Some(scaling) = args.scaling.as_ref().or(polyhedron.scaling.as_ref()) {
            builder = builder.scaling(parse_enum(scaling)?);
        }
        if let Some(orientation) = args
            .orientation
            .as_ref()
            .or(polyhedron.orientation.as_ref())
        {
            builder = builder.orientation(parse_enum(orientation)?);
        }
        if let Some(deviation) = args
            .max_anchor_deviation
            .or(validation.max_anchor_deviation)
        {
            builder = builder.max_anchor_deviation(deviation);
        }

        builder
            .build()
            .map_err(|e| CliError::Core(EngineError::from(e)))
    }

    fn resolve_anchors(
        args: &BuildArgs,
        file: PartialAnchorsConfig,
    ) -> Result<core_config::AnchorSelection> {
        if let Some(list) = &args.anchors {
            let anchors =
                parser::parse_index_list(list).map_err(|e| CliError::Argument(e.to_string()))?;
            let linker = args
                .linker
                .as_deref()
                .map(parser::parse_index_pair)
                .transpose()
                .map_err(|e| CliError::Argument(e.to_string()))?
                .map(|(oxygen, carbon)| LinkerPair { oxygen, carbon });
            return Ok(core_config::AnchorSelection::Explicit { anchors, linker });
        }
        if let Some(path) = &args.registry {
            return Ok(core_config::AnchorSelection::Registry { path: path.clone() });
        }
        if let Some(anchors) = file.indices {
            let linker = match (file.linker_oxygen, file.linker_carbon) {
                (Some(oxygen), Some(carbon)) => Some(LinkerPair { oxygen, carbon }),
                (None, None) => None,
                _ => {
                    return Err(CliError::Config(
                        "'anchors.linker-oxygen' and 'anchors.linker-carbon' must be given together."
                            .to_string(),
                    ));
                }
            };
            return Ok(core_config::AnchorSelection::Explicit { anchors, linker });
        }
        if let Some(path) = file.registry {
            return Ok(core_config::AnchorSelection::Registry { path });
        }
        Ok(core_config::AnchorSelection::Auto)
    }

    fn resolve_box(args: &BuildArgs, file: PartialBoxConfig) -> Result<core_config::BoxSpec> {
        let cli = &args.box_args;
        if cli.open_box {
            return Ok(core_config::BoxSpec::Open);
        }
        if let Some(list) = &cli.box_lengths {
            let lengths =
                parser::parse_vector3(list).map_err(|e| CliError::Argument(e.to_string()))?;
            return Ok(core_config::BoxSpec::periodic(lengths));
        }
        if let Some(padding) = cli.padding {
            return Ok(core_config::BoxSpec::AutoPeriodic { padding });
        }

        if file.open.unwrap_or(false) {
            return Ok(core_config::BoxSpec::Open);
        }
        match (file.lengths, file.padding) {
            (Some(_), Some(_)) => Err(CliError::Config(
                "'box.lengths' and 'box.padding' are mutually exclusive.".to_string(),
            )),
            (Some(lengths), None) => Ok(core_config::BoxSpec::periodic(lengths)),
            (None, Some(padding)) => Ok(core_config::BoxSpec::AutoPeriodic { padding }),
            (None, None) => Ok(core_config::BoxSpec::default()),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) =
                parser::parse_assignment(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "polyhedron.shape" => {
                    self.polyhedron.get_or_insert_with(Default::default).shape =
                        Some(value_str.to_string());
                }
                "polyhedron.mode" => {
                    self.polyhedron.get_or_insert_with(Default::default).mode =
                        Some(value_str.to_string());
                }
                "polyhedron.scaling" => {
                    self.polyhedron.get_or_insert_with(Default::default).scaling =
                        Some(value_str.to_string());
                }
                "polyhedron.orientation" => {
                    self.polyhedron
                        .get_or_insert_with(Default::default)
                        .orientation = Some(value_str.to_string());
                }
                "anchors.indices" => {
                    self.anchors.get_or_insert_with(Default::default).indices = Some(
                        parser::parse_index_list(value_str)
                            .map_err(|e| CliError::Config(e.to_string()))?,
                    );
                }
                "anchors.registry" => {
                    self.anchors.get_or_insert_with(Default::default).registry =
                        Some(PathBuf::from(value_str));
                }
                "box.lengths" => {
                    self.box_config.get_or_insert_with(Default::default).lengths = Some(
                        parser::parse_vector3(value_str)
                            .map_err(|e| CliError::Config(e.to_string()))?,
                    );
                }
                "box.padding" => {
                    self.box_config.get_or_insert_with(Default::default).padding =
                        Some(parse_setting(key, value_str)?);
                }
                "box.open" => {
                    self.box_config.get_or_insert_with(Default::default).open =
                        Some(parse_setting(key, value_str)?);
                }
                "validation.max-anchor-deviation" => {
                    self.validation
                        .get_or_insert_with(Default::default)
                        .max_anchor_deviation = Some(parse_setting(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key for --set: {}",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use mopbuild::engine::config::{
        AnchorSelection, BoxSpec, FaceOrientation, PlacementMode, ScalingConvention,
    };
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn build_args(extra: &[&str]) -> BuildArgs {
        let mut argv = vec!["mopbuild", "build", "-i", "in.bgf", "-o", "out.bgf"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Build(args) => args,
            _ => panic!("Expected 'build' subcommand"),
        }
    }

    fn merge(content: &str, name: &str, extra: &[&str]) -> Result<core_config::AssemblyConfig> {
        let path = write_config_file(name, content);
        PartialAssemblyConfig::from_file(&path)?.merge_with_cli(&build_args(extra))
    }

    #[test]
    fn file_values_populate_config() {
        let config = merge(
            r#"
            [polyhedron]
            shape = "cube"
            mode = "face"
            scaling = "circumradius"
            orientation = "inward"

            [anchors]
            indices = [0, 4, 8, 12]

            [box]
            lengths = [40.0, 40.0, 40.0]

            [validation]
            max-anchor-deviation = 0.05
            "#,
            "full.toml",
            &[],
        )
        .unwrap();

        assert_eq!(config.shape, PolyhedronKind::Cube);
        assert_eq!(config.mode, PlacementMode::Face);
        assert_eq!(config.scaling, ScalingConvention::Circumradius);
        assert_eq!(config.orientation, FaceOrientation::Inward);
        assert_eq!(
            config.anchors,
            AnchorSelection::Explicit {
                anchors: vec![0, 4, 8, 12],
                linker: None
            }
        );
        assert_eq!(config.box_spec, BoxSpec::periodic([40.0, 40.0, 40.0]));
        assert_eq!(config.max_anchor_deviation, Some(0.05));
    }

    #[test]
    fn cli_flags_override_file_and_set_values() {
        let config = merge(
            r#"
            [polyhedron]
            shape = "tetra"
            mode = "face"

            [box]
            padding = 2.0
            "#,
            "override.toml",
            &[
                "-c",
                TEST_DIR.path().join("override.toml").to_str().unwrap(),
                "--shape",
                "octa",
                "-S",
                "polyhedron.mode=bent",
                "--mode",
                "edge",
                "--open-box",
            ],
        )
        .unwrap();

        assert_eq!(config.shape, PolyhedronKind::Octahedron);
        assert_eq!(config.mode, PlacementMode::Edge);
        assert_eq!(config.box_spec, BoxSpec::Open);
    }

    #[test]
    fn set_values_override_file() {
        let config = merge(
            r#"
            [polyhedron]
            shape = "tetra"
            "#,
            "set.toml",
            &[
                "-S",
                "polyhedron.shape=icosa",
                "-S",
                "box.padding=3.5",
                "-S",
                "anchors.registry=ligands.toml",
            ],
        )
        .unwrap();

        assert_eq!(config.shape, PolyhedronKind::Icosahedron);
        assert_eq!(config.box_spec, BoxSpec::AutoPeriodic { padding: 3.5 });
        assert_eq!(
            config.anchors,
            AnchorSelection::Registry {
                path: PathBuf::from("ligands.toml")
            }
        );
    }

    #[test]
    fn cli_anchors_take_precedence_over_registry_and_file() {
        let config = merge(
            r#"
            [polyhedron]
            shape = "octa"

            [anchors]
            indices = [3, 4]
            registry = "file-registry.toml"
            "#,
            "anchors.toml",
            &["--anchors", "0,17", "--linker", "1,2", "--registry", "cli.toml"],
        )
        .unwrap();

        assert_eq!(
            config.anchors,
            AnchorSelection::Explicit {
                anchors: vec![0, 17],
                linker: Some(LinkerPair {
                    oxygen: 1,
                    carbon: 2
                })
            }
        );
    }

    #[test]
    fn file_linker_requires_both_atoms() {
        let result = merge(
            r#"
            [polyhedron]
            shape = "octa"

            [anchors]
            indices = [0, 1]
            linker-oxygen = 2
            "#,
            "half-linker.toml",
            &[],
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn defaults_without_config_file() {
        let config = PartialAssemblyConfig::default()
            .merge_with_cli(&build_args(&["--shape", "dodeca"]))
            .unwrap();
        assert_eq!(config.shape, PolyhedronKind::Dodecahedron);
        assert_eq!(config.mode, PlacementMode::Edge);
        assert_eq!(config.anchors, AnchorSelection::Auto);
        assert_eq!(config.box_spec, BoxSpec::default());
    }

    #[test]
    fn missing_shape_is_reported() {
        let result = PartialAssemblyConfig::default().merge_with_cli(&build_args(&[]));
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("polyhedron.shape")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_shape_and_mode_are_core_errors() {
        let bad_shape =
            PartialAssemblyConfig::default().merge_with_cli(&build_args(&["--shape", "prism"]));
        assert!(matches!(bad_shape, Err(CliError::Core(EngineError::Catalog { .. }))));

        let bad_mode = PartialAssemblyConfig::default()
            .merge_with_cli(&build_args(&["--shape", "cube", "--mode", "vertex"]));
        assert!(matches!(bad_mode, Err(CliError::Core(EngineError::Config { .. }))));
    }

    #[test]
    fn conflicting_box_settings_in_file_fail() {
        let result = merge(
            r#"
            [polyhedron]
            shape = "cube"

            [box]
            lengths = [30.0, 30.0, 30.0]
            padding = 5.0
            "#,
            "box-conflict.toml",
            &[],
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_file_keys_and_set_keys_are_rejected() {
        let path = write_config_file(
            "unknown.toml",
            r#"
            [polyhedron]
            shape = "cube"
            colour = "blue"
            "#,
        );
        assert!(matches!(
            PartialAssemblyConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));

        let result = PartialAssemblyConfig::default()
            .merge_with_cli(&build_args(&["--shape", "cube", "-S", "polyhedron.colour=blue"]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_set_value_is_reported() {
        let result = PartialAssemblyConfig::default()
            .merge_with_cli(&build_args(&["--shape", "cube", "-S", "box.padding=wide"]));
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("box.padding")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}
