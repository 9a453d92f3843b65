use crate::core::models::boundary::{Boundary, OpenBoundary, PeriodicBoundary};
use crate::core::models::ids::SpeciesId;
use crate::core::models::ligand::{Ligand, LinkerPair, Molecule};
use crate::core::models::simulation_box::SimulationBox;
use crate::core::polyhedra::catalog::{Polyhedron, polyhedron};
use crate::core::topology::linkers::locate_in_ligand;
use crate::core::topology::registry::LigandRegistry;
use crate::engine::aligner::RigidAligner;
use crate::engine::config::{AnchorSelection, AssemblyConfig, BoxSpec, ConfigError, PlacementMode};
use crate::engine::error::EngineError;
use crate::engine::placement::{
    EdgePlacer, FaceAssembler, FaceTargets, Placement, PlacementError, PlacementStrategy,
    SinglePlacer,
};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scaling::auto_box_side;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct AssemblyResult {
    pub species: SpeciesId,
    pub mode: PlacementMode,
    pub coordinate_multiplier: f64,
    /// One entry per committed molecule, in molecule-list order.
    pub placements: Vec<Placement>,
}

impl AssemblyResult {
    pub fn worst_anchor_deviation(&self) -> f64 {
        self.placements
            .iter()
            .map(|p| p.max_anchor_deviation)
            .fold(0.0, f64::max)
    }
}

/// Where the anchors of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSource {
    Explicit,
    Registry,
    Discovered,
}

struct PreparedAssembly {
    ligand: Ligand,
    polyhedron: &'static Polyhedron,
    strategy: Box<dyn PlacementStrategy>,
}

/// Builds a new box sized by `config.box_spec` and assembles the ligand into it.
#[instrument(skip_all, name = "assembly_workflow")]
pub fn build(
    ligand: &Ligand,
    config: &AssemblyConfig,
    reporter: &ProgressReporter,
) -> Result<(SimulationBox, AssemblyResult), EngineError> {
    let prepared = reporter.phase("Preparation", || prepare(ligand, config))?;
    let boundary = make_boundary(&config.box_spec, &prepared, config.mode)?;
    let mut sim_box = SimulationBox::new(boundary);
    let result = stage_and_commit(&mut sim_box, prepared, config, reporter)?;
    Ok((sim_box, result))
}

/// Assembles the ligand into an existing box, using the box's boundary for re-imaging.
///
/// `config.box_spec` is ignored. On error the box is left unmodified.
#[instrument(skip_all, name = "assembly_workflow")]
pub fn run(
    sim_box: &mut SimulationBox,
    ligand: &Ligand,
    config: &AssemblyConfig,
    reporter: &ProgressReporter,
) -> Result<AssemblyResult, EngineError> {
    let prepared = reporter.phase("Preparation", || prepare(ligand, config))?;
    stage_and_commit(sim_box, prepared, config, reporter)
}

/// Applies `selection` to `ligand`, replacing its anchors and linker pair.
pub fn resolve_anchors(
    ligand: &mut Ligand,
    selection: &AnchorSelection,
) -> Result<AnchorSource, EngineError> {
    let (anchors, linker, source) = match selection {
        AnchorSelection::Explicit { anchors, linker } => {
            let linker = linker.or_else(|| discovered_linker(ligand, anchors));
            (anchors.clone(), linker, AnchorSource::Explicit)
        }
        AnchorSelection::Registry { path } => {
            let registry = LigandRegistry::load(path)?;
            match registry.get(ligand.name()) {
                Some(entry) => {
                    let linker = entry
                        .linker()
                        .or_else(|| discovered_linker(ligand, &entry.anchors));
                    (entry.anchors.clone(), linker, AnchorSource::Registry)
                }
                None => {
                    warn!(
                        ligand = ligand.name(),
                        "Ligand not found in registry; discovering anchors from connectivity."
                    );
                    let found = locate_in_ligand(ligand)?;
                    (found.anchors, found.linkers.first().copied(), AnchorSource::Discovered)
                }
            }
        }
        AnchorSelection::Auto => {
            let found = locate_in_ligand(ligand)?;
            (found.anchors, found.linkers.first().copied(), AnchorSource::Discovered)
        }
    };

    ligand.set_anchors(anchors)?;
    ligand.set_linker(linker)?;
    info!(
        ligand = ligand.name(),
        anchors = ?ligand.anchors(),
        linker = ?ligand.linker(),
        source = ?source,
        "Resolved anchor atoms."
    );
    Ok(source)
}

/// First discovered linker pair whose oxygen is bonded to one of `anchors`.
fn discovered_linker(ligand: &Ligand, anchors: &[usize]) -> Option<LinkerPair> {
    let found = locate_in_ligand(ligand).ok()?;
    let neighbors = ligand.neighbors();
    found.linkers.into_iter().find(|pair| {
        anchors
            .iter()
            .any(|&a| neighbors.get(a).is_some_and(|row| row.contains(&pair.oxygen)))
    })
}

fn prepare(ligand: &Ligand, config: &AssemblyConfig) -> Result<PreparedAssembly, EngineError> {
    info!(
        shape = %config.shape,
        mode = %config.mode,
        "Preparing assembly of ligand '{}'.",
        ligand.name()
    );
    let mut ligand = ligand.clone();
    resolve_anchors(&mut ligand, &config.anchors)?;
    let polyhedron = polyhedron(config.shape);

    let strategy: Result<Box<dyn PlacementStrategy>, PlacementError> = match config.mode {
        PlacementMode::Edge => EdgePlacer::new(polyhedron, &ligand, config.scaling)
            .map(|p| Box::new(p) as Box<dyn PlacementStrategy>),
        PlacementMode::Face | PlacementMode::Bent => {
            let targets = if config.mode == PlacementMode::Face {
                FaceTargets::Vertices
            } else {
                FaceTargets::EdgeMidpoints
            };
            FaceAssembler::new(polyhedron, targets, &ligand, config.scaling, config.orientation)
                .map(|p| Box::new(p) as Box<dyn PlacementStrategy>)
        }
        PlacementMode::Single => Ok(Box::new(SinglePlacer)),
    };

    let strategy = strategy.map_err(|e| match e {
        PlacementError::AnchorCount { expected, found } => EngineError::AnchorCountMismatch {
            mode: config.mode,
            ligand: ligand.name().to_string(),
            expected,
            found,
        },
        other => EngineError::Placement {
            target: polyhedron.name().to_string(),
            message: other.to_string(),
        },
    })?;

    info!(
        multiplier = strategy.coordinate_multiplier(),
        copies = strategy.target_count(),
        "Placement strategy ready."
    );
    Ok(PreparedAssembly {
        ligand,
        polyhedron,
        strategy,
    })
}

fn make_boundary(
    spec: &BoxSpec,
    prepared: &PreparedAssembly,
    mode: PlacementMode,
) -> Result<Box<dyn Boundary>, EngineError> {
    let boundary: Box<dyn Boundary> = match spec {
        BoxSpec::Periodic { lengths } => Box::new(PeriodicBoundary::new(*lengths).ok_or(
            ConfigError::InvalidParameter {
                parameter: "box_spec",
                reason: "box lengths must be positive".to_string(),
            },
        )?),
        BoxSpec::AutoPeriodic { padding } => {
            let ligand = &prepared.ligand;
            let side = if mode == PlacementMode::Single {
                let reach = ligand
                    .atoms()
                    .iter()
                    .map(|a| a.position.coords.norm())
                    .fold(0.0, f64::max);
                2.0 * reach + padding
            } else {
                let extent = ligand
                    .anchors()
                    .first()
                    .map_or(0.0, |&anchor| ligand.extent_from(anchor));
                auto_box_side(
                    prepared.polyhedron.circumradius(),
                    prepared.strategy.coordinate_multiplier(),
                    extent,
                    *padding,
                )
            };
            info!(side, "Sizing periodic box automatically.");
            Box::new(PeriodicBoundary::cubic(side).ok_or(ConfigError::InvalidParameter {
                parameter: "box_spec",
                reason: format!("computed box side {} is not positive", side),
            })?)
        }
        BoxSpec::Open => Box::new(OpenBoundary),
    };
    Ok(boundary)
}

fn stage_and_commit(
    sim_box: &mut SimulationBox,
    prepared: PreparedAssembly,
    config: &AssemblyConfig,
    reporter: &ProgressReporter,
) -> Result<AssemblyResult, EngineError> {
    let PreparedAssembly {
        ligand, strategy, ..
    } = prepared;

    let (staged, placements) = reporter.phase("Placement", || {
        stage_copies(sim_box.boundary(), &ligand, strategy.as_ref(), config, reporter)
    })?;

    reporter.phase("Commit", || {
        let species = sim_box.add_species(ligand);
        sim_box
            .set_molecule_count(species, staged.len())
            .ok_or_else(|| EngineError::Internal("species vanished before commit".to_string()))?;
        let slots = sim_box
            .molecule_list_mut(species)
            .ok_or_else(|| EngineError::Internal("species has no molecule list".to_string()))?;
        for (slot, molecule) in slots.iter_mut().zip(staged) {
            *slot = molecule;
        }

        let result = AssemblyResult {
            species,
            mode: config.mode,
            coordinate_multiplier: strategy.coordinate_multiplier(),
            placements,
        };
        info!(
            molecules = result.placements.len(),
            worst_deviation = result.worst_anchor_deviation(),
            "Assembly committed."
        );
        Ok(result)
    })
}

fn stage_copies(
    boundary: &dyn Boundary,
    ligand: &Ligand,
    strategy: &dyn PlacementStrategy,
    config: &AssemblyConfig,
    reporter: &ProgressReporter,
) -> Result<(Vec<Molecule>, Vec<Placement>), EngineError> {
    let aligner = RigidAligner::new(boundary);
    let total = strategy.target_count();
    let mut staged = Vec::with_capacity(total);
    let mut placements = Vec::with_capacity(total);

    reporter.report(Progress::TaskStart {
        total_steps: total as u64,
    });
    for index in 0..total {
        let target = strategy.target(index);
        let mut copy = ligand.make_instance();
        let placement = strategy
            .place(&mut copy, index, &aligner)
            .map_err(|e| EngineError::Placement {
                target: target.to_string(),
                message: e.to_string(),
            })?;

        if let Some(limit) = config.max_anchor_deviation {
            if placement.max_anchor_deviation > limit {
                return Err(EngineError::Placement {
                    target: target.to_string(),
                    message: format!(
                        "anchor deviation {:.6} exceeds the allowed {:.6}",
                        placement.max_anchor_deviation, limit
                    ),
                });
            }
        }
        debug!(%target, rmsd = placement.anchor_rmsd, "Staged ligand copy.");

        staged.push(copy);
        placements.push(placement);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    Ok((staged, placements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::{Bond, BondOrder};
    use crate::core::polyhedra::catalog::PolyhedronKind;
    use crate::core::utils::geometry::pairwise_distances;
    use crate::engine::config::AssemblyConfigBuilder;
    use nalgebra::{Point3, Vector3};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn bdc() -> Ligand {
        let atoms = vec![
            Atom::new("ZN1", "ZN", Point3::new(0.0, 0.0, 0.0)),
            Atom::new("ZN2", "ZN", Point3::new(5.0, 0.0, 0.0)),
            Atom::new("O1", "O_2", Point3::new(0.9, 0.9, 0.1)),
            Atom::new("C1", "C_R", Point3::new(1.8, 1.5, 0.0)),
            Atom::new("C2", "C_R", Point3::new(3.2, 1.5, 0.0)),
            Atom::new("O2", "O_2", Point3::new(4.1, 0.9, -0.1)),
            Atom::new("H1", "H_", Point3::new(2.5, 2.1, 0.8)),
        ];
        let bonds = vec![
            Bond::new(0, 2, BondOrder::Single),
            Bond::new(2, 3, BondOrder::Double),
            Bond::new(3, 4, BondOrder::Single),
            Bond::new(4, 5, BondOrder::Double),
            Bond::new(5, 1, BondOrder::Single),
            Bond::new(3, 6, BondOrder::Single),
        ];
        Ligand::new("BDC", atoms, bonds)
    }

    fn triangle_cap() -> Ligand {
        let atoms = vec![
            Atom::new("M1", "ZN", Point3::new(0.0, 0.0, 0.0)),
            Atom::new("M2", "ZN", Point3::new(4.0, 0.0, 0.0)),
            Atom::new("M3", "ZN", Point3::new(2.0, 2.0 * 3f64.sqrt(), 0.0)),
            Atom::new("C1", "C_R", Point3::new(2.0, 2.0 / 3f64.sqrt(), 1.2)),
        ];
        Ligand::new("TRI", atoms, Vec::new())
    }

    fn config(shape: PolyhedronKind, mode: PlacementMode) -> AssemblyConfigBuilder {
        AssemblyConfigBuilder::new().shape(shape).mode(mode)
    }

    #[test]
    fn octahedron_edges_with_discovered_anchors() {
        let config = config(PolyhedronKind::Octahedron, PlacementMode::Edge)
            .build()
            .unwrap();
        let (sim_box, result) = build(&bdc(), &config, &ProgressReporter::new()).unwrap();

        assert!((result.coordinate_multiplier - 5.0 / 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(result.placements.len(), 12);
        assert_eq!(sim_box.molecule_count(result.species), 12);

        let template = sim_box.species(result.species).unwrap();
        assert_eq!(template.anchors(), &[0, 1]);
        assert_eq!(template.linker(), Some(LinkerPair { oxygen: 2, carbon: 3 }));

        let reference = pairwise_distances(bdc().make_instance().positions());
        for molecule in sim_box.molecule_list(result.species) {
            let anchor_distance = (molecule.positions()[1] - molecule.positions()[0]).norm();
            assert!((anchor_distance - 5.0).abs() < 1e-9);
            assert!((molecule.positions()[0].coords.norm() - result.coordinate_multiplier).abs() < 1e-9);
            for (a, b) in reference.iter().zip(pairwise_distances(molecule.positions())) {
                assert!((a - b).abs() < 1e-9);
            }
        }
        assert!(result.worst_anchor_deviation() < 1e-9);
    }

    #[test]
    fn auto_box_holds_every_atom_without_wrapping() {
        let config = config(PolyhedronKind::Cube, PlacementMode::Edge)
            .box_spec(BoxSpec::AutoPeriodic { padding: 4.0 })
            .build()
            .unwrap();
        let (sim_box, result) = build(&bdc(), &config, &ProgressReporter::new()).unwrap();

        let side = sim_box.boundary().dimensions().unwrap().x;
        let extent = bdc().extent_from(0);
        let expected = 2.0 * (result.coordinate_multiplier * 3f64.sqrt() + extent) + 4.0;
        assert!((side - expected).abs() < 1e-9);
        for molecule in sim_box.molecule_list(result.species) {
            assert!(molecule.positions().iter().all(|p| p.coords.amax() < side / 2.0));
        }
    }

    #[test]
    fn tetrahedron_faces_with_explicit_anchors() {
        let config = config(PolyhedronKind::Tetrahedron, PlacementMode::Face)
            .anchors(AnchorSelection::Explicit {
                anchors: vec![0, 1, 2],
                linker: None,
            })
            .box_spec(BoxSpec::Open)
            .build()
            .unwrap();
        let (sim_box, result) = build(&triangle_cap(), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(sim_box.molecule_count(result.species), 4);
        assert!((result.coordinate_multiplier - 2f64.sqrt()).abs() < 1e-9);
        assert!(result.worst_anchor_deviation() < 1e-9);
        let first = &result.placements[0].correspondence;
        assert!(result.placements.iter().all(|p| &p.correspondence == first));
    }

    #[test]
    fn anchor_count_mismatch_leaves_box_untouched() {
        let mut sim_box = SimulationBox::new(Box::new(OpenBoundary));
        let config = config(PolyhedronKind::Tetrahedron, PlacementMode::Face)
            .build()
            .unwrap();

        let err = run(&mut sim_box, &bdc(), &config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::AnchorCountMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert_eq!(sim_box.species_iter().count(), 0);
        assert_eq!(sim_box.total_molecule_count(), 0);
    }

    #[test]
    fn exceeding_deviation_limit_fails_the_whole_run() {
        let mut ligand = Ligand::new(
            "SQR",
            vec![
                Atom::new("M1", "ZN", Point3::new(0.0, 0.0, 0.0)),
                Atom::new("M2", "ZN", Point3::new(2.0, 0.0, 0.0)),
                Atom::new("M3", "ZN", Point3::new(2.0, 2.3, 0.0)),
                Atom::new("M4", "ZN", Point3::new(0.0, 2.0, 0.1)),
            ],
            Vec::new(),
        );
        ligand.set_anchors(vec![0, 1, 2, 3]).unwrap();
        let mut sim_box = SimulationBox::new(Box::new(OpenBoundary));
        let config = config(PolyhedronKind::Cube, PlacementMode::Face)
            .anchors(AnchorSelection::Explicit {
                anchors: vec![0, 1, 2, 3],
                linker: None,
            })
            .max_anchor_deviation(1e-3)
            .build()
            .unwrap();

        let err = run(&mut sim_box, &ligand, &config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::Placement { .. }));
        assert_eq!(sim_box.total_molecule_count(), 0);
    }

    #[test]
    fn registry_entry_overrides_discovery() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bdc]\nanchors = [1, 0]\nlinker-oxygen = 5\nlinker-carbon = 4").unwrap();

        let mut ligand = bdc();
        let source = resolve_anchors(
            &mut ligand,
            &AnchorSelection::Registry {
                path: file.path().to_path_buf(),
            },
        )
        .unwrap();
        assert_eq!(source, AnchorSource::Registry);
        assert_eq!(ligand.anchors(), &[1, 0]);
        assert_eq!(ligand.linker(), Some(LinkerPair { oxygen: 5, carbon: 4 }));
    }

    #[test]
    fn registry_miss_falls_back_to_discovery() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[OTHER]\nanchors = [0, 1]").unwrap();

        let mut ligand = bdc();
        let source = resolve_anchors(
            &mut ligand,
            &AnchorSelection::Registry {
                path: file.path().to_path_buf(),
            },
        )
        .unwrap();
        assert_eq!(source, AnchorSource::Discovered);
        assert_eq!(ligand.anchors(), &[0, 1]);
    }

    #[test]
    fn explicit_anchors_pick_up_a_bonded_linker() {
        let mut ligand = bdc();
        resolve_anchors(
            &mut ligand,
            &AnchorSelection::Explicit {
                anchors: vec![1, 0],
                linker: None,
            },
        )
        .unwrap();
        assert_eq!(ligand.anchors(), &[1, 0]);
        assert!(ligand.linker().is_some());

        let err = resolve_anchors(
            &mut ligand,
            &AnchorSelection::Explicit {
                anchors: vec![0, 42],
                linker: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Ligand { .. }));
    }

    #[test]
    fn single_mode_places_one_untouched_copy() {
        let config = config(PolyhedronKind::Icosahedron, PlacementMode::Single)
            .box_spec(BoxSpec::Periodic {
                lengths: Vector3::new(40.0, 40.0, 40.0),
            })
            .build()
            .unwrap();
        let (sim_box, result) = build(&bdc(), &config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.placements.len(), 1);
        assert_eq!(
            sim_box.molecule_list(result.species)[0].positions(),
            bdc().make_instance().positions()
        );
    }

    #[test]
    fn progress_reports_each_phase_and_copy() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        let config = config(PolyhedronKind::Tetrahedron, PlacementMode::Edge)
            .build()
            .unwrap();
        build(&bdc(), &config, &reporter).unwrap();

        let events = events.lock().unwrap();
        let phases: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Progress::PhaseStart { name } => Some(*name),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec!["Preparation", "Placement", "Commit"]);
        let increments = events
            .iter()
            .filter(|e| matches!(e, Progress::TaskIncrement))
            .count();
        assert_eq!(increments, 6);
    }
}
