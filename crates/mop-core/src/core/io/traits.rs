use crate::core::models::ligand::Ligand;
use crate::core::models::simulation_box::SimulationBox;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for molecular file formats used by the assembler.
///
/// Formats read a single ligand template (atoms and bonds) and write a complete
/// assembled box, with every molecule of every species.
pub trait MolecularFile {
    /// The type of metadata associated with the file format.
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a ligand template from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed ligand and the metadata needed to write it back.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Ligand, Self::Metadata), Self::Error>;

    /// Writes every molecule in a box to a writer.
    ///
    /// # Arguments
    ///
    /// * `sim_box` - The box whose molecules are written.
    /// * `metadata` - Metadata (header lines) carried over from the input.
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the box is internally inconsistent.
    fn write_to(
        sim_box: &SimulationBox,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a box with format-default metadata.
    fn write_box_to(sim_box: &SimulationBox, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a ligand template from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Ligand, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a box and metadata to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        sim_box: &SimulationBox,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(sim_box, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_box_to_path<P: AsRef<Path>>(
        sim_box: &SimulationBox,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_box_to(sim_box, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
