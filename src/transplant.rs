//! In-place transfer of the header of one portable executable onto another.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use log::{debug, info};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, image::*, resource::*, section::*, util::*};

/// Summary of a completed header transplant.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TransplantReport {
    /// Whether the section table was replaced in addition to the header.
    pub sections_copied:            bool,
    /// Whether a resource section was found in the target during the merge.
    /// `None` when the section table was not copied.
    pub resource_section_matched:   Option<bool>,
    /// Whether the preserved resource data directory entry was non-empty.
    pub resource_directory_present: bool,
    /// Whether an icon resource was detected in the target after the transplant.
    /// Best-effort result of [`probe_icon_presence`], informational only.
    pub icon_present:               bool,
}

/// Transplant the header of the source image onto the target image.
///
/// The target file is modified in place: the DOS header bytes are overwritten at offset 0
/// and the NT headers are written at the source's header offset, which becomes the target's
/// new header offset. The target's resource data directory entry is preserved across the
/// copy, so the target keeps addressing its own resource directory (and with it its icons).
/// With `copy_sections` the section table is replaced as well, keeping the target's `.rsrc`
/// entry verbatim since its payload bytes are never moved.
///
/// Section payload bytes are never read or written; only header bytes are touched.
///
/// Writes are not transactional: an io error during the copy leaves the target with a
/// partially written header or section table. The caller is responsible for ensuring no
/// other process mutates the target concurrently.
///
/// # Returns
/// Returns a [`TransplantReport`] summarizing the operation, or an error naming the image
/// or step that failed. Parse failures occur before any write; the target is untouched.
pub fn transplant_header<S: AsRef<Path>, T: AsRef<Path>>(
    source: S, target: T, copy_sections: bool,
) -> Result<TransplantReport, TransplantError> {
    let source_data = std::fs::read(&source)
        .map_err(|error| TransplantError::Io(TransplantStep::Open, error))?;
    let mut target_file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&target)
        .map_err(|error| TransplantError::Io(TransplantStep::Open, error))?;
    let mut target_data = Vec::new();
    target_file
        .read_to_end(&mut target_data)
        .map_err(|error| TransplantError::Io(TransplantStep::Open, error))?;

    let source_image = Image::parse(&source_data[..])
        .map_err(|error| TransplantError::Malformed(ImageRole::Source, error))?;
    let target_image = Image::parse(&target_data[..])
        .map_err(|error| TransplantError::Malformed(ImageRole::Target, error))?;

    // snapshot the target's resource entry before any header bytes are overwritten
    let preserved = resource_table_entry(&target_image);
    debug!("preserving target resource entry: {:#x?}", preserved);

    // read both original section tables before the overwrite invalidates the target layout
    let merge = if copy_sections {
        let source_table =
            source_image.section_table().map_err(|error| section_error(ImageRole::Source, error))?;
        let target_table =
            target_image.section_table().map_err(|error| section_error(ImageRole::Target, error))?;
        Some(merge_section_tables(&source_table, &target_table))
    } else {
        None
    };

    let nt_offset = source_image.nt_headers_offset();
    let nt_size = source_image.nt_headers_size();
    debug!("copying header: dos {:#x?} bytes, nt {:#x?} bytes at {:#x?}", PE_DOS_HEADER_SIZE, nt_size, nt_offset);
    write_at(&mut target_file, 0, &source_data[..PE_DOS_HEADER_SIZE as usize])
        .map_err(|error| TransplantError::Io(TransplantStep::CopyHeader, error))?;
    write_at(
        &mut target_file,
        nt_offset,
        &source_data[nt_offset as usize..(nt_offset + nt_size) as usize],
    )
    .map_err(|error| TransplantError::Io(TransplantStep::CopyHeader, error))?;

    // re-establish the target's resource entry inside the just-written data directory array
    debug!("restoring resource entry at {:#x?}", source_image.resource_entry_offset());
    write_at(&mut target_file, source_image.resource_entry_offset(), preserved.as_bytes())
        .map_err(|error| TransplantError::Io(TransplantStep::RestoreResourceEntry, error))?;

    let mut resource_section_matched = None;
    if let Some(ref merge) = merge {
        resource_section_matched = Some(merge.resource_section_matched);
        let mut table_data = Vec::with_capacity(merge.sections.len() * 40);
        for section in &merge.sections {
            table_data.extend_from_slice(section.as_bytes());
        }
        debug!(
            "writing merged section table: {} sections at {:#x?}",
            merge.sections.len(),
            source_image.section_table_offset()
        );
        write_at(&mut target_file, source_image.section_table_offset(), &table_data)
            .map_err(|error| TransplantError::Io(TransplantStep::CopySections, error))?;
    }

    let icon_present = probe_target(&mut target_file);
    info!(
        "transplanted {} onto {:?}, preserving the target's resources",
        if copy_sections { "header and section table" } else { "header" },
        target.as_ref()
    );

    Ok(TransplantReport {
        sections_copied: copy_sections,
        resource_section_matched,
        resource_directory_present: preserved.virtual_address > 0 && preserved.size > 0,
        icon_present,
    })
}

fn section_error(role: ImageRole, error: ImageReadError) -> TransplantError {
    match error {
        ImageReadError::AllocationFailed(error) => TransplantError::Allocation(error),
        error => TransplantError::Malformed(role, error),
    }
}

/// Probe the final state of the target for an icon resource.
/// Informational only; any failure to re-read or re-parse the target reports absence.
fn probe_target(file: &mut File) -> bool {
    let mut data = Vec::new();
    if file.seek(SeekFrom::Start(0)).is_err() || file.read_to_end(&mut data).is_err() {
        return false;
    }
    match Image::parse(&data[..]) {
        Ok(image) => probe_icon_presence(&image),
        Err(_) => false,
    }
}
