//! Merging the section tables of two images.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::{constants::*, types::*};

/// Result of merging two section tables.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SectionMerge {
    /// The merged table, one entry per source section.
    pub sections:                 Vec<SectionHeader>,
    /// Whether a resource section was found in the target table.
    /// `false` indicates a structural warning: no entry was substituted and
    /// every source section was carried over unchanged.
    pub resource_section_matched: bool,
}

/// Merge the section tables of a source and a target image.
///
/// The merged table follows the source layout, except that the entry named `.rsrc`
/// is taken verbatim from the target. The target's resource payload is never moved
/// on disk, so its table entry has to keep describing the unmoved data while every
/// other entry is allowed to follow the source.
///
/// A target without a `.rsrc` section is not an error; the merge succeeds with a
/// warning and the source table is copied unchanged.
pub fn merge_section_tables(source: &[SectionHeader], target: &[SectionHeader]) -> SectionMerge {
    let resource_section = target
        .iter()
        .find(|section| section.name_starts_with(PE_RESOURCE_SECTION_NAME))
        .copied();
    match resource_section {
        Some(section) => debug!("target resource section: {:#x?}", section),
        None => warn!("target has no .rsrc section, copying source section table unchanged"),
    }

    let sections = source
        .iter()
        .map(|section| match resource_section {
            Some(replacement) if section.name_starts_with(PE_RESOURCE_SECTION_NAME) => replacement,
            _ => *section,
        })
        .collect();

    SectionMerge {
        sections,
        resource_section_matched: resource_section.is_some(),
    }
}
