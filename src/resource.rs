//! Locating the resource directory and probing its top-level entries.
//!
//! Only the root level of the resource tree is inspected here.
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section> for more information.

use log::{debug, info};

use crate::{constants::*, image::*, types::*, util::*};

/// Returns the resource entry of the data directory array.
/// Returns a zero entry when the image declares no resource table.
pub fn resource_table_entry(image: &Image) -> ImageDataDirectory {
    image.data_directory(DataDirectoryType::ResourceTable).copied().unwrap_or_default()
}

/// Best-effort check whether the image carries an icon resource at the root of its resource directory.
///
/// The file offset of the resource directory root is computed as
/// `virtual_address - image_base + nt_headers_offset`. This is a shallow heuristic that
/// ignores the section-relative mapping between virtual addresses and file offsets and is
/// only correct when the resource section's virtual and file layouts are trivially aligned.
/// It is intended for informational reporting only; any out-of-bounds access reports absence.
pub fn probe_icon_presence(image: &Image) -> bool {
    let entry = resource_table_entry(image);
    if entry.virtual_address == 0 || entry.size == 0 {
        info!("no resource directory found");
        return false;
    }

    let data = image.data();
    let offset = entry.virtual_address as i64 - image.windows_header().image_base() as i64
        + image.nt_headers_offset() as i64;
    if offset < 0 || offset as u64 + 16 > data.len() as u64 {
        debug!("resource directory offset {:#x?} outside image", offset);
        return false;
    }
    let table_offset = offset as usize;
    let table = match read::<ResourceDirectoryTable>(&data[table_offset..]) {
        Ok(table) => table,
        Err(_) => return false,
    };
    debug!("{:#x?}: {:#x?}", table_offset, table);

    let entry_count =
        table.number_of_name_entries as usize + table.number_of_id_entries as usize;
    for index in 0..entry_count {
        let entry_offset = table_offset + 16 + index * 8;
        let entry = match data.get(entry_offset..).map(read::<ResourceDirectoryEntry>) {
            Some(Ok(entry)) => entry,
            _ => break,
        };
        debug!("{:#x?}: {:#x?}", entry_offset, entry);
        if !entry.is_named() && entry.name_offset_or_integer_id == RT_ICON as u32 {
            info!("icon resource detected");
            return true;
        }
    }
    false
}
