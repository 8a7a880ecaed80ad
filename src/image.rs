//! Portable executable header parsing.
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format> for more information.

use alloc::{borrow::Cow, format, string::ToString, vec::Vec};

use ahash::RandomState;
use indexmap::IndexMap;
use log::debug;

use crate::{constants::*, errors::*, types::*, util::*};

/// Image data directory type enumeration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DataDirectoryType {
    ExportTable,
    ImportTable,
    ResourceTable,
    ExceptionTable,
    CertificateTable,
    BaseRelocationTable,
    Debug,
    Architecture,
    GlobalPtr,
    TLSTable,
    LoadConfigTable,
    BoundImport,
    IAT,
    DelayImportDescriptor,
    CLRRuntimeHeader,
    Reserved,
}

/// Parsed header chain of a portable executable image.
///
/// This struct is the entry point for parsing and querying the header of a portable executable.
/// Parsing decodes the DOS header, the NT headers and the data directory array.
/// The section table is read on demand through [`Image::section_table`].
#[derive(Debug, Clone)]
pub struct Image<'a> {
    pub(crate) image: Cow<'a, [u8]>,

    pub(crate) pe_dos_magic:          u16,
    pub(crate) pe_signature:          u32,
    pub(crate) coff_header:           CoffHeader,
    pub(crate) standard_header:       StandardHeader,
    pub(crate) windows_header:        GenericWindowsHeader,
    pub(crate) header_data_directory: IndexMap<DataDirectoryType, ImageDataDirectory, RandomState>,

    nt_headers_offset:         u64,
    nt_headers_size:           u64,
    optional_header_dd_offset: u64,
    section_table_offset:      u64,
}

impl PartialEq for Image<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.pe_dos_magic == other.pe_dos_magic
            && self.pe_signature == other.pe_signature
            && self.coff_header == other.coff_header
            && self.standard_header == other.standard_header
            && self.windows_header == other.windows_header
            && self.header_data_directory == other.header_data_directory
    }
}
impl Eq for Image<'_> {}

impl<'a> Image<'a> {
    /// Parse the headers of a portable executable image from a byte slice.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the byte slice is not a valid portable executable image or is missing required headers.
    pub fn parse<R: Into<Cow<'a, [u8]>>>(image: R) -> Result<Self, ImageReadError> {
        let image = image.into();

        let pe_dos_magic = read::<u16>(&image[0..])?;
        debug!("pe_dos_magic: {:#x?}", pe_dos_magic);
        if pe_dos_magic != PE_DOS_MAGIC {
            return Err(ImageReadError::InvalidHeader("no dos magic".into()));
        }

        if (image.len() as u64) < PE_DOS_HEADER_SIZE as u64 {
            return Err(ImageReadError::InvalidHeader("image truncated before dos header end".into()));
        }
        let pe_signature_offset = read::<u32>(&image[PE_PTR_OFFSET as usize..])?;
        debug!("pe_signature_offset: {:#x?}", pe_signature_offset);
        if (image.len() as u64) < pe_signature_offset as u64 + 4 {
            return Err(ImageReadError::InvalidHeader("image truncated before pe signature".into()));
        }

        let pe_signature = read::<u32>(&image[pe_signature_offset as usize..])?;
        debug!("pe_signature: {:#x?}", pe_signature);
        if pe_signature != PE_NT_SIGNATURE {
            return Err(ImageReadError::InvalidHeader("no pe signature".into()));
        }

        let coff_header_offset = (pe_signature_offset + 4) as u64;
        let coff_header = read::<CoffHeader>(&image[coff_header_offset as usize..])?;
        debug!("{:#x?}: {:#x?}", coff_header_offset, coff_header);
        if coff_header.size_of_optional_header < 24 {
            return Err(ImageReadError::InvalidHeader("optional header too small".into()));
        }

        let standard_header_offset = coff_header_offset + 20;
        let standard_header = read::<StandardHeader>(&image[standard_header_offset as usize..])?;
        debug!("{:#x?}: {:#x?}", standard_header_offset, standard_header);

        let nt_headers_offset = pe_signature_offset as u64;
        let nt_headers_size = 24 + coff_header.size_of_optional_header as u64;
        let section_table_offset = nt_headers_offset + nt_headers_size;
        if (image.len() as u64) < section_table_offset {
            return Err(ImageReadError::InvalidHeader(
                "image truncated inside optional header".into(),
            ));
        }

        let (
            windows_header_offset,
            windows_header,
            number_of_rva_and_sizes,
            optional_header_dd_offset,
        ) = {
            if standard_header.magic == PE_32_MAGIC && coff_header.size_of_optional_header >= 96 {
                let windows_header_offset = standard_header_offset + 28;
                let windows_header =
                    read::<WindowsHeader<u32>>(&image[windows_header_offset as usize..])?;
                (
                    windows_header_offset,
                    GenericWindowsHeader::WindowsHeader32(windows_header),
                    windows_header.number_of_rva_and_sizes,
                    standard_header_offset + 96,
                )
            } else if standard_header.magic == PE_64_MAGIC
                && coff_header.size_of_optional_header >= 112
            {
                let windows_header_offset = standard_header_offset + 24;
                let windows_header =
                    read::<WindowsHeader<u64>>(&image[windows_header_offset as usize..])?;
                (
                    windows_header_offset,
                    GenericWindowsHeader::WindowsHeader64(windows_header),
                    windows_header.number_of_rva_and_sizes,
                    standard_header_offset + 112,
                )
            } else {
                return Err(ImageReadError::InvalidHeader("invalid optional header".into()));
            }
        };
        debug!("{:#x?}: {:#x?}", windows_header_offset, windows_header);

        if number_of_rva_and_sizes as u64 * 8 > section_table_offset - optional_header_dd_offset {
            return Err(ImageReadError::InvalidHeader(
                "data directory count exceeds optional header".into(),
            ));
        }

        debug!("optional_header_dd_offset: {:#x?}", optional_header_dd_offset);
        let mut header_data_directory =
            IndexMap::<DataDirectoryType, ImageDataDirectory, _>::with_hasher(RandomState::new());
        use DataDirectoryType::*;
        for (index, &header) in [
            ExportTable,
            ImportTable,
            ResourceTable,
            ExceptionTable,
            CertificateTable,
            BaseRelocationTable,
            Debug,
            Architecture,
            GlobalPtr,
            TLSTable,
            LoadConfigTable,
            BoundImport,
            IAT,
            DelayImportDescriptor,
            CLRRuntimeHeader,
            Reserved,
        ]
        .iter()
        .enumerate()
        {
            if (index as u32) < number_of_rva_and_sizes {
                let offset = optional_header_dd_offset + (index * 8) as u64;
                let data = read::<ImageDataDirectory>(&image[offset as usize..])?;
                header_data_directory.insert(header, data);
                debug!("{:#x?}: {:?}: {:#x?}", offset, header, data);
            }
        }

        Ok(Self {
            image,
            pe_dos_magic,
            pe_signature,
            coff_header,
            standard_header,
            windows_header,
            header_data_directory,
            nt_headers_offset,
            nt_headers_size,
            optional_header_dd_offset,
            section_table_offset,
        })
    }

    #[cfg(feature = "std")]
    /// Parse the headers of a portable executable image from a file.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the file could not be read, is not a valid portable executable image or is missing required headers.
    pub fn parse_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ImageReadError> {
        let data = std::fs::read(path)?;
        Self::parse(data)
    }

    /// Read the section table from the image.
    /// The table directly follows the NT headers; its length is taken from the coff header.
    ///
    /// # Returns
    /// Returns an error if the declared section count extends past the end of the image
    /// or the table buffer could not be allocated.
    pub fn section_table(&self) -> Result<Vec<SectionHeader>, ImageReadError> {
        let count = self.coff_header.number_of_sections as usize;
        let table_end = self.section_table_offset + (count * 40) as u64;
        if (self.image.len() as u64) < table_end {
            return Err(ImageReadError::InvalidSection(format!(
                "section table extends past end of image ({:#x?} > {:#x?})",
                table_end,
                self.image.len()
            )));
        }
        let mut section_table = Vec::new();
        section_table.try_reserve_exact(count)?;
        for index in 0..count {
            let section_table_offset = self.section_table_offset + (index * 40) as u64;
            let section_header = read::<SectionHeader>(&self.image[section_table_offset as usize..])?;
            debug!(
                "{:#x?}: {}: {:#x?}",
                section_table_offset,
                section_header.name().unwrap_or("?".to_string()),
                section_header
            );
            section_table.push(section_header);
        }
        Ok(section_table)
    }

    /// Returns the raw image data.
    pub fn data(&self) -> &[u8] { &self.image }

    /// Returns the parsed coff header.
    pub fn coff_header(&self) -> &CoffHeader { &self.coff_header }

    /// Returns the parsed standard header.
    pub fn standard_header(&self) -> &StandardHeader { &self.standard_header }

    /// Returns the parsed windows header.
    pub fn windows_header(&self) -> &GenericWindowsHeader { &self.windows_header }

    /// Returns the data directory for the requested header.
    pub fn data_directory(&self, directory: DataDirectoryType) -> Option<&ImageDataDirectory> {
        self.header_data_directory.get(&directory)
    }

    /// Returns all data directories existing in the image.
    pub fn data_directories(&self) -> Vec<DataDirectoryType> {
        self.header_data_directory.keys().copied().collect::<Vec<_>>()
    }

    /// Returns the file offset of the NT headers.
    pub fn nt_headers_offset(&self) -> u64 { self.nt_headers_offset }

    /// Returns the size of the NT headers in bytes, including the data directory array.
    pub fn nt_headers_size(&self) -> u64 { self.nt_headers_size }

    /// Returns the file offset of the section table.
    pub fn section_table_offset(&self) -> u64 { self.section_table_offset }

    /// Returns the file offset of the resource entry in the data directory array.
    /// The offset is derived from the optional header layout and is valid even when
    /// the image declares fewer data directories.
    pub fn resource_entry_offset(&self) -> u64 {
        self.optional_header_dd_offset + (PE_RESOURCE_DIRECTORY_INDEX * 8) as u64
    }
}
