use alloc::string::ToString;
use core::any::type_name;

use zerocopy::FromBytes;

use crate::ReadError;

pub fn read<T: FromBytes + Copy>(resource: &[u8]) -> Result<T, ReadError> {
    T::read_from_prefix(resource)
        .map_err(|_| ReadError(type_name::<T>().to_string()))
        .map(|(value, _)| value)
}

#[cfg(feature = "std")]
/// Write bytes to a file at an explicit offset.
/// A short write surfaces as an error; the file position after the call is unspecified.
pub fn write_at(file: &mut std::fs::File, offset: u64, data: &[u8]) -> std::io::Result<()> {
    use std::io::{Seek, SeekFrom, Write};
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)
}
