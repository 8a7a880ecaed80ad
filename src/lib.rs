//! Header trans**p**lants between portable **e**xecutables.
//!
//! Supports:
//! * Parsing and introspection of portable executable headers
//! * In-place header transplants that preserve the target's resource directory
//! * Optional section table replacement that keeps the target's `.rsrc` section
//! * Shallow icon resource detection
//!
//! See [`Image`] for header parsing and [`transplant_header`] for the transplant engine.
//!
//! # Examples
//!
//! ### Header transplant
//! ```
//! use pegraft::transplant_header;
//!
//! // copy the header of source.exe onto target.exe, keeping target.exe's icons
//! let report = transplant_header(SOURCE_PATH, TARGET_PATH, false)?;
//! println!("icon present: {}", report.icon_present);
//! ```
//!
//! ### Header and section table transplant
//! ```
//! use pegraft::transplant_header;
//!
//! // additionally replace the section table, keeping the target's .rsrc entry
//! let report = transplant_header(SOURCE_PATH, TARGET_PATH, true)?;
//! if report.resource_section_matched == Some(false) {
//!     println!("target had no .rsrc section");
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]

extern crate alloc;

pub(crate) mod errors;
pub(crate) mod image;
pub(crate) mod resource;
pub(crate) mod section;
#[cfg(feature = "std")]
pub(crate) mod transplant;
pub(crate) mod util;

pub mod constants;
pub mod types;

pub use crate::{errors::*, image::*, resource::*, section::*};
#[cfg(feature = "std")]
pub use crate::transplant::*;
